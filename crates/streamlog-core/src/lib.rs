//! Streamlog core library
//!
//! Records live-stream chat to a resumable on-disk log: bootstrap session
//! parameters from the stream page, poll the live-chat endpoint with a
//! continuation token, normalize raw actions into stable events, and
//! reconcile fresh batches against previously persisted history.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod history;
pub mod normalize;
pub mod poller;
pub mod reconcile;
pub mod recorder;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use bootstrap::{bootstrap_session, parse_live_page};
pub use config::RecorderConfig;
pub use error::{StreamlogError, StreamlogResult};
pub use history::{FileHistoryStorage, HistoryLog, HistoryStorage, MemoryHistoryStorage};
pub use normalize::{normalize_action, strip_tracking, Normalized, RawAction, SkipReason};
pub use poller::{ChatPoller, PollResult};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use recorder::{Recorder, ResumeReport, RunOutcome};
pub use transport::{ChatTransport, HttpTransport, LIVE_CHAT_ENDPOINT};
pub use types::{ChatEvent, SessionParams};
