//! Chat polling
//!
//! One fetch cycle against the live-chat endpoint: send the current
//! continuation, normalize whatever actions came back, extract the next
//! continuation. The poller holds the fixed session credentials only; the
//! continuation token is passed in and handed back by value each cycle, so
//! exactly one caller owns it and at most one fetch is ever in flight.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StreamlogResult;
use crate::normalize::{normalize_action, Normalized, SkipReason};
use crate::transport::ChatTransport;
use crate::types::{ChatEvent, SessionParams};

/// Result of one poll cycle.
#[derive(Debug, Clone)]
pub struct PollResult {
    /// Normalized events in response order (oldest first within a batch)
    pub events: Vec<ChatEvent>,
    /// Token for the next cycle; empty means the session terminated
    pub next_continuation: String,
}

/// Performs one fetch cycle per call. No retry lives here; every failure
/// propagates to the recording loop.
pub struct ChatPoller {
    transport: Arc<dyn ChatTransport>,
    api_key: String,
    client_version: String,
}

impl ChatPoller {
    /// Create a poller bound to one session's credentials
    pub fn new(transport: Arc<dyn ChatTransport>, params: &SessionParams) -> Self {
        Self {
            transport,
            api_key: params.api_key.clone(),
            client_version: params.client_version.clone(),
        }
    }

    /// Issue one poll with the given continuation token.
    ///
    /// A response without the `liveChatContinuation` subtree is a valid
    /// zero-event cycle, not an error. The caller must replace its token
    /// with `next_continuation` unconditionally, empty included, so that
    /// session termination propagates.
    pub async fn poll(&self, continuation: &str) -> StreamlogResult<PollResult> {
        let body = json!({
            "context": {
                "client": {
                    "clientVersion": self.client_version,
                    "clientName": "WEB",
                },
            },
            "continuation": continuation,
        });

        let response = self.transport.poll_chat(&self.api_key, &body).await?;

        let live_chat = response.pointer("/continuationContents/liveChatContinuation");

        let mut events = Vec::new();
        if let Some(actions) = live_chat
            .and_then(|subtree| subtree.get("actions"))
            .and_then(Value::as_array)
        {
            for action in actions {
                match normalize_action(action.clone()) {
                    Normalized::Event(event) => events.push(event),
                    Normalized::Skipped(SkipReason::Unimplemented { kind }) => {
                        debug!("Not implemented: {}", kind);
                    }
                    Normalized::Skipped(SkipReason::Unknown) => {}
                    Normalized::Skipped(SkipReason::Malformed { detail }) => {
                        warn!("Dropping malformed chat event: {}", detail);
                    }
                }
            }
        }

        let next_continuation = next_continuation(live_chat);

        debug!(
            "Poll cycle yielded {} events, continuation {}",
            events.len(),
            if next_continuation.is_empty() {
                "exhausted"
            } else {
                "present"
            }
        );

        Ok(PollResult {
            events,
            next_continuation,
        })
    }
}

/// Extract the next token from `continuations[0]`, preferring invalidation
/// data over timed data. Neither present means the session ended.
fn next_continuation(live_chat: Option<&Value>) -> String {
    live_chat
        .and_then(|subtree| subtree.pointer("/continuations/0"))
        .and_then(|data| {
            data.pointer("/invalidationContinuationData/continuation")
                .or_else(|| data.pointer("/timedContinuationData/continuation"))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
