//! Common types used throughout streamlog

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session parameters derived once from the initial stream page.
///
/// All five fields are extracted together; a page that yields only some of
/// them is a bootstrap failure, never a partially usable session. The
/// continuation token is the only value that changes afterwards, and it is
/// threaded by value through the recording loop rather than mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Video id of the live stream
    pub live_id: String,
    /// Whether the page describes a finished stream (replay/VOD)
    pub is_replay: bool,
    /// Public innertube API key embedded in the page
    pub api_key: String,
    /// Web client version the page was served for
    pub client_version: String,
    /// Initial continuation token for the first poll
    pub continuation: String,
}

/// A single normalized chat message.
///
/// `timestamp_micros` is source-assigned and only advisory for ordering:
/// ties are possible and monotonicity is not guaranteed across restarts.
/// `id` is the dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    pub id: String,
    pub timestamp_micros: u64,
    pub author_channel_id: String,
    pub author_name: String,
    /// Badge renderers, kept opaque
    pub author_badges: Value,
    pub author_photo_url: String,
    pub message_text: String,
}
