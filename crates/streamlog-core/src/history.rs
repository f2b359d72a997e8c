//! History log and persistence
//!
//! The log is an oldest-first sequence of chat events, rewritten to disk as
//! a whole snapshot after every poll cycle so a crash loses at most one
//! cycle. On disk each event sits one level under its kind tag, keeping the
//! file self-describing and leaving room for further kinds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StreamlogError, StreamlogResult};
use crate::types::ChatEvent;

/// On-disk representation: the event body under a per-event kind tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoredEvent {
    #[serde(rename = "liveChatTextMessage")]
    LiveChatTextMessage(ChatEvent),
}

impl From<ChatEvent> for StoredEvent {
    fn from(event: ChatEvent) -> Self {
        Self::LiveChatTextMessage(event)
    }
}

impl StoredEvent {
    fn into_event(self) -> ChatEvent {
        match self {
            Self::LiveChatTextMessage(event) => event,
        }
    }
}

/// Ordered, append-only event log for one recording session.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    events: Vec<ChatEvent>,
}

impl HistoryLog {
    /// Create an empty log for a fresh recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-ordered event sequence
    pub fn from_events(events: Vec<ChatEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the most recent entry, the reconciliation cutoff
    pub fn last_timestamp_micros(&self) -> Option<u64> {
        self.events.iter().map(|e| e.timestamp_micros).max()
    }

    /// Append already-reconciled events
    pub fn extend(&mut self, events: Vec<ChatEvent>) {
        self.events.extend(events);
    }
}

/// Whole-snapshot load/save contract for a history log.
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Load the persisted log, or `None` if no snapshot exists yet
    async fn load(&self) -> StreamlogResult<Option<HistoryLog>>;

    /// Persist the full log, replacing any previous snapshot
    async fn save(&self, log: &HistoryLog) -> StreamlogResult<()>;
}

/// File-backed history storage: one JSON file per recording.
pub struct FileHistoryStorage {
    path: PathBuf,
}

impl FileHistoryStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStorage for FileHistoryStorage {
    async fn load(&self) -> StreamlogResult<Option<HistoryLog>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StreamlogError::Io(format!("Failed to read history file: {e}")))?;

        let stored: Vec<StoredEvent> = serde_json::from_str(&json)
            .map_err(|e| StreamlogError::Json(format!("Failed to parse history file: {e}")))?;

        let events = stored.into_iter().map(StoredEvent::into_event).collect();

        debug!("Loaded history snapshot from {:?}", self.path);
        Ok(Some(HistoryLog::from_events(events)))
    }

    async fn save(&self, log: &HistoryLog) -> StreamlogResult<()> {
        let stored: Vec<StoredEvent> = log.events().iter().cloned().map(Into::into).collect();

        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| StreamlogError::Json(format!("Failed to serialize history: {e}")))?;

        fs::write(&self.path, json)
            .await
            .map_err(|e| StreamlogError::Io(format!("Failed to write history file: {e}")))?;

        debug!("Saved {} events to {:?}", log.len(), self.path);
        Ok(())
    }
}

/// In-memory history storage (for testing)
#[derive(Debug, Default)]
pub struct MemoryHistoryStorage {
    snapshot: RwLock<Option<Vec<ChatEvent>>>,
}

impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot, as if a previous run had persisted it
    pub async fn seed(&self, events: Vec<ChatEvent>) {
        *self.snapshot.write().await = Some(events);
    }
}

#[async_trait]
impl HistoryStorage for MemoryHistoryStorage {
    async fn load(&self) -> StreamlogResult<Option<HistoryLog>> {
        Ok(self
            .snapshot
            .read()
            .await
            .clone()
            .map(HistoryLog::from_events))
    }

    async fn save(&self, log: &HistoryLog) -> StreamlogResult<()> {
        *self.snapshot.write().await = Some(log.events().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(id: &str, timestamp_micros: u64) -> ChatEvent {
        ChatEvent {
            id: id.to_string(),
            timestamp_micros,
            author_channel_id: "UCx".into(),
            author_name: "a".into(),
            author_badges: Value::Array(vec![]),
            author_photo_url: "https://p/x.jpg".into(),
            message_text: "hi".into(),
        }
    }

    #[tokio::test]
    async fn file_storage_round_trips_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileHistoryStorage::new(dir.path().join("live.json"));

        let log = HistoryLog::from_events(vec![event("a", 100), event("b", 150)]);
        storage.save(&log).await.unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.events(), log.events());
    }

    #[tokio::test]
    async fn file_storage_load_without_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileHistoryStorage::new(dir.path().join("missing.json"));

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileHistoryStorage::new(dir.path().join("live.json"));

        storage
            .save(&HistoryLog::from_events(vec![event("a", 100)]))
            .await
            .unwrap();
        storage
            .save(&HistoryLog::from_events(vec![event("a", 100), event("b", 150)]))
            .await
            .unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let storage = FileHistoryStorage::new(path);
        assert!(matches!(
            storage.load().await,
            Err(StreamlogError::Json(_))
        ));
    }

    #[test]
    fn events_nest_under_their_kind_tag() {
        let stored = StoredEvent::from(event("a", 100));
        let value = serde_json::to_value(&stored).unwrap();

        assert_eq!(value["liveChatTextMessage"]["id"], json!("a"));
        assert_eq!(value["liveChatTextMessage"]["timestampMicros"], json!(100));
        assert_eq!(value["liveChatTextMessage"]["authorChannelId"], json!("UCx"));
        assert_eq!(value["liveChatTextMessage"]["messageText"], json!("hi"));
    }

    #[test]
    fn last_timestamp_is_the_maximum_not_the_tail() {
        let log = HistoryLog::from_events(vec![event("a", 100), event("b", 300), event("c", 200)]);
        assert_eq!(log.last_timestamp_micros(), Some(300));
    }
}
