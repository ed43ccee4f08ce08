//! Feedback history persistence.
//!
//! The store owns the in-memory [`FeedbackHistory`] and mirrors every
//! mutation into a durable key-value store. Persistence is strictly
//! best-effort: a failed read yields an empty history, a failed write is
//! logged and never rolls back memory or reaches the user.

mod durable;

pub use durable::{DurableStore, SqliteDurableStore};

use crate::model::{FeedbackHistory, FeedbackKind, Song};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Storage key for the serialized feedback history.
pub const FEEDBACK_STORE_KEY: &str = "meloMoodFeedback";

pub struct FeedbackStore {
    store: Arc<dyn DurableStore>,
    history: FeedbackHistory,
}

impl FeedbackStore {
    /// Load the persisted history, defaulting to empty on absence or any
    /// read/parse failure. Never fails the caller.
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let history = match store.get(FEEDBACK_STORE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(history) => history,
                Err(e) => {
                    warn!(error = %e, "Malformed persisted feedback history, starting empty");
                    FeedbackHistory::default()
                }
            },
            Ok(None) => FeedbackHistory::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted feedback history, starting empty");
                FeedbackHistory::default()
            }
        };
        Self { store, history }
    }

    pub fn history(&self) -> &FeedbackHistory {
        &self.history
    }

    /// Apply a like/dislike action and persist the result asynchronously.
    pub fn record(&mut self, song: Song, kind: FeedbackKind) {
        self.history.record(song, kind);
        self.persist_async();
    }

    /// Drop all feedback and persist the empty history asynchronously.
    pub fn clear(&mut self) {
        self.history.clear();
        self.persist_async();
    }

    /// Persist synchronously. Used at shutdown and in tests; unlike the
    /// async path the error is returned to the caller.
    pub fn flush(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.history)?;
        self.store.set(FEEDBACK_STORE_KEY, &raw)
    }

    fn persist_async(&self) {
        let raw = match serde_json::to_string(&self.history) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize feedback history");
                return;
            }
        };
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = store.set(FEEDBACK_STORE_KEY, &raw) {
                warn!(error = %e, "Failed to persist feedback history");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<SqliteDurableStore> {
        Arc::new(SqliteDurableStore::in_memory().unwrap())
    }

    #[test]
    fn test_load_absent_yields_empty_history() {
        let feedback = FeedbackStore::load(store());
        assert!(feedback.history().is_empty());
    }

    #[test]
    fn test_load_malformed_yields_empty_history() {
        let store = store();
        store.set(FEEDBACK_STORE_KEY, "{not json").unwrap();
        let feedback = FeedbackStore::load(store);
        assert!(feedback.history().is_empty());
    }

    #[tokio::test]
    async fn test_flush_then_load_round_trip() {
        let store = store();
        let mut feedback = FeedbackStore::load(store.clone() as Arc<dyn DurableStore>);
        feedback.record(Song::new("Take Five", "Dave Brubeck", ""), FeedbackKind::Like);
        feedback.record(Song::new("Yakety Sax", "Boots Randolph", ""), FeedbackKind::Dislike);
        feedback.flush().unwrap();

        let reloaded = FeedbackStore::load(store);
        assert_eq!(reloaded.history().liked.len(), 1);
        assert_eq!(reloaded.history().disliked.len(), 1);
        assert_eq!(reloaded.history().liked[0].title, "Take Five");
    }

    #[tokio::test]
    async fn test_clear_persists_empty_history() {
        let store = store();
        let mut feedback = FeedbackStore::load(store.clone() as Arc<dyn DurableStore>);
        feedback.record(Song::new("a", "b", ""), FeedbackKind::Like);
        feedback.clear();
        feedback.flush().unwrap();

        let reloaded = FeedbackStore::load(store);
        assert!(reloaded.history().is_empty());
    }
}
