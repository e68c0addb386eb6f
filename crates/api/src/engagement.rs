use std::sync::Arc;

use studio_core::engagement::{EngagementBoard, ItemEngagement};
use studio_core::source::{KeyValueStore, SourceError};
use tokio::sync::Mutex;

/// Result of a vote or comment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementChange {
    /// False when the request was a no-op (repeat vote, blank comment).
    pub changed: bool,
    pub engagement: ItemEngagement,
}

/// Serves one [`EngagementBoard`] per client id from a shared store.
///
/// Boards are read from the store on every request and nothing is held in
/// memory between requests. Each client's keys are namespaced by its id, so
/// "already voted" is tracked per client.
pub struct EngagementRegistry {
    store: Arc<dyn KeyValueStore>,
    /// Serializes load-modify-save cycles.
    writes: Mutex<()>,
}

impl EngagementRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    /// Votes and comments for `item_id` as seen by `client`.
    pub async fn snapshot(&self, client: &str, item_id: &str) -> Result<ItemEngagement, SourceError> {
        let board = EngagementBoard::load(self.store.as_ref(), client)?;
        Ok(board.snapshot(item_id))
    }

    /// Count `client`'s vote for `item_id`. A repeat vote changes nothing.
    pub async fn vote(&self, client: &str, item_id: &str) -> Result<EngagementChange, SourceError> {
        self.mutate(client, item_id, |board| board.increment_vote(item_id))
            .await
    }

    /// Append a comment for `item_id`. Blank text changes nothing.
    pub async fn comment(
        &self,
        client: &str,
        item_id: &str,
        text: &str,
    ) -> Result<EngagementChange, SourceError> {
        self.mutate(client, item_id, |board| board.append_comment(item_id, text))
            .await
    }

    /// Load the board, apply `change` and save it if anything changed.
    async fn mutate<F>(&self, client: &str, item_id: &str, change: F) -> Result<EngagementChange, SourceError>
    where
        F: FnOnce(&mut EngagementBoard) -> bool,
    {
        let _guard = self.writes.lock().await;
        let mut board = EngagementBoard::load(self.store.as_ref(), client)?;

        let changed = change(&mut board);
        if changed {
            board.save(self.store.as_ref(), client)?;
            tracing::debug!(client, item_id, "Engagement saved");
        }

        Ok(EngagementChange {
            changed,
            engagement: board.snapshot(item_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use studio_core::source::MemoryKeyValueStore;

    use super::*;

    /// Refuses every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _: &str) -> Result<Option<String>, SourceError> {
            Ok(None)
        }
        fn set(&self, _: &str, _: &str) -> Result<(), SourceError> {
            Err(SourceError::Unavailable("read-only".into()))
        }
    }

    #[tokio::test]
    async fn votes_are_idempotent_per_client() {
        let registry = EngagementRegistry::new(Arc::new(MemoryKeyValueStore::new()));

        assert!(registry.vote("alice", "cat-1").await.unwrap().changed);
        let repeat = registry.vote("alice", "cat-1").await.unwrap();
        assert!(!repeat.changed);
        assert_eq!(repeat.engagement.votes, 1);

        let bob = registry.vote("bob", "cat-1").await.unwrap();
        assert!(bob.changed);
        assert_eq!(bob.engagement.votes, 1);
        assert!(bob.engagement.has_voted);
    }

    #[tokio::test]
    async fn saved_votes_survive_a_new_registry() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        EngagementRegistry::new(store.clone())
            .comment("alice", "cat-2", "  Lovely courtyard ")
            .await
            .unwrap();

        let reloaded = EngagementRegistry::new(store)
            .snapshot("alice", "cat-2")
            .await
            .unwrap();
        assert_eq!(reloaded.comments, vec!["Lovely courtyard".to_string()]);
    }

    #[tokio::test]
    async fn registries_sharing_a_store_see_each_others_votes() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let first = EngagementRegistry::new(store.clone());
        let second = EngagementRegistry::new(store);

        assert_eq!(first.snapshot("alice", "cat-1").await.unwrap().votes, 0);
        second.vote("alice", "cat-1").await.unwrap();

        let seen = first.snapshot("alice", "cat-1").await.unwrap();
        assert_eq!(seen.votes, 1);
        assert!(seen.has_voted);
        assert!(!first.vote("alice", "cat-1").await.unwrap().changed);
    }

    #[tokio::test]
    async fn failed_save_leaves_board_unchanged() {
        let registry = EngagementRegistry::new(Arc::new(ReadOnlyStore));

        assert!(registry.vote("alice", "cat-1").await.is_err());
        let snapshot = registry.snapshot("alice", "cat-1").await.unwrap();
        assert_eq!(snapshot.votes, 0);
        assert!(!snapshot.has_voted);
    }
}
