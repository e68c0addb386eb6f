//! Per-client votes and comments on catalog items.
//!
//! This side state never feeds into catalog filtering or sorting. It is
//! persisted through a [`KeyValueStore`] under two fixed keys.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::source::{KeyValueStore, SourceError};
use crate::types::RecordId;

/// Storage key holding vote counts and the set of items already voted for.
pub const VOTES_KEY: &str = "catalog_votes";

/// Storage key holding comment lists.
pub const COMMENTS_KEY: &str = "catalog_comments";

/// Longest comment accepted, in characters.
pub const MAX_COMMENT_LENGTH: usize = 2_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct VoteLedger {
    counts: BTreeMap<RecordId, u64>,
    voted: BTreeSet<RecordId>,
}

/// Engagement snapshot for one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEngagement {
    pub item_id: RecordId,
    pub votes: u64,
    pub has_voted: bool,
    pub comments: Vec<String>,
}

/// Votes and comments held by one client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementBoard {
    votes: VoteLedger,
    comments: BTreeMap<RecordId, Vec<String>>,
}

impl EngagementBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload from storage. Missing or unreadable entries start empty.
    pub fn load(store: &dyn KeyValueStore, prefix: &str) -> Result<Self, SourceError> {
        let votes = read_json(store, &storage_key(prefix, VOTES_KEY))?;
        let comments = read_json(store, &storage_key(prefix, COMMENTS_KEY))?;
        Ok(Self { votes, comments })
    }

    /// Write both keys back to storage.
    pub fn save(&self, store: &dyn KeyValueStore, prefix: &str) -> Result<(), SourceError> {
        let votes = serde_json::to_string(&self.votes)
            .map_err(|e| SourceError::Corrupt(e.to_string()))?;
        let comments = serde_json::to_string(&self.comments)
            .map_err(|e| SourceError::Corrupt(e.to_string()))?;
        store.set(&storage_key(prefix, VOTES_KEY), &votes)?;
        store.set(&storage_key(prefix, COMMENTS_KEY), &comments)
    }

    /// Count one vote for `id`. Returns `false` if this client already voted.
    pub fn increment_vote(&mut self, id: &str) -> bool {
        if !self.votes.voted.insert(id.to_string()) {
            return false;
        }
        *self.votes.counts.entry(id.to_string()).or_default() += 1;
        true
    }

    /// Append a trimmed comment. Returns `false` for blank text.
    pub fn append_comment(&mut self, id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.comments
            .entry(id.to_string())
            .or_default()
            .push(text.to_string());
        true
    }

    pub fn votes(&self, id: &str) -> u64 {
        self.votes.counts.get(id).copied().unwrap_or(0)
    }

    pub fn has_voted(&self, id: &str) -> bool {
        self.votes.voted.contains(id)
    }

    pub fn comments(&self, id: &str) -> &[String] {
        self.comments.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn snapshot(&self, id: &str) -> ItemEngagement {
        ItemEngagement {
            item_id: id.to_string(),
            votes: self.votes(id),
            has_voted: self.has_voted(id),
            comments: self.comments(id).to_vec(),
        }
    }
}

fn storage_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}:{key}")
    }
}

fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, SourceError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unreadable engagement data");
            Ok(T::default())
        }
    }
}
