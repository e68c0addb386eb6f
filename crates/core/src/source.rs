//! Collaborator contracts for data access.
//!
//! The lifecycle controller and the catalog view never reference a concrete
//! store; they are handed one of these traits. `Ok(None)` always means the
//! record does not exist, while `Err(SourceError::Unavailable)` means the
//! store could not be reached. Callers must keep the two apart. Only
//! `Unavailable` is transient; `Corrupt` and `Rejected` will not succeed on
//! retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::CatalogItem;
use crate::project::{NewProject, Project, ProjectPatch};

/// Failure talking to a collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The store could not be reached or the call failed in transit.
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// The store answered with data that could not be decoded.
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// The store was reached but refused the write, e.g. a constraint violation.
    #[error("Rejected by data source: {0}")]
    Rejected(String),
}

/// Access to project records.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Project>, SourceError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, SourceError>;

    /// Apply `patch` and return the stored record, or `None` if `id` is unknown.
    async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<Option<Project>, SourceError>;

    async fn create(&self, input: &NewProject) -> Result<Project, SourceError>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, SourceError>;
}

/// Access to the published catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, SourceError>;
}

/// Client-local durable string storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SourceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SourceError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

fn poisoned<T>(_: T) -> SourceError {
    SourceError::Unavailable("in-memory store lock poisoned".to_string())
}

/// Project records held in memory, in insertion order.
///
/// Backs demo mode and the fallback dataset. [`set_offline`](Self::set_offline)
/// makes every call fail as if the store were unreachable.
#[derive(Default)]
pub struct MemoryProjectSource {
    projects: Mutex<Vec<Project>>,
    offline: AtomicBool,
}

impl MemoryProjectSource {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), SourceError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SourceError::Unavailable("memory source is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProjectSource for MemoryProjectSource {
    async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
        self.check_online()?;
        Ok(self.projects.lock().map_err(poisoned)?.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, SourceError> {
        self.check_online()?;
        let projects = self.projects.lock().map_err(poisoned)?;
        Ok(projects.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<Option<Project>, SourceError> {
        self.check_online()?;
        let mut projects = self.projects.lock().map_err(poisoned)?;
        let Some(slot) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        *slot = slot.merged(patch);
        Ok(Some(slot.clone()))
    }

    async fn create(&self, input: &NewProject) -> Result<Project, SourceError> {
        self.check_online()?;
        let mut projects = self.projects.lock().map_err(poisoned)?;
        let mut n = projects.len() + 1;
        while projects.iter().any(|p| p.id == format!("proj-{n}")) {
            n += 1;
        }
        let project = Project::from_new(format!("proj-{n}"), input, chrono::Utc::now());
        projects.push(project.clone());
        Ok(project)
    }

    async fn delete(&self, id: &str) -> Result<bool, SourceError> {
        self.check_online()?;
        let mut projects = self.projects.lock().map_err(poisoned)?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() < before)
    }
}

/// A fixed catalog held in memory.
pub struct MemoryCatalogSource {
    items: Vec<CatalogItem>,
}

impl MemoryCatalogSource {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalogSource {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, SourceError> {
        Ok(self.items.clone())
    }
}

/// Key-value storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SourceError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SourceError> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
