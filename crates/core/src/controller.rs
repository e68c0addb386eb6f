//! Lifecycle controller: persistence with local fallback.
//!
//! Every mutation resolves to exactly one [`UpdateOutcome`]:
//!
//! - `Synced`: the store accepted it and its record is returned.
//! - `LocalOnly`: the store could not be reached or timed out, or demo mode
//!   is on; the local merge is returned and the id is remembered as unsynced.
//! - `NotFound`: the store says the record does not exist.
//! - `Rejected`: the store refused the change or answered with bad data.
//!   Nothing is kept locally and any earlier unsynced copy is discarded.
//!
//! Persistence calls for the same record id run one at a time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::lifecycle::{plan_action, LifecycleAction};
use crate::project::{NewProject, Project, ProjectPatch};
use crate::source::{ProjectSource, SourceError};
use crate::types::RecordId;

/// Default upper bound on a single persistence call.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether mutations are sent to the primary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    Live,
    /// Deliberately skip persistence; every mutation is applied locally.
    Demo,
}

/// Sync status reported alongside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    LocalOnly,
}

/// Result of loading a single project.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Project),
    /// The store was unreachable; this record comes from the fallback dataset.
    Fallback { project: Project, warning: String },
    /// The record has local changes the store has not accepted yet.
    LocalOnly { project: Project, warning: String },
    NotFound { id: RecordId },
    /// The store was unreachable and no fallback record exists.
    Unavailable { id: RecordId, reason: String },
}

/// Result of listing projects.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOutcome {
    pub projects: Vec<Project>,
    /// True when the list came from the fallback dataset.
    pub fallback: bool,
    pub warning: Option<String>,
}

/// Result of a mutation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Synced(Project),
    LocalOnly { project: Project, reason: String },
    NotFound { id: RecordId },
    Rejected { id: RecordId, reason: String },
}

impl UpdateOutcome {
    pub fn project(&self) -> Option<&Project> {
        match self {
            Self::Synced(project) | Self::LocalOnly { project, .. } => Some(project),
            Self::NotFound { .. } | Self::Rejected { .. } => None,
        }
    }

    pub fn sync_status(&self) -> Option<SyncStatus> {
        match self {
            Self::Synced(_) => Some(SyncStatus::Synced),
            Self::LocalOnly { .. } => Some(SyncStatus::LocalOnly),
            Self::NotFound { .. } | Self::Rejected { .. } => None,
        }
    }
}

/// Owns project lifecycle transitions against an injected store.
pub struct LifecycleController {
    primary: Arc<dyn ProjectSource>,
    fallback: Option<Arc<dyn ProjectSource>>,
    mode: PersistenceMode,
    persist_timeout: Duration,
    in_flight: Mutex<HashMap<RecordId, Arc<Mutex<()>>>>,
    /// Records changed locally but not yet accepted by the store.
    unsynced: Mutex<BTreeMap<RecordId, Project>>,
}

impl LifecycleController {
    pub fn new(primary: Arc<dyn ProjectSource>, mode: PersistenceMode) -> Self {
        Self {
            primary,
            fallback: None,
            mode,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            in_flight: Mutex::new(HashMap::new()),
            unsynced: Mutex::new(BTreeMap::new()),
        }
    }

    /// Records served when the primary store is unreachable.
    pub fn with_fallback(mut self, fallback: Arc<dyn ProjectSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode
    }

    /// Store used for reads: the sample dataset in demo mode when one is set.
    fn read_source(&self) -> &Arc<dyn ProjectSource> {
        match (self.mode, &self.fallback) {
            (PersistenceMode::Demo, Some(fallback)) => fallback,
            _ => &self.primary,
        }
    }

    /// Load one project.
    ///
    /// A not-found answer from the store is final; fallback data is only
    /// consulted when the store itself could not be reached. A record with
    /// unsynced local changes is returned in its local form.
    pub async fn load(&self, id: &str) -> LoadOutcome {
        let result = self.bounded(self.read_source().get_by_id(id)).await;
        let local = self.unsynced.lock().await.get(id).cloned();

        match (result, local) {
            (Ok(None), _) => LoadOutcome::NotFound { id: id.to_string() },
            (Ok(Some(_)), Some(project)) | (Err(_), Some(project)) => LoadOutcome::LocalOnly {
                project,
                warning: UNSYNCED_WARNING.to_string(),
            },
            (Ok(Some(project)), None) => LoadOutcome::Loaded(project),
            (Err(e), None) => {
                tracing::warn!(project_id = id, error = %e, "Project store unavailable, trying fallback");
                self.load_fallback(id, e.to_string()).await
            }
        }
    }

    async fn load_fallback(&self, id: &str, reason: String) -> LoadOutcome {
        let Some(fallback) = &self.fallback else {
            return LoadOutcome::Unavailable { id: id.to_string(), reason };
        };
        match fallback.get_by_id(id).await {
            Ok(Some(project)) => LoadOutcome::Fallback {
                project,
                warning: format!("Showing sample data, the project store is unavailable: {reason}"),
            },
            Ok(None) | Err(_) => LoadOutcome::Unavailable { id: id.to_string(), reason },
        }
    }

    /// List all projects, falling back to sample data when the store is down.
    ///
    /// Records with unsynced local changes are listed in their local form.
    pub async fn list(&self) -> Result<ListOutcome, CoreError> {
        let (mut projects, fallback, warning) = match self.bounded(self.read_source().get_all()).await {
            Ok(projects) => (projects, false, None),
            Err(e) => {
                tracing::warn!(error = %e, "Project store unavailable, listing fallback data");
                let Some(fallback) = &self.fallback else {
                    return Err(e.into());
                };
                let projects = fallback
                    .get_all()
                    .await
                    .map_err(CoreError::from)?;
                (projects, true, Some(format!("Showing sample data: {e}")))
            }
        };

        let local = self.unsynced.lock().await;
        for project in projects.iter_mut() {
            if let Some(copy) = local.get(&project.id) {
                *project = copy.clone();
            }
        }

        Ok(ListOutcome {
            projects,
            fallback,
            warning,
        })
    }

    /// Persist `patch` for `project`, or apply it locally if persistence fails.
    pub async fn apply_update(&self, project: &Project, patch: ProjectPatch) -> UpdateOutcome {
        if self.mode == PersistenceMode::Demo {
            return self
                .keep_local(project, &patch, "Demo mode, changes are not saved".to_string())
                .await;
        }

        let lock = self.record_lock(&project.id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.persist(project, patch).await
        };
        self.release_lock(&project.id, lock).await;
        outcome
    }

    /// Plan `action` and apply the resulting patch.
    ///
    /// The action is planned against the freshest copy available under the
    /// record lock (local unsynced copy, then the store, then the caller's
    /// copy), so two overlapping gate flags still advance the stage.
    /// Precondition failures are returned before anything is persisted.
    pub async fn perform(
        &self,
        project: &Project,
        action: LifecycleAction,
    ) -> Result<UpdateOutcome, CoreError> {
        if self.mode == PersistenceMode::Demo {
            let base = self.local_copy(&project.id).await.unwrap_or_else(|| project.clone());
            let patch = plan_action(&base, &action)?;
            return Ok(self
                .keep_local(&base, &patch, "Demo mode, changes are not saved".to_string())
                .await);
        }

        let lock = self.record_lock(&project.id).await;
        let result = {
            let _guard = lock.lock().await;
            self.perform_locked(project, &action).await
        };
        self.release_lock(&project.id, lock).await;
        result
    }

    async fn perform_locked(
        &self,
        project: &Project,
        action: &LifecycleAction,
    ) -> Result<UpdateOutcome, CoreError> {
        let base = match self.local_copy(&project.id).await {
            Some(local) => local,
            None => match self.bounded(self.primary.get_by_id(&project.id)).await {
                Ok(Some(current)) => current,
                Ok(None) => {
                    return Ok(UpdateOutcome::NotFound {
                        id: project.id.clone(),
                    })
                }
                Err(e) => {
                    tracing::debug!(project_id = %project.id, error = %e, "Planning against caller's copy");
                    project.clone()
                }
            },
        };

        let patch = plan_action(&base, action)?;
        tracing::debug!(project_id = %base.id, ?action, "Applying lifecycle action");
        Ok(self.persist(&base, patch).await)
    }

    /// Send `patch` to the primary store. Callers hold the record lock.
    ///
    /// A record that already has unsynced changes is replayed in full.
    async fn persist(&self, project: &Project, patch: ProjectPatch) -> UpdateOutcome {
        let outgoing = match self.local_copy(&project.id).await {
            Some(local) => ProjectPatch::from_project(&local.merged(&patch)),
            None => patch.clone(),
        };

        match self.bounded(self.primary.update(&project.id, &outgoing)).await {
            Ok(Some(stored)) => {
                self.unsynced.lock().await.remove(&project.id);
                tracing::debug!(project_id = %project.id, stage = stored.stage.as_str(), "Project update synced");
                UpdateOutcome::Synced(stored)
            }
            Ok(None) => {
                tracing::warn!(project_id = %project.id, "Project not found in store");
                self.unsynced.lock().await.remove(&project.id);
                UpdateOutcome::NotFound {
                    id: project.id.clone(),
                }
            }
            Err(e @ SourceError::Unavailable(_)) => {
                tracing::warn!(project_id = %project.id, error = %e, "Project update kept locally");
                self.keep_local(
                    project,
                    &patch,
                    format!("Saved on this device only, the project store is unavailable: {e}"),
                )
                .await
            }
            Err(e) => {
                let discarded = self.unsynced.lock().await.remove(&project.id).is_some();
                tracing::warn!(project_id = %project.id, error = %e, discarded, "Project update rejected by store");
                UpdateOutcome::Rejected {
                    id: project.id.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Create a project in the store used for reads.
    pub async fn create(&self, input: &NewProject) -> Result<Project, CoreError> {
        self.bounded(self.read_source().create(input))
            .await
            .map_err(CoreError::from)
    }

    /// Delete a project. Returns `false` if nothing was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, CoreError> {
        let deleted = self
            .bounded(self.read_source().delete(id))
            .await
            .map_err(CoreError::from)?;
        if deleted {
            self.unsynced.lock().await.remove(id);
        }
        Ok(deleted)
    }

    pub async fn is_unsynced(&self, id: &str) -> bool {
        self.unsynced.lock().await.contains_key(id)
    }

    pub async fn unsynced_ids(&self) -> Vec<RecordId> {
        self.unsynced.lock().await.keys().cloned().collect()
    }

    async fn local_copy(&self, id: &str) -> Option<Project> {
        self.unsynced.lock().await.get(id).cloned()
    }

    /// Merge onto the newest local copy and remember it as unsynced.
    async fn keep_local(&self, project: &Project, patch: &ProjectPatch, reason: String) -> UpdateOutcome {
        let mut unsynced = self.unsynced.lock().await;
        let base = unsynced.get(&project.id).unwrap_or(project);
        let merged = base.merged(patch);
        unsynced.insert(project.id.clone(), merged.clone());
        UpdateOutcome::LocalOnly {
            project: merged,
            reason,
        }
    }

    async fn record_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry for `id` once no other caller holds or awaits it.
    async fn release_lock(&self, id: &str, lock: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) <= 2 {
            in_flight.remove(id);
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, SourceError>
    where
        F: std::future::Future<Output = Result<T, SourceError>>,
    {
        match tokio::time::timeout(self.persist_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Unavailable(format!(
                "no response within {:?}",
                self.persist_timeout
            ))),
        }
    }
}

/// Warning attached to records that only exist in their local form.
pub const UNSYNCED_WARNING: &str = "This project has changes that are saved on this device only";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::lifecycle::{ProjectStage, StatusFlag};
    use crate::project::tests::sample_project;
    use crate::source::MemoryProjectSource;

    /// A store whose every call fails.
    struct RejectingSource;

    #[async_trait]
    impl ProjectSource for RejectingSource {
        async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
        async fn get_by_id(&self, _: &str) -> Result<Option<Project>, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
        async fn update(&self, _: &str, _: &ProjectPatch) -> Result<Option<Project>, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
        async fn create(&self, _: &NewProject) -> Result<Project, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<bool, SourceError> {
            Err(SourceError::Unavailable("connection refused".into()))
        }
    }

    /// A store that never answers.
    struct HangingSource;

    #[async_trait]
    impl ProjectSource for HangingSource {
        async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
            std::future::pending().await
        }
        async fn get_by_id(&self, _: &str) -> Result<Option<Project>, SourceError> {
            std::future::pending().await
        }
        async fn update(&self, _: &str, _: &ProjectPatch) -> Result<Option<Project>, SourceError> {
            std::future::pending().await
        }
        async fn create(&self, _: &NewProject) -> Result<Project, SourceError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str) -> Result<bool, SourceError> {
            std::future::pending().await
        }
    }

    /// Reads succeed; every write is refused with `error`.
    struct RefusingSource {
        inner: MemoryProjectSource,
        error: SourceError,
    }

    #[async_trait]
    impl ProjectSource for RefusingSource {
        async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
            self.inner.get_all().await
        }
        async fn get_by_id(&self, id: &str) -> Result<Option<Project>, SourceError> {
            self.inner.get_by_id(id).await
        }
        async fn update(&self, _: &str, _: &ProjectPatch) -> Result<Option<Project>, SourceError> {
            Err(self.error.clone())
        }
        async fn create(&self, _: &NewProject) -> Result<Project, SourceError> {
            Err(self.error.clone())
        }
        async fn delete(&self, id: &str) -> Result<bool, SourceError> {
            self.inner.delete(id).await
        }
    }

    /// Counts concurrent `update` calls and records the peak.
    struct CountingSource {
        inner: MemoryProjectSource,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ProjectSource for CountingSource {
        async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
            self.inner.get_all().await
        }
        async fn get_by_id(&self, id: &str) -> Result<Option<Project>, SourceError> {
            self.inner.get_by_id(id).await
        }
        async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<Option<Project>, SourceError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let result = self.inner.update(id, patch).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
        async fn create(&self, input: &NewProject) -> Result<Project, SourceError> {
            self.inner.create(input).await
        }
        async fn delete(&self, id: &str) -> Result<bool, SourceError> {
            self.inner.delete(id).await
        }
    }

    fn live(source: impl ProjectSource + 'static) -> LifecycleController {
        LifecycleController::new(Arc::new(source), PersistenceMode::Live)
    }

    #[tokio::test]
    async fn synced_update_returns_store_record() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(MemoryProjectSource::new(vec![project.clone()]));

        let outcome = controller
            .perform(&project, LifecycleAction::MarkFlag(StatusFlag::ConsultationCompleted))
            .await
            .unwrap();

        assert_matches!(&outcome, UpdateOutcome::Synced(p) if p.consultation_completed);
        assert!(!controller.is_unsynced(&project.id).await);
    }

    #[tokio::test]
    async fn rejecting_store_keeps_flag_locally() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(RejectingSource);

        let outcome = controller
            .perform(&project, LifecycleAction::MarkFlag(StatusFlag::ConsultationCompleted))
            .await
            .unwrap();

        assert_matches!(&outcome, UpdateOutcome::LocalOnly { project, .. } if project.consultation_completed);
        assert_eq!(outcome.sync_status(), Some(SyncStatus::LocalOnly));
        assert!(controller.is_unsynced(&project.id).await);
    }

    #[tokio::test]
    async fn missing_record_is_not_found_not_local_only() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(MemoryProjectSource::default());

        let outcome = controller
            .apply_update(&project, ProjectPatch::default())
            .await;

        assert_matches!(outcome, UpdateOutcome::NotFound { id } if id == "proj-1");
        assert!(!controller.is_unsynced(&project.id).await);
    }

    #[tokio::test]
    async fn demo_mode_never_persists() {
        let project = sample_project(ProjectStage::Bidding);
        let store = Arc::new(MemoryProjectSource::new(vec![project.clone()]));
        let controller = LifecycleController::new(store.clone(), PersistenceMode::Demo);

        let outcome = controller
            .perform(&project, LifecycleAction::MarkFlag(StatusFlag::PaymentReceived))
            .await
            .unwrap();

        assert_matches!(outcome, UpdateOutcome::LocalOnly { .. });
        let stored = store.get_by_id(&project.id).await.unwrap().unwrap();
        assert!(!stored.payment_received);
    }

    #[tokio::test]
    async fn precondition_failure_is_reported() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(MemoryProjectSource::new(vec![project.clone()]));

        let result = controller
            .perform(&project, LifecycleAction::CreateProposal)
            .await;

        assert_matches!(result, Err(CoreError::Precondition(_)));
    }

    #[tokio::test]
    async fn successful_sync_clears_unsynced_mark() {
        let project = sample_project(ProjectStage::Inquiry);
        let store = Arc::new(MemoryProjectSource::new(vec![project.clone()]));
        let controller = LifecycleController::new(store.clone(), PersistenceMode::Live);

        store.set_offline(true);
        let local = controller.apply_update(&project, ProjectPatch::default()).await;
        assert_matches!(local, UpdateOutcome::LocalOnly { .. });
        assert_eq!(controller.unsynced_ids().await, vec!["proj-1".to_string()]);

        store.set_offline(false);
        let synced = controller.apply_update(&project, ProjectPatch::default()).await;
        assert_matches!(synced, UpdateOutcome::Synced(_));
        assert!(controller.unsynced_ids().await.is_empty());
    }

    #[tokio::test]
    async fn unsynced_record_loads_in_local_form_and_replays() {
        let project = sample_project(ProjectStage::Inquiry);
        let store = Arc::new(MemoryProjectSource::new(vec![project.clone()]));
        let controller = LifecycleController::new(store.clone(), PersistenceMode::Live);

        store.set_offline(true);
        controller
            .perform(&project, LifecycleAction::MarkFlag(StatusFlag::ConsultationCompleted))
            .await
            .unwrap();
        store.set_offline(false);

        assert_matches!(
            controller.load("proj-1").await,
            LoadOutcome::LocalOnly { project, .. } if project.consultation_completed
        );

        let outcome = controller
            .perform(&project, LifecycleAction::CreateProposal)
            .await
            .unwrap();
        assert_matches!(
            &outcome,
            UpdateOutcome::Synced(p) if p.consultation_completed && p.stage == ProjectStage::Proposal
        );
        assert!(!controller.is_unsynced("proj-1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_store_times_out_to_local_only() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(HangingSource).with_persist_timeout(Duration::from_secs(2));

        let outcome = controller
            .apply_update(&project, ProjectPatch {
                notes: Some("call client".into()),
                ..Default::default()
            })
            .await;

        assert_matches!(outcome, UpdateOutcome::LocalOnly { reason, .. } if reason.contains("no response"));
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_is_reported_precisely() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(HangingSource).with_persist_timeout(Duration::from_millis(250));

        let outcome = controller.apply_update(&project, ProjectPatch::default()).await;

        assert_matches!(outcome, UpdateOutcome::LocalOnly { reason, .. } if reason.contains("250ms"));
    }

    #[tokio::test]
    async fn refused_write_is_rejected_not_kept_locally() {
        for error in [
            SourceError::Rejected("violates foreign key constraint".into()),
            SourceError::Corrupt("violates foreign key constraint".into()),
        ] {
            let project = sample_project(ProjectStage::Inquiry);
            let controller = live(RefusingSource {
                inner: MemoryProjectSource::new(vec![project.clone()]),
                error,
            });
            let patch = ProjectPatch {
                client_id: Some("client-404".into()),
                ..Default::default()
            };

            let first = controller.apply_update(&project, patch.clone()).await;
            assert_matches!(&first, UpdateOutcome::Rejected { id, reason } if id == "proj-1" && reason.contains("foreign key"));
            assert_eq!(first.sync_status(), None);

            let second = controller.apply_update(&project, patch).await;
            assert_matches!(second, UpdateOutcome::Rejected { .. });
            assert!(controller.unsynced_ids().await.is_empty());
            assert_matches!(controller.load("proj-1").await, LoadOutcome::Loaded(_));
        }
    }

    #[tokio::test]
    async fn rejection_discards_earlier_local_copy() {
        let project = sample_project(ProjectStage::Inquiry);
        let refused = live(RefusingSource {
            inner: MemoryProjectSource::new(vec![project.clone()]),
            error: SourceError::Rejected("check constraint".into()),
        });
        let local = project.merged(&ProjectPatch {
            client_id: Some("client-404".into()),
            ..Default::default()
        });
        refused.unsynced.lock().await.insert(local.id.clone(), local);

        let outcome = refused.apply_update(&project, ProjectPatch::default()).await;
        assert_matches!(outcome, UpdateOutcome::Rejected { .. });
        assert!(!refused.is_unsynced("proj-1").await);
    }

    #[tokio::test]
    async fn record_locks_are_released_after_use() {
        let project = sample_project(ProjectStage::Inquiry);
        let controller = live(MemoryProjectSource::new(vec![project.clone()]));

        controller.apply_update(&project, ProjectPatch::default()).await;
        controller
            .perform(&project, LifecycleAction::MarkFlag(StatusFlag::ConsultationCompleted))
            .await
            .unwrap();
        let _ = controller.perform(&project, LifecycleAction::SendProposal).await;

        assert!(controller.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn load_prefers_fallback_only_when_store_is_down() {
        let project = sample_project(ProjectStage::Proposal);
        let fallback = Arc::new(MemoryProjectSource::new(vec![project.clone()]));

        let down = live(RejectingSource).with_fallback(fallback.clone());
        assert_matches!(down.load("proj-1").await, LoadOutcome::Fallback { .. });
        assert_matches!(down.load("proj-9").await, LoadOutcome::Unavailable { .. });

        let up = live(MemoryProjectSource::default()).with_fallback(fallback);
        assert_matches!(up.load("proj-1").await, LoadOutcome::NotFound { .. });
    }

    #[tokio::test]
    async fn list_falls_back_with_warning() {
        let fallback = Arc::new(MemoryProjectSource::new(vec![sample_project(ProjectStage::Active)]));
        let controller = live(RejectingSource).with_fallback(fallback);

        let listed = controller.list().await.unwrap();
        assert!(listed.fallback);
        assert_eq!(listed.projects.len(), 1);
        assert!(listed.warning.is_some());
    }

    #[tokio::test]
    async fn unreachable_store_without_fallback_is_unavailable() {
        let controller = live(RejectingSource);
        assert_matches!(controller.list().await, Err(CoreError::Unavailable(_)));
        assert_matches!(controller.delete("proj-1").await, Err(CoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn updates_to_one_record_run_one_at_a_time() {
        let project = sample_project(ProjectStage::Bidding);
        let source = Arc::new(CountingSource {
            inner: MemoryProjectSource::new(vec![project.clone()]),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let controller = Arc::new(LifecycleController::new(source.clone(), PersistenceMode::Live));

        let a = {
            let controller = Arc::clone(&controller);
            let project = project.clone();
            tokio::spawn(async move {
                controller
                    .perform(&project, LifecycleAction::MarkFlag(StatusFlag::ProposalSigned))
                    .await
            })
        };
        let b = {
            let controller = Arc::clone(&controller);
            let project = project.clone();
            tokio::spawn(async move {
                controller
                    .perform(&project, LifecycleAction::MarkFlag(StatusFlag::PaymentReceived))
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(source.peak.load(Ordering::SeqCst), 1);
        assert!(controller.in_flight.lock().await.is_empty());
        let stored = source.get_by_id("proj-1").await.unwrap().unwrap();
        assert!(stored.proposal_signed && stored.payment_received);
        assert_eq!(stored.stage, ProjectStage::Active);
    }
}
