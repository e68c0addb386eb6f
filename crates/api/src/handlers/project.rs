//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use studio_core::controller::{LoadOutcome, SyncStatus, UpdateOutcome};
use studio_core::error::CoreError;
use studio_core::lifecycle::{select_view, LifecycleAction, ViewKind};
use studio_core::project::{NewProject, Project, ProjectDetailsPatch, ProjectPatch};
use studio_core::types::RecordId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// A project with the view it renders in and its sync status.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub data: Project,
    pub view: ViewKind,
    pub progress: u8,
    /// Absent when the record came from the fallback dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncStatus>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ProjectResponse {
    fn new(project: Project, sync: Option<SyncStatus>, warning: Option<String>) -> Self {
        Self {
            view: select_view(project.stage),
            progress: project.stage.progress_percent(),
            fallback: sync.is_none(),
            sync,
            warning,
            data: project,
        }
    }
}

/// The project list plus whether it is sample data.
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub data: Vec<Project>,
    pub fallback: bool,
    /// Ids whose changes are only held locally.
    pub unsynced: Vec<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

fn not_found(id: RecordId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

/// Resolve the current form of a project, or the error the client should see.
async fn load_current(state: &AppState, id: &str) -> AppResult<(Project, Option<SyncStatus>, Option<String>)> {
    match state.controller.load(id).await {
        LoadOutcome::Loaded(project) => Ok((project, Some(SyncStatus::Synced), None)),
        LoadOutcome::LocalOnly { project, warning } => {
            Ok((project, Some(SyncStatus::LocalOnly), Some(warning)))
        }
        LoadOutcome::Fallback { project, warning } => Ok((project, None, Some(warning))),
        LoadOutcome::NotFound { id } => Err(not_found(id)),
        LoadOutcome::Unavailable { reason, .. } => Err(AppError::Core(CoreError::Unavailable(reason))),
    }
}

fn outcome_response(outcome: UpdateOutcome) -> AppResult<Json<ProjectResponse>> {
    match outcome {
        UpdateOutcome::Synced(project) => {
            Ok(Json(ProjectResponse::new(project, Some(SyncStatus::Synced), None)))
        }
        UpdateOutcome::LocalOnly { project, reason } => Ok(Json(ProjectResponse::new(
            project,
            Some(SyncStatus::LocalOnly),
            Some(reason),
        ))),
        UpdateOutcome::NotFound { id } => Err(not_found(id)),
        UpdateOutcome::Rejected { reason, .. } => Err(AppError::Core(CoreError::Conflict(reason))),
    }
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Project name must not be empty".into()));
    }
    let project = state.controller.create(&input).await?;
    tracing::info!(project_id = %project.id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<ProjectListResponse>> {
    let listed = state.controller.list().await?;
    Ok(Json(ProjectListResponse {
        data: listed.projects,
        fallback: listed.fallback,
        unsynced: state.controller.unsynced_ids().await,
        warning: listed.warning,
    }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<ProjectResponse>> {
    let (project, sync, warning) = load_current(&state, &id).await?;
    Ok(Json(ProjectResponse::new(project, sync, warning)))
}

/// PUT /api/v1/projects/{id}
///
/// Edits descriptive fields only. Stage and status flags change through
/// `/actions`; a body carrying them is rejected.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(details): Json<ProjectDetailsPatch>,
) -> AppResult<Json<ProjectResponse>> {
    if details.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Project name must not be empty".into()));
    }
    let (project, _, _) = load_current(&state, &id).await?;
    let patch = ProjectPatch::from(details);
    outcome_response(state.controller.apply_update(&project, patch).await)
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<StatusCode> {
    if state.controller.delete(&id).await? {
        tracing::info!(project_id = %id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/projects/{id}/actions
///
/// Body: `{"action": "create_proposal"}`, `{"action": "send_proposal"}` or
/// `{"action": "mark_flag", "flag": "proposal_signed"}`.
pub async fn perform_action(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(action): Json<LifecycleAction>,
) -> AppResult<Json<ProjectResponse>> {
    let (project, _, _) = load_current(&state, &id).await?;
    let outcome = state.controller.perform(&project, action).await?;
    outcome_response(outcome)
}
