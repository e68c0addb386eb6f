//! Postgres-backed implementations of the core collaborator traits.

use async_trait::async_trait;
use studio_core::catalog::CatalogItem;
use studio_core::project::{NewProject, Project, ProjectPatch};
use studio_core::source::{CatalogSource, ProjectSource, SourceError};

use crate::repositories::{CatalogItemRepo, ProjectRepo};
use crate::DbPool;

/// Classify a sqlx error for the controller.
///
/// Decode failures mean the row itself is bad and errors raised by the
/// database (constraint violations and the like) mean the write was refused.
/// Everything else is treated as the store being unreachable.
fn source_error(err: sqlx::Error) -> SourceError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
            tracing::error!(error = %err, "Undecodable row");
            SourceError::Corrupt(err.to_string())
        }
        sqlx::Error::Database(db_err) => {
            tracing::warn!(error = %db_err, constraint = ?db_err.constraint(), "Write rejected by database");
            SourceError::Rejected(db_err.message().to_string())
        }
        other => SourceError::Unavailable(other.to_string()),
    }
}

/// Projects stored in PostgreSQL.
#[derive(Clone)]
pub struct PgProjectSource {
    pool: DbPool,
}

impl PgProjectSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectSource for PgProjectSource {
    async fn get_all(&self) -> Result<Vec<Project>, SourceError> {
        let rows = ProjectRepo::list(&self.pool).await.map_err(source_error)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, SourceError> {
        let row = ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(source_error)?;
        Ok(row.map(Project::from))
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<Option<Project>, SourceError> {
        let row = ProjectRepo::update(&self.pool, id, patch)
            .await
            .map_err(source_error)?;
        Ok(row.map(Project::from))
    }

    async fn create(&self, input: &NewProject) -> Result<Project, SourceError> {
        let row = ProjectRepo::create(&self.pool, input)
            .await
            .map_err(source_error)?;
        Ok(Project::from(row))
    }

    async fn delete(&self, id: &str) -> Result<bool, SourceError> {
        ProjectRepo::delete(&self.pool, id).await.map_err(source_error)
    }
}

/// Catalog items stored in PostgreSQL.
#[derive(Clone)]
pub struct PgCatalogSource {
    pool: DbPool,
}

impl PgCatalogSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PgCatalogSource {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, SourceError> {
        let rows = CatalogItemRepo::list(&self.pool)
            .await
            .map_err(source_error)?;
        rows.into_iter()
            .map(|row| CatalogItem::try_from(row).map_err(|e| SourceError::Corrupt(e.to_string())))
            .collect()
    }
}
