//! Repository for the `projects` table.

use sqlx::PgPool;
use studio_core::project::{NewProject, ProjectPatch};

use crate::models::project::ProjectRow;

/// Column list for `projects p LEFT JOIN clients c`.
const COLUMNS: &str = "p.id, p.name, p.description, p.project_type, p.location, p.budget, \
     p.square_footage, p.timeline, p.notes, p.client_id, c.name AS client_name, p.stage, \
     p.consultation_completed, p.consultation_completed_date, \
     p.proposal_accepted, p.proposal_accepted_date, p.proposal_sent_date, \
     p.proposal_signed, p.proposal_signed_date, \
     p.payment_received, p.payment_received_date, p.created_at, p.updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new inquiry-stage project with a generated id, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewProject) -> Result<ProjectRow, sqlx::Error> {
        let id = uuid::Uuid::now_v7().to_string();
        let query = format!(
            "WITH inserted AS (
                INSERT INTO projects (id, name, description, project_type, location, budget,
                                      square_footage, timeline, notes, client_id, stage)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'inquiry')
                RETURNING *
             )
             SELECT {COLUMNS} FROM inserted p LEFT JOIN clients c ON c.id = p.client_id"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(&id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.project_type)
            .bind(&input.location)
            .bind(&input.budget)
            .bind(input.square_footage)
            .bind(&input.timeline)
            .bind(&input.notes)
            .bind(&input.client_id)
            .fetch_one(pool)
            .await
    }

    /// Find a project by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p LEFT JOIN clients c ON c.id = p.client_id
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently updated first.
    pub async fn list(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects p LEFT JOIN clients c ON c.id = p.client_id
             ORDER BY p.updated_at DESC"
        );
        sqlx::query_as::<_, ProjectRow>(&query).fetch_all(pool).await
    }

    /// Update a project. Only non-`None` fields in `patch` are applied and
    /// `updated_at` is always refreshed.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!(
            "WITH updated AS (
                UPDATE projects SET
                    name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    project_type = COALESCE($4, project_type),
                    location = COALESCE($5, location),
                    budget = COALESCE($6, budget),
                    square_footage = COALESCE($7, square_footage),
                    timeline = COALESCE($8, timeline),
                    notes = COALESCE($9, notes),
                    client_id = COALESCE($10, client_id),
                    stage = COALESCE($11, stage),
                    consultation_completed = COALESCE($12, consultation_completed),
                    consultation_completed_date = COALESCE($13, consultation_completed_date),
                    proposal_accepted = COALESCE($14, proposal_accepted),
                    proposal_accepted_date = COALESCE($15, proposal_accepted_date),
                    proposal_sent_date = COALESCE($16, proposal_sent_date),
                    proposal_signed = COALESCE($17, proposal_signed),
                    proposal_signed_date = COALESCE($18, proposal_signed_date),
                    payment_received = COALESCE($19, payment_received),
                    payment_received_date = COALESCE($20, payment_received_date),
                    updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM updated p LEFT JOIN clients c ON c.id = p.client_id"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(&patch.name)
            .bind(&patch.description)
            .bind(&patch.project_type)
            .bind(&patch.location)
            .bind(&patch.budget)
            .bind(patch.square_footage)
            .bind(&patch.timeline)
            .bind(&patch.notes)
            .bind(&patch.client_id)
            .bind(patch.stage.map(|s| s.as_str()))
            .bind(patch.consultation_completed)
            .bind(patch.consultation_completed_date)
            .bind(patch.proposal_accepted)
            .bind(patch.proposal_accepted_date)
            .bind(patch.proposal_sent_date)
            .bind(patch.proposal_signed)
            .bind(patch.proposal_signed_date)
            .bind(patch.payment_received)
            .bind(patch.payment_received_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project by id. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
