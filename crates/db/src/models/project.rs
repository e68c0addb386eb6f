//! Project row model.

use sqlx::FromRow;
use studio_core::lifecycle::ProjectStage;
use studio_core::project::{ClientSummary, Project};
use studio_core::types::Timestamp;

/// A row from `projects` joined with its client's name.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub square_footage: Option<i32>,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub stage: Option<String>,
    pub consultation_completed: bool,
    pub consultation_completed_date: Option<Timestamp>,
    pub proposal_accepted: bool,
    pub proposal_accepted_date: Option<Timestamp>,
    pub proposal_sent_date: Option<Timestamp>,
    pub proposal_signed: bool,
    pub proposal_signed_date: Option<Timestamp>,
    pub payment_received: bool,
    pub payment_received_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            project_type: row.project_type,
            location: row.location,
            budget: row.budget,
            square_footage: row.square_footage,
            timeline: row.timeline,
            notes: row.notes,
            client_id: row.client_id,
            client: row.client_name.map(|name| ClientSummary { name }),
            stage: ProjectStage::parse_lenient(row.stage.as_deref()),
            consultation_completed: row.consultation_completed,
            consultation_completed_date: row.consultation_completed_date,
            proposal_accepted: row.proposal_accepted,
            proposal_accepted_date: row.proposal_accepted_date,
            proposal_sent_date: row.proposal_sent_date,
            proposal_signed: row.proposal_signed,
            proposal_signed_date: row.proposal_signed_date,
            payment_received: row.payment_received,
            payment_received_date: row.payment_received_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
