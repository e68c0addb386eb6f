//! Project pipeline record and its patch/create DTOs.
//!
//! A [`Project`] moves through the [`ProjectStage`] pipeline. Mutations are
//! expressed as a [`ProjectPatch`] so the same change can be forwarded to
//! the data store and merged locally when the store is out of reach.

use serde::{Deserialize, Deserializer, Serialize};

use crate::lifecycle::ProjectStage;
use crate::types::{next_timestamp, RecordId, Timestamp};

/// Denormalized client reference carried on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub name: String,
}

/// A project in the firm's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub square_footage: Option<i32>,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub client_id: Option<RecordId>,
    pub client: Option<ClientSummary>,
    /// Unknown or missing stage values read as `inquiry`.
    #[serde(default, deserialize_with = "lenient_stage")]
    pub stage: ProjectStage,
    #[serde(default)]
    pub consultation_completed: bool,
    pub consultation_completed_date: Option<Timestamp>,
    #[serde(default)]
    pub proposal_accepted: bool,
    pub proposal_accepted_date: Option<Timestamp>,
    pub proposal_sent_date: Option<Timestamp>,
    #[serde(default)]
    pub proposal_signed: bool,
    pub proposal_signed_date: Option<Timestamp>,
    #[serde(default)]
    pub payment_received: bool,
    pub payment_received_date: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn lenient_stage<'de, D>(deserializer: D) -> Result<ProjectStage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(ProjectStage::parse_lenient(raw.as_deref()))
}

/// Partial update for a project. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub square_footage: Option<i32>,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub client_id: Option<RecordId>,
    pub stage: Option<ProjectStage>,
    pub consultation_completed: Option<bool>,
    pub consultation_completed_date: Option<Timestamp>,
    pub proposal_accepted: Option<bool>,
    pub proposal_accepted_date: Option<Timestamp>,
    pub proposal_sent_date: Option<Timestamp>,
    pub proposal_signed: Option<bool>,
    pub proposal_signed_date: Option<Timestamp>,
    pub payment_received: Option<bool>,
    pub payment_received_date: Option<Timestamp>,
}

impl ProjectPatch {
    /// True when the patch would change nothing but `updated_at`.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// A patch carrying every writable field of `project`.
    ///
    /// Used to replay a record that was only changed locally.
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: Some(project.name.clone()),
            description: project.description.clone(),
            project_type: project.project_type.clone(),
            location: project.location.clone(),
            budget: project.budget.clone(),
            square_footage: project.square_footage,
            timeline: project.timeline.clone(),
            notes: project.notes.clone(),
            client_id: project.client_id.clone(),
            stage: Some(project.stage),
            consultation_completed: Some(project.consultation_completed),
            consultation_completed_date: project.consultation_completed_date,
            proposal_accepted: Some(project.proposal_accepted),
            proposal_accepted_date: project.proposal_accepted_date,
            proposal_sent_date: project.proposal_sent_date,
            proposal_signed: Some(project.proposal_signed),
            proposal_signed_date: project.proposal_signed_date,
            payment_received: Some(project.payment_received),
            payment_received_date: project.payment_received_date,
        }
    }
}

/// Edit to a project's descriptive fields.
///
/// Stage and status flags are not part of it; they only change through
/// lifecycle actions. Unknown fields, `stage` and the flags included, are
/// rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectDetailsPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub square_footage: Option<i32>,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub client_id: Option<RecordId>,
}

impl From<ProjectDetailsPatch> for ProjectPatch {
    fn from(details: ProjectDetailsPatch) -> Self {
        Self {
            name: details.name,
            description: details.description,
            project_type: details.project_type,
            location: details.location,
            budget: details.budget,
            square_footage: details.square_footage,
            timeline: details.timeline,
            notes: details.notes,
            client_id: details.client_id,
            ..Self::default()
        }
    }
}

/// Input for creating a project (inquiry intake).
///
/// New records always start at `inquiry` with every flag unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub project_type: Option<String>,
    pub location: Option<String>,
    pub budget: Option<String>,
    pub square_footage: Option<i32>,
    pub timeline: Option<String>,
    pub notes: Option<String>,
    pub client_id: Option<RecordId>,
}

impl Project {
    /// Build a fresh inquiry-stage record from intake input.
    pub fn from_new(id: RecordId, input: &NewProject, now: Timestamp) -> Self {
        Self {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            project_type: input.project_type.clone(),
            location: input.location.clone(),
            budget: input.budget.clone(),
            square_footage: input.square_footage,
            timeline: input.timeline.clone(),
            notes: input.notes.clone(),
            client_id: input.client_id.clone(),
            client: None,
            stage: ProjectStage::Inquiry,
            consultation_completed: false,
            consultation_completed_date: None,
            proposal_accepted: false,
            proposal_accepted_date: None,
            proposal_sent_date: None,
            proposal_signed: false,
            proposal_signed_date: None,
            payment_received: false,
            payment_received_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `patch` locally, returning the merged record.
    ///
    /// `updated_at` is always refreshed to a value later than the current one.
    pub fn merged(&self, patch: &ProjectPatch) -> Project {
        let mut next = self.clone();

        macro_rules! set {
            (opt $field:ident) => {
                if let Some(value) = &patch.$field {
                    next.$field = Some(value.clone());
                }
            };
            ($field:ident) => {
                if let Some(value) = &patch.$field {
                    next.$field = value.clone();
                }
            };
        }

        set!(name);
        set!(opt description);
        set!(opt project_type);
        set!(opt location);
        set!(opt budget);
        set!(opt square_footage);
        set!(opt timeline);
        set!(opt notes);
        set!(opt client_id);
        set!(stage);
        set!(consultation_completed);
        set!(opt consultation_completed_date);
        set!(proposal_accepted);
        set!(opt proposal_accepted_date);
        set!(opt proposal_sent_date);
        set!(proposal_signed);
        set!(opt proposal_signed_date);
        set!(payment_received);
        set!(opt payment_received_date);

        next.updated_at = next_timestamp(self.updated_at);
        next
    }
}
