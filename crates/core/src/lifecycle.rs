//! Project lifecycle state machine.
//!
//! Stages advance strictly forward:
//!
//! ```text
//! inquiry --create_proposal--> proposal --send_proposal--> bidding --(signed AND paid)--> active
//! ```
//!
//! `completed` is terminal and has no in-scope transition into or out of it.
//! Every transition is planned as a [`ProjectPatch`] so the controller can
//! forward exactly the changed fields; [`mark_flag`] is the pure,
//! patch-and-merge convenience for callers that only need the result.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::{Project, ProjectPatch};
use crate::types::{next_timestamp, Timestamp};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline stage of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStage {
    #[default]
    Inquiry,
    Proposal,
    Bidding,
    Active,
    Completed,
}

/// All stages in pipeline order.
pub const STAGE_ORDER: [ProjectStage; 5] = [
    ProjectStage::Inquiry,
    ProjectStage::Proposal,
    ProjectStage::Bidding,
    ProjectStage::Active,
    ProjectStage::Completed,
];

impl ProjectStage {
    /// Parse a stage string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "inquiry" => Ok(Self::Inquiry),
            "proposal" => Ok(Self::Proposal),
            "bidding" => Ok(Self::Bidding),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid project stage '{s}'. Must be one of: inquiry, proposal, bidding, active, completed"
            ))),
        }
    }

    /// Parse a stage, treating unknown or missing values as `inquiry`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Inquiry,
            Some(s) => Self::from_str_db(s).unwrap_or_else(|_| {
                tracing::warn!(stage = s, "Unknown project stage, treating as inquiry");
                Self::Inquiry
            }),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Proposal => "proposal",
            Self::Bidding => "bidding",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn position(self) -> usize {
        match self {
            Self::Inquiry => 0,
            Self::Proposal => 1,
            Self::Bidding => 2,
            Self::Active => 3,
            Self::Completed => 4,
        }
    }

    /// Pipeline progress shown on project cards, 0 to 100.
    pub fn progress_percent(self) -> u8 {
        let last = STAGE_ORDER.len() - 1;
        (self.position() * 100 / last) as u8
    }

    /// The stage this one advances into, if any.
    pub fn next(self) -> Option<Self> {
        STAGE_ORDER.get(self.position() + 1).copied()
    }
}

// ---------------------------------------------------------------------------
// Status flags
// ---------------------------------------------------------------------------

/// Boolean milestones layered onto the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    ConsultationCompleted,
    ProposalAccepted,
    ProposalSigned,
    PaymentReceived,
}

impl StatusFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsultationCompleted => "consultation_completed",
            Self::ProposalAccepted => "proposal_accepted",
            Self::ProposalSigned => "proposal_signed",
            Self::PaymentReceived => "payment_received",
        }
    }

    /// Current value of this flag on `project`.
    pub fn is_set(self, project: &Project) -> bool {
        match self {
            Self::ConsultationCompleted => project.consultation_completed,
            Self::ProposalAccepted => project.proposal_accepted,
            Self::ProposalSigned => project.proposal_signed,
            Self::PaymentReceived => project.payment_received,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Presentation handler chosen for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Inquiry,
    Proposal,
    Bidding,
    Active,
}

/// Pick the view for a stage. Completed projects share the active view.
pub fn select_view(stage: ProjectStage) -> ViewKind {
    match stage {
        ProjectStage::Inquiry => ViewKind::Inquiry,
        ProjectStage::Proposal => ViewKind::Proposal,
        ProjectStage::Bidding => ViewKind::Bidding,
        ProjectStage::Active | ProjectStage::Completed => ViewKind::Active,
    }
}

/// Pick the view for a raw stage string; unknown or unset falls back to inquiry.
pub fn select_view_raw(raw: Option<&str>) -> ViewKind {
    select_view(ProjectStage::parse_lenient(raw))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A user-triggered lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "flag", rename_all = "snake_case")]
pub enum LifecycleAction {
    CreateProposal,
    SendProposal,
    MarkFlag(StatusFlag),
}

/// Patch that sets `flag` and advances `bidding -> active` when the
/// signed-and-paid gate completes with this update.
///
/// A flag that is already set keeps its original date.
pub fn flag_patch(project: &Project, flag: StatusFlag, now: Timestamp) -> ProjectPatch {
    let already = flag.is_set(project);
    let date = if already { None } else { Some(now) };

    let mut patch = ProjectPatch::default();
    match flag {
        StatusFlag::ConsultationCompleted => {
            patch.consultation_completed = Some(true);
            patch.consultation_completed_date = date;
        }
        StatusFlag::ProposalAccepted => {
            patch.proposal_accepted = Some(true);
            patch.proposal_accepted_date = date;
        }
        StatusFlag::ProposalSigned => {
            patch.proposal_signed = Some(true);
            patch.proposal_signed_date = date;
        }
        StatusFlag::PaymentReceived => {
            patch.payment_received = Some(true);
            patch.payment_received_date = date;
        }
    }

    let signed = project.proposal_signed || flag == StatusFlag::ProposalSigned;
    let paid = project.payment_received || flag == StatusFlag::PaymentReceived;
    if project.stage == ProjectStage::Bidding && signed && paid {
        tracing::debug!(project_id = %project.id, "Contract signed and paid, advancing to active");
        patch.stage = Some(ProjectStage::Active);
    }

    patch
}

/// Patch for `inquiry -> proposal`. Requires a completed consultation.
pub fn create_proposal_patch(project: &Project) -> Result<ProjectPatch, CoreError> {
    require_stage(project, ProjectStage::Inquiry, "create a proposal")?;
    if !project.consultation_completed {
        return Err(CoreError::Precondition(format!(
            "Project {} cannot move to proposal before the consultation is completed",
            project.id
        )));
    }
    Ok(ProjectPatch {
        stage: Some(ProjectStage::Proposal),
        ..Default::default()
    })
}

/// Patch for `proposal -> bidding`, stamping the send date.
pub fn send_proposal_patch(project: &Project, now: Timestamp) -> Result<ProjectPatch, CoreError> {
    require_stage(project, ProjectStage::Proposal, "send the proposal")?;
    Ok(ProjectPatch {
        stage: Some(ProjectStage::Bidding),
        proposal_sent_date: Some(now),
        ..Default::default()
    })
}

/// Plan the patch for `action` against the current record.
pub fn plan_action(project: &Project, action: &LifecycleAction) -> Result<ProjectPatch, CoreError> {
    let now = next_timestamp(project.updated_at);
    match action {
        LifecycleAction::CreateProposal => create_proposal_patch(project),
        LifecycleAction::SendProposal => send_proposal_patch(project, now),
        LifecycleAction::MarkFlag(flag) => Ok(flag_patch(project, *flag, now)),
    }
}

/// Set `flag` on a copy of `project`, advancing the stage if the gate completes.
pub fn mark_flag(project: &Project, flag: StatusFlag) -> Project {
    let now = next_timestamp(project.updated_at);
    project.merged(&flag_patch(project, flag, now))
}

fn require_stage(project: &Project, expected: ProjectStage, verb: &str) -> Result<(), CoreError> {
    if project.stage == expected {
        Ok(())
    } else {
        Err(CoreError::Precondition(format!(
            "Cannot {verb} for project {} in stage '{}' (expected '{}')",
            project.id,
            project.stage.as_str(),
            expected.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
