use crate::source::SourceError;
use crate::types::RecordId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: RecordId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A lifecycle action was requested while its precondition does not hold.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A data store could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SourceError> for CoreError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(msg) => Self::Unavailable(msg),
            SourceError::Corrupt(msg) => Self::Internal(msg),
            SourceError::Rejected(msg) => Self::Conflict(msg),
        }
    }
}
