use uuid::Uuid;

/// Caller mistakes surfaced by the service layer.
///
/// These travel inside `anyhow::Error` and are recovered by downcasting at the
/// HTTP boundary, where not-found variants map to 404 and the rest to 400.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("family not found: {0}")]
    FamilyNotFound(Uuid),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("subtask not found: {0}")]
    SubTaskNotFound(String),

    #[error("cycle {0} has no tasks to complete")]
    EmptyCycle(u32),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("{0} must not be empty")]
    Missing(&'static str),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FamilyNotFound(_) | Self::TaskNotFound(_) | Self::SubTaskNotFound(_)
        )
    }
}
