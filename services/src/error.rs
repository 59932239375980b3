use thiserror::Error;

/// Errors surfaced by the service layer.
///
/// Backend failures are carried as text so that any transport (the REST client,
/// a test double) can report into the same type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not allowed in the item's current state.
    #[error("{0}")]
    Refused(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(common::format_validation_errors(&errors))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
