use marker::GradingError;
use services::ServiceError;
use thiserror::Error;
use util::session::SessionError;

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the envelope message when the body had one.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 401. The stored token has been discarded.
    #[error("not signed in")]
    Unauthorized,

    /// 2xx response whose envelope reported `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("response carried no data")]
    MissingData,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status: 404, message } => ServiceError::NotFound(message),
            other => ServiceError::Backend(other.to_string()),
        }
    }
}

impl From<ApiError> for GradingError {
    fn from(err: ApiError) -> Self {
        GradingError::Collaborator(err.to_string())
    }
}
