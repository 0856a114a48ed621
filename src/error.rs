//! Failure classification shared by every handler.
//!
//! Failures keep their classification from the point where they occur all
//! the way to the boundary, where the kind alone decides the HTTP status
//! code. The message text is what gets echoed into the `{"error": ...}`
//! response body on the HTTP paths, so it must stay human-readable.

use lambda_http::http::StatusCode;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ServiceError {
    /// Missing, malformed, or out-of-domain input. Detected before any
    /// database connection is attempted.
    #[error("{0}")]
    Validation(String),

    /// Unset or incomplete connection settings.
    #[error("{0}")]
    Configuration(String),

    /// The database could not be reached.
    #[error("{0}")]
    Connectivity(String),

    /// The database reached, but the operation failed.
    #[error("{0}")]
    Database(String),

    /// Anything we did not anticipate, including a crashed worker.
    #[error("{0}")]
    Unknown(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Configuration(_)
            | ServiceError::Connectivity(_)
            | ServiceError::Database(_)
            | ServiceError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Configuration(_) => ServiceError::Configuration(e.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                ServiceError::Connectivity(e.to_string())
            }
            _ => ServiceError::Database(e.to_string()),
        }
    }
}
