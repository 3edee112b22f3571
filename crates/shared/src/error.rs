//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain errors from the engine collapse into one of these kinds before
/// they reach a caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced resource does not exist or belongs to another tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is missing required fields or carries invalid values.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Operation is not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Write lost a race against another writer.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::InvalidState(_) | Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::BadRequest(String::new()), 400, "BAD_REQUEST")]
    #[case(AppError::InvalidState(String::new()), 409, "INVALID_STATE")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("supplier".into()).to_string(),
            "Not found: supplier"
        );
        assert_eq!(
            AppError::InvalidState("entry is received".into()).to_string(),
            "Invalid state: entry is received"
        );
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(AppError::Conflict(String::new()).is_retryable());
        assert!(!AppError::InvalidState(String::new()).is_retryable());
        assert!(!AppError::Database(String::new()).is_retryable());
    }
}
