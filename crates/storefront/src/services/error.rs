//! Service error types.

use thiserror::Error;

use qacart_core::IneligibilityReason;

use crate::db::RepositoryError;

/// Errors returned by progress and certificate operations.
///
/// Validation and eligibility failures carry user-facing text; store failures
/// carry internal detail that must not reach the client.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A user, course or certificate the caller referenced does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Caller-supplied input failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The fresh eligibility check at issuance failed.
    #[error("not eligible: {0}")]
    NotEligible(IneligibilityReason),

    /// A certificate already exists for this enrollment; fetch it instead.
    #[error("certificate already issued")]
    AlreadyIssued,

    /// The enrollment's storage key is held by a different (user, course) pair.
    #[error("enrollment conflict: {0}")]
    EnrollmentConflict(String),

    /// The store failed or could not complete the write.
    #[error("store unavailable: {0}")]
    StoreUnavailable(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::KeyCollision(key) => Self::EnrollmentConflict(key),
            other => Self::StoreUnavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_collision_is_enrollment_conflict() {
        let err = ServiceError::from(RepositoryError::KeyCollision("a_b_c".to_string()));
        assert!(matches!(err, ServiceError::EnrollmentConflict(key) if key == "a_b_c"));
    }

    #[test]
    fn test_other_repository_errors_are_unavailable() {
        let err = ServiceError::from(RepositoryError::Conflict("pkey".to_string()));
        assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    }
}
