//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `progress` - Lesson completion tracking (the Progress Engine)
//! - `certificates` - Eligibility, issuance, revocation and public verification
//!
//! Services borrow their store for the duration of one request and hold no
//! state of their own.

mod error;

pub mod certificates;
pub mod progress;

pub use certificates::{CertificateService, CertificateSettings, VerificationResult};
pub use error::ServiceError;
pub use progress::ProgressService;

/// Attempts made at a write that can lose a race or collide on a unique value.
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 3;
