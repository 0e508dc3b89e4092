//! Core types for QAcart.
//!
//! This module provides type-safe wrappers for the progress-tracking and
//! certificate domain.

pub mod certificate;
pub mod eligibility;
pub mod id;
pub mod patch;
pub mod progress;
pub mod status;
pub mod student_name;
pub mod subscription;

pub use certificate::{
    CODE_ALPHABET, Certificate, CertificateNumber, CertificatePublicView, VerificationCode,
    VerificationCodeError,
};
pub use eligibility::{Eligibility, IneligibilityReason};
pub use id::*;
pub use patch::{CertificatePatch, FieldPatch, ProgressPatch};
pub use progress::{CompletionOutcome, LessonProgress, UserProgress, progress_percentage};
pub use status::*;
pub use student_name::{StudentName, StudentNameError};
pub use subscription::{GiftDetails, Subscription};
