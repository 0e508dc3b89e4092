//! Certificate eligibility verdicts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a user cannot claim a certificate right now.
///
/// Variants are listed in the order they are checked: a user who is neither
/// premium nor finished is told about premium first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    PremiumRequired,
    CourseNotCompleted,
    CertificateAlreadyIssued,
}

impl IneligibilityReason {
    /// User-facing message for this reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PremiumRequired => "premium required",
            Self::CourseNotCompleted => "course not completed",
            Self::CertificateAlreadyIssued => "certificate already issued",
        }
    }
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The computed verdict on whether a user may claim a certificate.
///
/// Every field is filled in even when an earlier check already failed, so the
/// UI can show the full picture (e.g. progress bar next to the premium upsell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub is_eligible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<IneligibilityReason>,
    pub progress_percentage: u8,
    pub is_premium: bool,
    pub has_existing_certificate: bool,
}

impl Eligibility {
    /// Combine the three gating conditions into a verdict.
    ///
    /// Completion is read from the stored percentage, not recomputed from raw
    /// lesson counts.
    #[must_use]
    pub const fn evaluate(
        is_premium: bool,
        progress_percentage: u8,
        has_existing_certificate: bool,
    ) -> Self {
        let is_completed = progress_percentage >= 100;

        let reason = if !is_premium {
            Some(IneligibilityReason::PremiumRequired)
        } else if !is_completed {
            Some(IneligibilityReason::CourseNotCompleted)
        } else if has_existing_certificate {
            Some(IneligibilityReason::CertificateAlreadyIssued)
        } else {
            None
        };

        Self {
            is_eligible: reason.is_none(),
            reason,
            progress_percentage,
            is_premium,
            has_existing_certificate,
        }
    }
}
