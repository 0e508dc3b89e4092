//! Partial updates applied atomically by a store adapter.
//!
//! A patch names every field it touches explicitly, so "leave alone",
//! "overwrite" and "clear" cannot be confused.

use chrono::{DateTime, Utc};

use super::certificate::Certificate;
use super::progress::UserProgress;
use super::status::CertificateStatus;

/// Change to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldPatch<T> {
    /// Keep the stored value.
    #[default]
    Unchanged,
    /// Overwrite the stored value.
    Set(T),
    /// Clear an optional field.
    Remove,
}

impl<T> FieldPatch<T> {
    /// Apply to an optional field.
    pub fn apply_to_option(self, target: &mut Option<T>) {
        match self {
            Self::Unchanged => {}
            Self::Set(value) => *target = Some(value),
            Self::Remove => *target = None,
        }
    }

    /// Apply to a required field. `Remove` leaves required fields untouched.
    pub fn apply_to(self, target: &mut T) {
        if let Self::Set(value) = self {
            *target = value;
        }
    }

    /// Whether this patch changes anything.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Split into "should write" and the value to write (`None` clears).
    ///
    /// Handy for SQL adapters binding `CASE WHEN $n THEN $m ELSE col END`.
    #[must_use]
    pub fn into_write(self) -> (bool, Option<T>) {
        match self {
            Self::Unchanged => (false, None),
            Self::Set(value) => (true, Some(value)),
            Self::Remove => (true, None),
        }
    }
}

/// Partial update of a progress record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressPatch {
    pub last_accessed: FieldPatch<DateTime<Utc>>,
    pub updated_at: FieldPatch<DateTime<Utc>>,
}

impl ProgressPatch {
    /// Refresh the access timestamps to `now`.
    #[must_use]
    pub const fn touch(now: DateTime<Utc>) -> Self {
        Self {
            last_accessed: FieldPatch::Set(now),
            updated_at: FieldPatch::Set(now),
        }
    }

    /// Apply to an in-memory record, bumping its revision.
    pub fn apply(self, progress: &mut UserProgress) {
        self.last_accessed.apply_to(&mut progress.last_accessed);
        self.updated_at.apply_to(&mut progress.updated_at);
        progress.revision = progress.revision.saturating_add(1);
    }
}

/// Partial update of a certificate.
///
/// Codes, numbers and names have no patch field: they are frozen at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertificatePatch {
    pub status: FieldPatch<CertificateStatus>,
    pub revoked_at: FieldPatch<DateTime<Utc>>,
    pub revocation_reason: FieldPatch<String>,
}

impl CertificatePatch {
    /// Revoke at `now`. A missing reason clears any earlier one.
    #[must_use]
    pub fn revoke(now: DateTime<Utc>, reason: Option<String>) -> Self {
        Self {
            status: FieldPatch::Set(CertificateStatus::Revoked),
            revoked_at: FieldPatch::Set(now),
            revocation_reason: reason.map_or(FieldPatch::Remove, FieldPatch::Set),
        }
    }

    /// Apply to an in-memory certificate.
    pub fn apply(self, certificate: &mut Certificate) {
        self.status.apply_to(&mut certificate.status);
        self.revoked_at.apply_to_option(&mut certificate.revoked_at);
        self.revocation_reason
            .apply_to_option(&mut certificate.revocation_reason);
    }
}
