//! Certificate workflow: eligibility, issuance, revocation and verification.

mod eligibility;
mod issuer;
mod verifier;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use qacart_core::{
    Certificate, CertificateId, CertificatePatch, CertificatePublicView, CourseId, UserId,
};

use super::ServiceError;
use crate::db::{CertificateStore, CourseCatalog, ProgressStore, UserDirectory};

/// Attribution printed on certificates when none is configured.
pub const DEFAULT_ISSUER_SIGNATURE: &str = "QAcart Academy";

/// Static settings applied to every issued certificate.
#[derive(Debug, Clone)]
pub struct CertificateSettings {
    /// Attribution text stored on each certificate.
    pub issuer_signature: String,
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            issuer_signature: DEFAULT_ISSUER_SIGNATURE.to_owned(),
        }
    }
}

/// Answer to a public verification request.
///
/// Unknown, revoked and malformed codes all produce the same invalid value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificatePublicView>,
    pub message: String,
}

impl VerificationResult {
    const VALID_MESSAGE: &'static str = "Certificate is valid";
    const INVALID_MESSAGE: &'static str = "No valid certificate matches this code";

    fn valid(certificate: &Certificate) -> Self {
        Self {
            is_valid: true,
            certificate: Some(certificate.public_view()),
            message: Self::VALID_MESSAGE.to_owned(),
        }
    }

    fn invalid() -> Self {
        Self {
            is_valid: false,
            certificate: None,
            message: Self::INVALID_MESSAGE.to_owned(),
        }
    }
}

/// Certificate service.
///
/// Borrows one store that provides every collaborator the workflow reads.
pub struct CertificateService<'a, S> {
    store: &'a S,
    settings: &'a CertificateSettings,
}

impl<'a, S> CertificateService<'a, S>
where
    S: UserDirectory + CourseCatalog + ProgressStore + CertificateStore,
{
    /// Create a certificate service.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a CertificateSettings) -> Self {
        Self { store, settings }
    }

    /// Fetch the caller's issued certificate for a course.
    ///
    /// This is the re-fetch path after an `AlreadyIssued` claim.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no issued certificate exists.
    /// Returns `ServiceError::StoreUnavailable` if the lookup fails.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn get_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Certificate, ServiceError> {
        self.store
            .find_by_enrollment(user_id, course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("certificate not found".to_owned()))
    }

    /// Revoke a certificate. Revoking an already revoked certificate changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the certificate does not exist.
    /// Returns `ServiceError::StoreUnavailable` if the store fails.
    #[instrument(skip(self, reason), fields(certificate_id = %id))]
    pub async fn revoke_certificate(
        &self,
        id: &CertificateId,
        reason: Option<String>,
    ) -> Result<Certificate, ServiceError> {
        let not_found = || ServiceError::NotFound("certificate not found".to_owned());

        let current = self.store.find_by_id(id).await?.ok_or_else(not_found)?;
        if !current.is_issued() {
            return Ok(current);
        }

        let patch = CertificatePatch::revoke(chrono::Utc::now(), reason);
        let revoked = CertificateStore::apply_patch(self.store, id, patch)
            .await?
            .ok_or_else(not_found)?;

        info!(
            certificate_number = %revoked.certificate_number,
            "Certificate revoked"
        );
        Ok(revoked)
    }
}
