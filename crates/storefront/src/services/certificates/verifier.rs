use tracing::{debug, instrument};

use qacart_core::VerificationCode;

use super::{CertificateService, VerificationResult};
use crate::db::{CertificateStore, CourseCatalog, ProgressStore, UserDirectory};
use crate::services::ServiceError;

impl<S> CertificateService<'_, S>
where
    S: UserDirectory + CourseCatalog + ProgressStore + CertificateStore,
{
    /// Public lookup of a certificate by its verification code.
    ///
    /// Safe for hostile input: the code is validated before the store is
    /// touched, and unknown, revoked and malformed codes get the same answer.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::StoreUnavailable` if the lookup fails.
    #[instrument(skip_all)]
    pub async fn verify_by_code(&self, raw_code: &str) -> Result<VerificationResult, ServiceError> {
        let Ok(code) = VerificationCode::parse(raw_code) else {
            debug!("Rejected malformed verification code");
            return Ok(VerificationResult::invalid());
        };

        match self.store.find_by_verification_code(&code).await? {
            Some(certificate) => Ok(VerificationResult::valid(&certificate)),
            None => Ok(VerificationResult::invalid()),
        }
    }
}
