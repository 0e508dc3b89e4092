use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, instrument, warn};

use qacart_core::{
    Certificate, CertificateId, CertificateNumber, CertificateStatus, CourseId, StudentName,
    UserId, VerificationCode,
};

use super::CertificateService;
use crate::db::{
    CertificateStore, CourseCatalog, CreateOutcome, ProgressStore, RepositoryError, UserDirectory,
};
use crate::models::Course;
use crate::services::{MAX_WRITE_ATTEMPTS, ServiceError};

impl<S> CertificateService<'_, S>
where
    S: UserDirectory + CourseCatalog + ProgressStore + CertificateStore,
{
    /// Issue a certificate for a completed course.
    ///
    /// Eligibility is re-checked here regardless of what the client saw. The
    /// write is create-if-absent on the enrollment's deterministic ID, so of
    /// two concurrent claims exactly one succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotEligible` if the fresh eligibility check fails.
    /// Returns `ServiceError::InvalidInput` if `student_name` is rejected.
    /// Returns `ServiceError::NotFound` if the user or course does not exist.
    /// Returns `ServiceError::AlreadyIssued` if a concurrent claim won.
    /// Returns `ServiceError::StoreUnavailable` if the store fails.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn issue_certificate(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        student_name: &str,
    ) -> Result<Certificate, ServiceError> {
        let eligibility = self.check_eligibility(user_id, course_id).await?;
        if let Some(reason) = eligibility.reason {
            return Err(ServiceError::NotEligible(reason));
        }

        let student_name = StudentName::parse(student_name)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("course not found".to_owned()))?;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let certificate = self.draft(user_id, &course, &student_name, Utc::now());

            match CertificateStore::create_if_absent(self.store, &certificate).await {
                Ok(CreateOutcome::Created) => {
                    info!(
                        certificate_id = %certificate.id,
                        certificate_number = %certificate.certificate_number,
                        "Certificate issued"
                    );
                    return Ok(certificate);
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    info!("Certificate claim lost to an existing certificate");
                    return Err(ServiceError::AlreadyIssued);
                }
                Err(RepositoryError::Conflict(constraint)) => {
                    warn!(attempt, %constraint, "Certificate code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::StoreUnavailable(RepositoryError::Conflict(
            "could not allocate a unique verification code".to_owned(),
        )))
    }

    /// Build a certificate with freshly drawn code and number.
    fn draft(
        &self,
        user_id: &UserId,
        course: &Course,
        student_name: &StudentName,
        issued_at: DateTime<Utc>,
    ) -> Certificate {
        let mut rng = rand::rng();
        let verification_code = VerificationCode::generate_with(|n| rng.random_range(0..n));
        let certificate_number =
            CertificateNumber::generate_with(issued_at, |n| rng.random_range(0..n));

        Certificate {
            id: CertificateId::for_enrollment(user_id, &course.id),
            certificate_number,
            verification_code,
            user_id: user_id.clone(),
            course_id: course.id.clone(),
            student_name: student_name.clone(),
            course_name: course.name.clone(),
            issued_at,
            status: CertificateStatus::Issued,
            language: course.language,
            issuer_signature: self.settings.issuer_signature.clone(),
            revoked_at: None,
            revocation_reason: None,
        }
    }
}
