use chrono::Utc;
use tracing::{debug, instrument, warn};

use qacart_core::{CourseId, Eligibility, ProgressKey, UserId};

use super::CertificateService;
use crate::db::{CertificateStore, CourseCatalog, ProgressStore, UserDirectory};
use crate::services::ServiceError;

impl<S> CertificateService<'_, S>
where
    S: UserDirectory + CourseCatalog + ProgressStore + CertificateStore,
{
    /// Decide whether the user may claim a certificate for the course right now.
    ///
    /// All fields of the verdict are filled in even when an earlier condition
    /// already failed. A missing progress record reads as 0%.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user does not exist.
    /// Returns `ServiceError::EnrollmentConflict` if the progress key belongs to
    /// a different user-course pair.
    /// Returns `ServiceError::StoreUnavailable` if any lookup fails.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn check_eligibility(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Eligibility, ServiceError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_owned()))?;
        let is_premium = user.subscription.is_premium_at(Utc::now());

        let key = ProgressKey::new(user_id, course_id);
        let progress_percentage = match self.store.get(&key).await? {
            Some(progress) if !progress.belongs_to(user_id, course_id) => {
                warn!(key = %key, "Progress key held by another enrollment");
                return Err(ServiceError::EnrollmentConflict(key.to_string()));
            }
            Some(progress) => progress.progress_percentage,
            None => 0,
        };

        let has_existing_certificate = self
            .store
            .find_by_enrollment(user_id, course_id)
            .await?
            .is_some();

        let verdict =
            Eligibility::evaluate(is_premium, progress_percentage, has_existing_certificate);
        debug!(
            is_eligible = verdict.is_eligible,
            reason = ?verdict.reason,
            progress_percentage,
            "Eligibility evaluated"
        );
        Ok(verdict)
    }
}
