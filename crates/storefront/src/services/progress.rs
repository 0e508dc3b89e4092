//! Progress Engine: per-user, per-course lesson completion.
//!
//! State transitions live on [`UserProgress`]; this service loads the record,
//! applies the transition and writes it back with an optimistic revision check.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use qacart_core::{
    CompletionOutcome, CourseId, LessonId, ProgressKey, ProgressPatch, UserId, UserProgress,
};

use super::{MAX_WRITE_ATTEMPTS, ServiceError};
use crate::db::{ProgressStore, PurgeScope, RepositoryError};

/// Longest lesson ID, in bytes, accepted into a progress record.
pub const MAX_LESSON_ID_LEN: usize = 128;

/// Progress tracking service.
pub struct ProgressService<'a, S> {
    store: &'a S,
}

impl<'a, S: ProgressStore> ProgressService<'a, S> {
    /// Create a progress service over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetch the progress record, or `None` if the user never started the course.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::StoreUnavailable` if the lookup fails.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn get_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<UserProgress>, ServiceError> {
        self.load(user_id, course_id).await
    }

    /// Mark `lesson_id` complete, creating the record on first use.
    ///
    /// `total_lessons` is the catalog's current lesson count. It is only
    /// recorded when the record is created. Completing a lesson twice is a
    /// no-op apart from the access timestamps, so retrying after a timeout is
    /// safe.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if `lesson_id` is longer than
    /// [`MAX_LESSON_ID_LEN`], or if the record must be created and
    /// `total_lessons` is zero.
    /// Returns `ServiceError::EnrollmentConflict` if the record's key belongs to
    /// a different user-course pair.
    /// Returns `ServiceError::StoreUnavailable` if the store fails or the write
    /// keeps losing to concurrent writers.
    #[instrument(
        skip_all,
        fields(user_id = %user_id, course_id = %course_id, lesson_id = %lesson_id)
    )]
    pub async fn record_lesson_complete(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        lesson_id: &LessonId,
        total_lessons: u32,
        time_spent: Option<u32>,
    ) -> Result<UserProgress, ServiceError> {
        if lesson_id.as_str().len() > MAX_LESSON_ID_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "lesson id must be at most {MAX_LESSON_ID_LEN} bytes"
            )));
        }

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut progress = match self.load(user_id, course_id).await? {
                Some(progress) => progress,
                None => self.create(user_id, course_id, total_lessons).await?,
            };

            let expected_revision = progress.revision;
            let outcome = progress.record_completion(lesson_id.clone(), time_spent, Utc::now());

            if self
                .store
                .replace_if_revision(&progress, expected_revision)
                .await?
            {
                match outcome {
                    CompletionOutcome::Recorded {
                        course_completed: true,
                    } => info!(percentage = progress.progress_percentage, "Course completed"),
                    CompletionOutcome::Recorded { .. } => {
                        debug!(percentage = progress.progress_percentage, "Lesson completed");
                    }
                    CompletionOutcome::AlreadyCompleted => {
                        debug!("Lesson already completed, timestamps refreshed");
                    }
                }
                return Ok(progress);
            }

            debug!(attempt, "Progress write lost a race, reloading");
        }

        warn!("Progress write kept conflicting, giving up");
        Err(ServiceError::StoreUnavailable(RepositoryError::Unavailable(
            "progress record is being modified concurrently".to_owned(),
        )))
    }

    /// Refresh the access timestamps on a course view.
    ///
    /// Never fails: a missing or foreign record is ignored and store errors are
    /// logged.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn touch_last_accessed(&self, user_id: &UserId, course_id: &CourseId) {
        let key = ProgressKey::new(user_id, course_id);

        match self.load(user_id, course_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("No progress record to touch");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load progress before touch");
                return;
            }
        }

        match self
            .store
            .apply_patch(&key, ProgressPatch::touch(Utc::now()))
            .await
        {
            Ok(true) => {}
            Ok(false) => debug!("No progress record to touch"),
            Err(e) => warn!(error = %e, "Failed to update last accessed"),
        }
    }

    /// Ensure a progress record exists for the first course access, then touch it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the record must be created and
    /// `total_lessons` is zero.
    /// Returns `ServiceError::EnrollmentConflict` if the record's key belongs to
    /// a different user-course pair.
    /// Returns `ServiceError::StoreUnavailable` if the store fails.
    #[instrument(skip_all, fields(user_id = %user_id, course_id = %course_id))]
    pub async fn start_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        total_lessons: u32,
    ) -> Result<UserProgress, ServiceError> {
        let key = ProgressKey::new(user_id, course_id);

        let mut progress = match self.load(user_id, course_id).await? {
            Some(progress) => progress,
            None => self.create(user_id, course_id, total_lessons).await?,
        };

        let patch = ProgressPatch::touch(Utc::now());
        if self.store.apply_patch(&key, patch.clone()).await? {
            patch.apply(&mut progress);
        }

        Ok(progress)
    }

    /// Delete progress records for a removed user or course.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::StoreUnavailable` if the delete fails.
    #[instrument(skip(self))]
    pub async fn purge(&self, scope: &PurgeScope) -> Result<u64, ServiceError> {
        let removed = self.store.purge(scope).await?;
        info!(removed, "Purged progress records");
        Ok(removed)
    }

    /// Keyed lookup that refuses a record owned by another user-course pair.
    async fn load(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<UserProgress>, ServiceError> {
        let key = ProgressKey::new(user_id, course_id);
        match self.store.get(&key).await? {
            Some(progress) if !progress.belongs_to(user_id, course_id) => {
                warn!(key = %key, "Progress key held by another enrollment");
                Err(ServiceError::EnrollmentConflict(key.to_string()))
            }
            found => Ok(found),
        }
    }

    async fn create(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        total_lessons: u32,
    ) -> Result<UserProgress, ServiceError> {
        if total_lessons == 0 {
            return Err(ServiceError::InvalidInput(
                "course has no lessons".to_owned(),
            ));
        }

        let fresh = UserProgress::new(user_id.clone(), course_id.clone(), total_lessons, Utc::now());
        let stored = self.store.create_if_absent(&fresh).await?;
        debug!(total_lessons = stored.total_lessons, "Progress record ready");
        Ok(stored)
    }
}
