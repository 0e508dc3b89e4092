//! In-process store with the same semantics as [`PgStore`](super::PgStore).
//!
//! Used by unit and integration tests. Besides seeding helpers it can simulate
//! an outage and the races the services have to survive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use qacart_core::{
    Certificate, CertificateId, CertificatePatch, CourseId, ProgressKey, ProgressPatch, UserId,
    UserProgress, VerificationCode,
};

use super::{
    CertificateStore, CourseCatalog, CreateOutcome, ProgressStore, PurgeScope, RepositoryError,
    UserDirectory,
};
use crate::models::{Course, UserAccount};

#[derive(Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    courses: HashMap<CourseId, Course>,
    progress: HashMap<ProgressKey, UserProgress>,
    certificates: HashMap<CertificateId, Certificate>,
    /// Certificate inserts still to be rejected with a code collision.
    pending_code_collisions: u32,
    /// Conditional progress writes still to lose against a phantom writer.
    pending_write_races: u32,
    /// Certificate a phantom claim stores just before the next insert.
    pending_claim: Option<Certificate>,
}

/// Thread-safe in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`RepositoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Reject the next `n` certificate inserts as verification code collisions.
    pub fn collide_next_codes(&self, n: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_code_collisions = n;
        }
    }

    /// Make the next `n` conditional progress writes lose to a concurrent writer.
    pub fn race_next_writes(&self, n: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_write_races = n;
        }
    }

    /// Store `certificate` right before the next certificate insert runs, as
    /// a claim that passed its eligibility check at the same moment would.
    pub fn claim_before_next_insert(&self, certificate: Certificate) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_claim = Some(certificate);
        }
    }

    /// Seed a user account.
    pub fn insert_user(&self, user: UserAccount) {
        if let Ok(mut state) = self.state.lock() {
            state.users.insert(user.id.clone(), user);
        }
    }

    /// Seed a catalog course.
    pub fn insert_course(&self, course: Course) {
        if let Ok(mut state) = self.state.lock() {
            state.courses.insert(course.id.clone(), course);
        }
    }

    /// Seed a certificate, bypassing uniqueness checks.
    pub fn insert_certificate(&self, certificate: Certificate) {
        if let Ok(mut state) = self.state.lock() {
            state.certificates.insert(certificate.id.clone(), certificate);
        }
    }

    /// Number of stored progress records.
    #[must_use]
    pub fn progress_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.progress.len())
    }

    /// Number of stored certificates, revoked ones included.
    #[must_use]
    pub fn certificate_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.certificates.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store is offline".to_owned(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_owned()))
    }
}

impl ProgressStore for MemoryStore {
    async fn get(&self, key: &ProgressKey) -> Result<Option<UserProgress>, RepositoryError> {
        Ok(self.lock()?.progress.get(key).cloned())
    }

    async fn create_if_absent(
        &self,
        progress: &UserProgress,
    ) -> Result<UserProgress, RepositoryError> {
        let mut state = self.lock()?;
        let key = progress.key();
        let stored = state
            .progress
            .entry(key.clone())
            .or_insert_with(|| progress.clone());
        if !stored.belongs_to(&progress.user_id, &progress.course_id) {
            return Err(RepositoryError::KeyCollision(key.as_str().to_owned()));
        }
        Ok(stored.clone())
    }

    async fn replace_if_revision(
        &self,
        progress: &UserProgress,
        expected_revision: u64,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;

        if state.pending_write_races > 0 {
            state.pending_write_races -= 1;
            if let Some(stored) = state.progress.get_mut(&progress.key()) {
                let at = stored.last_accessed;
                stored.touch(at);
            }
            return Ok(false);
        }

        match state.progress.get_mut(&progress.key()) {
            Some(stored) if stored.revision == expected_revision => {
                *stored = progress.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_patch(
        &self,
        key: &ProgressKey,
        patch: ProgressPatch,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        match state.progress.get_mut(key) {
            Some(stored) => {
                patch.apply(stored);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge(&self, scope: &PurgeScope) -> Result<u64, RepositoryError> {
        let mut state = self.lock()?;
        let before = state.progress.len();
        state.progress.retain(|_, progress| match scope {
            PurgeScope::User(user_id) => &progress.user_id != user_id,
            PurgeScope::Course(course_id) => &progress.course_id != course_id,
        });
        Ok(u64::try_from(before - state.progress.len()).unwrap_or(u64::MAX))
    }
}

impl CertificateStore for MemoryStore {
    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self.lock()?.certificates.get(id).cloned())
    }

    async fn find_by_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self
            .lock()?
            .certificates
            .values()
            .find(|c| &c.user_id == user_id && &c.course_id == course_id && c.is_issued())
            .cloned())
    }

    async fn find_by_verification_code(
        &self,
        code: &VerificationCode,
    ) -> Result<Option<Certificate>, RepositoryError> {
        Ok(self
            .lock()?
            .certificates
            .values()
            .find(|c| &c.verification_code == code && c.is_issued())
            .cloned())
    }

    async fn create_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<CreateOutcome, RepositoryError> {
        let mut state = self.lock()?;

        if let Some(claim) = state.pending_claim.take() {
            state.certificates.insert(claim.id.clone(), claim);
        }

        if let Some(existing) = state.certificates.get(&certificate.id) {
            if !existing.belongs_to(&certificate.user_id, &certificate.course_id) {
                return Err(RepositoryError::KeyCollision(certificate.id.to_string()));
            }
            return Ok(CreateOutcome::AlreadyExists);
        }

        if state.pending_code_collisions > 0 {
            state.pending_code_collisions -= 1;
            return Err(RepositoryError::Conflict(
                "certificate_verification_code_key".to_owned(),
            ));
        }

        for existing in state.certificates.values() {
            if existing.verification_code == certificate.verification_code {
                return Err(RepositoryError::Conflict(
                    "certificate_verification_code_key".to_owned(),
                ));
            }
            if existing.certificate_number == certificate.certificate_number {
                return Err(RepositoryError::Conflict(
                    "certificate_certificate_number_key".to_owned(),
                ));
            }
        }

        state
            .certificates
            .insert(certificate.id.clone(), certificate.clone());
        Ok(CreateOutcome::Created)
    }

    async fn apply_patch(
        &self,
        id: &CertificateId,
        patch: CertificatePatch,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let mut state = self.lock()?;
        Ok(state.certificates.get_mut(id).map(|stored| {
            patch.apply(stored);
            stored.clone()
        }))
    }
}

impl UserDirectory for MemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }
}

impl CourseCatalog for MemoryStore {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.lock()?.courses.get(id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use qacart_core::{LessonId, StudentName};

    use super::*;

    fn progress(user: &str, course: &str) -> UserProgress {
        UserProgress::new(UserId::new(user), CourseId::new(course), 4, Utc::now())
    }

    #[tokio::test]
    async fn test_create_if_absent_keeps_first_record() {
        let store = MemoryStore::new();
        let mut first = progress("u1", "c1");
        first.record_completion(LessonId::new("l1"), None, Utc::now());

        ProgressStore::create_if_absent(&store, &first).await.unwrap();
        let stored = ProgressStore::create_if_absent(&store, &progress("u1", "c1"))
            .await
            .unwrap();

        assert_eq!(stored.completed_lessons.len(), 1);
        assert_eq!(store.progress_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_if_revision_rejects_stale_writer() {
        let store = MemoryStore::new();
        let created = ProgressStore::create_if_absent(&store, &progress("u1", "c1"))
            .await
            .unwrap();

        let mut a = created.clone();
        a.record_completion(LessonId::new("l1"), None, Utc::now());
        let mut b = created.clone();
        b.record_completion(LessonId::new("l2"), None, Utc::now());

        assert!(store.replace_if_revision(&a, created.revision).await.unwrap());
        assert!(!store.replace_if_revision(&b, created.revision).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_by_user_and_course() {
        let store = MemoryStore::new();
        for (user, course) in [("u1", "c1"), ("u1", "c2"), ("u2", "c1")] {
            ProgressStore::create_if_absent(&store, &progress(user, course))
                .await
                .unwrap();
        }

        let removed = store
            .purge(&PurgeScope::User(UserId::new("u1")))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let removed = store
            .purge(&PurgeScope::Course(CourseId::new("c1")))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.progress_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store
            .get(&ProgressKey::new(&UserId::new("u"), &CourseId::new("c")))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_certificate_code_must_be_unique() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let code = VerificationCode::parse("ABCDEFGH23").unwrap();

        let make = |user: &str, number: &str| {
            let user = UserId::new(user);
            let course = CourseId::new("c1");
            Certificate {
                id: CertificateId::for_enrollment(&user, &course),
                certificate_number: qacart_core::CertificateNumber::from_stored(number.to_owned()),
                verification_code: code.clone(),
                user_id: user,
                course_id: course,
                student_name: StudentName::parse("Sara Ali").unwrap(),
                course_name: "Cypress".to_owned(),
                issued_at: now,
                status: qacart_core::CertificateStatus::Issued,
                language: qacart_core::Language::En,
                issuer_signature: "QAcart Academy".to_owned(),
                revoked_at: None,
                revocation_reason: None,
            }
        };

        assert_eq!(
            CertificateStore::create_if_absent(&store, &make("u1", "N-1")).await.unwrap(),
            CreateOutcome::Created
        );
        assert_eq!(
            CertificateStore::create_if_absent(&store, &make("u1", "N-1")).await.unwrap(),
            CreateOutcome::AlreadyExists
        );
        assert!(matches!(
            CertificateStore::create_if_absent(&store, &make("u2", "N-2")).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_progress_key_held_by_other_enrollment() {
        let store = MemoryStore::new();
        let mut first = progress("a_b", "c");
        first.record_completion(LessonId::new("v1"), None, Utc::now());
        ProgressStore::create_if_absent(&store, &first).await.unwrap();

        let err = ProgressStore::create_if_absent(&store, &progress("a", "b_c"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::KeyCollision(key) if key == "a_b_c"));
        let stored = store.get(&first.key()).await.unwrap().unwrap();
        assert!(stored.belongs_to(&UserId::new("a_b"), &CourseId::new("c")));
        assert_eq!(stored.completed_lessons.len(), 1);
    }

    #[tokio::test]
    async fn test_certificate_id_held_by_other_enrollment() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let make = |user: &str, course: &str, number: &str, code: &str| {
            let user = UserId::new(user);
            let course = CourseId::new(course);
            Certificate {
                id: CertificateId::for_enrollment(&user, &course),
                certificate_number: qacart_core::CertificateNumber::from_stored(number.to_owned()),
                verification_code: VerificationCode::parse(code).unwrap(),
                user_id: user,
                course_id: course,
                student_name: StudentName::parse("Sara Ali").unwrap(),
                course_name: "Cypress".to_owned(),
                issued_at: now,
                status: qacart_core::CertificateStatus::Issued,
                language: qacart_core::Language::En,
                issuer_signature: "QAcart Academy".to_owned(),
                revoked_at: None,
                revocation_reason: None,
            }
        };

        let held = make("a_b", "c", "N-1", "ABCDEFGH23");
        let other = make("a", "b_c", "N-2", "HGFEDCBA32");
        assert_eq!(held.id, other.id);

        CertificateStore::create_if_absent(&store, &held).await.unwrap();
        assert!(matches!(
            CertificateStore::create_if_absent(&store, &other).await,
            Err(RepositoryError::KeyCollision(_))
        ));
        assert_eq!(store.certificate_count(), 1);
    }
}
