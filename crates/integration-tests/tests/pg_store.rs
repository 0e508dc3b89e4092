//! `PgStore` against a real `PostgreSQL` database.
//!
//! These tests require a disposable database in `TEST_DATABASE_URL`; they run
//! the storefront migrations first.
//!
//! Run with: cargo test -p qacart-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use qacart_core::{
    CertificateStatus, CourseId, IneligibilityReason, Language, LessonId, UserId, UserProgress,
};
use qacart_storefront::db::{CourseCatalog, PgStore, ProgressStore, PurgeScope, RepositoryError};
use qacart_storefront::models::Course;
use qacart_storefront::services::{
    CertificateService, CertificateSettings, ProgressService, ServiceError,
};
use sqlx::PgPool;

const LESSONS: u32 = 4;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .unwrap();
    pool
}

fn run_id() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

async fn insert_user(store: &PgStore, user: &UserId) {
    sqlx::query(
        r"
        INSERT INTO storefront.user_account (id, display_name, subscription_status, subscription_active)
        VALUES ($1, 'Test Student', 'premium', TRUE)
        ",
    )
    .bind(user)
    .execute(store.pool())
    .await
    .unwrap();
}

async fn insert_course(store: &PgStore, course: &CourseId) {
    store
        .upsert_course(&Course {
            id: course.clone(),
            name: "API Testing with Postman".to_owned(),
            total_lessons: LESSONS,
            language: Language::En,
        })
        .await
        .unwrap();
}

/// Seed a premium user and a course with IDs unique to this run.
async fn seed(store: &PgStore, tag: &str) -> (UserId, CourseId) {
    let run = run_id();
    let user = UserId::new(format!("{tag}-user-{run}"));
    let course = CourseId::new(format!("{tag}-course-{run}"));

    insert_user(store, &user).await;
    insert_course(store, &course).await;

    (user, course)
}

async fn complete_all(store: &PgStore, user: &UserId, course: &CourseId) {
    let progress = ProgressService::new(store);
    for n in 1..=LESSONS {
        progress
            .record_lesson_complete(
                user,
                course,
                &LessonId::new(format!("l{n}")),
                LESSONS,
                Some(30),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_progress_round_trips_through_postgres() {
    let store = PgStore::new(pool().await);
    let (user, course) = seed(&store, "progress").await;
    let progress = ProgressService::new(&store);

    let first = progress
        .record_lesson_complete(&user, &course, &LessonId::new("l1"), LESSONS, Some(45))
        .await
        .unwrap();
    assert_eq!(first.progress_percentage, 25);

    let again = progress
        .record_lesson_complete(&user, &course, &LessonId::new("l1"), LESSONS, Some(45))
        .await
        .unwrap();
    assert_eq!(again.completed_lessons, first.completed_lessons);
    assert_eq!(again.total_time_spent, 45);

    let stored = progress.get_progress(&user, &course).await.unwrap().unwrap();
    assert_eq!(stored.progress_percentage, 25);
    assert!(stored.lesson_progress.contains_key(&LessonId::new("l1")));

    let removed = progress.purge(&PurgeScope::User(user.clone())).await.unwrap();
    assert_eq!(removed, 1);
    assert!(progress.get_progress(&user, &course).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_concurrent_completions_are_both_kept() {
    let store = PgStore::new(pool().await);
    let (user, course) = seed(&store, "race").await;
    let progress = ProgressService::new(&store);

    let (l1, l2) = (LessonId::new("l1"), LessonId::new("l2"));
    let (a, b) = tokio::join!(
        progress.record_lesson_complete(&user, &course, &l1, LESSONS, None),
        progress.record_lesson_complete(&user, &course, &l2, LESSONS, None),
    );
    a.unwrap();
    b.unwrap();

    let stored = progress.get_progress(&user, &course).await.unwrap().unwrap();
    assert_eq!(stored.completed_lessons.len(), 2);
    assert_eq!(stored.progress_percentage, 50);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_certificate_lifecycle_in_postgres() {
    let store = PgStore::new(pool().await);
    let (user, course) = seed(&store, "certificate").await;
    let settings = CertificateSettings::default();
    let certificates = CertificateService::new(&store, &settings);

    complete_all(&store, &user, &course).await;

    let (first, second) = tokio::join!(
        certificates.issue_certificate(&user, &course, "Omar Khaled"),
        certificates.issue_certificate(&user, &course, "Omar Khaled"),
    );
    let issued = match (first, second) {
        (Ok(cert), Err(_)) | (Err(_), Ok(cert)) => cert,
        other => panic!("expected exactly one issuance, got {other:?}"),
    };

    let fetched = certificates.get_certificate(&user, &course).await.unwrap();
    assert_eq!(fetched.id, issued.id);
    assert_eq!(fetched.verification_code, issued.verification_code);
    assert_eq!(fetched.certificate_number, issued.certificate_number);

    // Renaming the course later does not touch the certificate.
    store
        .upsert_course(&Course {
            id: course.clone(),
            name: "Renamed".to_owned(),
            total_lessons: LESSONS,
            language: Language::En,
        })
        .await
        .unwrap();
    assert_eq!(
        store.find_course(&course).await.unwrap().unwrap().name,
        "Renamed"
    );

    let result = certificates
        .verify_by_code(&issued.verification_code.as_str().to_lowercase())
        .await
        .unwrap();
    assert!(result.is_valid);
    assert_eq!(result.certificate.unwrap().course_name, "API Testing with Postman");

    let revoked = certificates
        .revoke_certificate(&issued.id, Some("duplicate account".to_owned()))
        .await
        .unwrap();
    assert_eq!(revoked.status, CertificateStatus::Revoked);
    assert_eq!(revoked.revocation_reason.as_deref(), Some("duplicate account"));

    let result = certificates
        .verify_by_code(issued.verification_code.as_str())
        .await
        .unwrap();
    assert!(!result.is_valid);

    // The enrollment slot stays taken after revocation.
    let err = certificates
        .issue_certificate(&user, &course, "Omar Khaled")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyIssued));

    let eligibility = certificates.check_eligibility(&user, &course).await.unwrap();
    assert_ne!(
        eligibility.reason,
        Some(IneligibilityReason::CertificateAlreadyIssued)
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_certificate_survives_course_and_user_deletion() {
    let store = PgStore::new(pool().await);
    let (user, course) = seed(&store, "deleted").await;
    let settings = CertificateSettings::default();
    let certificates = CertificateService::new(&store, &settings);

    complete_all(&store, &user, &course).await;
    let issued = certificates
        .issue_certificate(&user, &course, "Layla Nasser")
        .await
        .unwrap();

    sqlx::query("DELETE FROM storefront.course WHERE id = $1")
        .bind(&course)
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("DELETE FROM storefront.user_account WHERE id = $1")
        .bind(&user)
        .execute(store.pool())
        .await
        .unwrap();

    let result = certificates
        .verify_by_code(issued.verification_code.as_str())
        .await
        .unwrap();
    assert!(result.is_valid);
    let view = result.certificate.unwrap();
    assert_eq!(view.course_name, "API Testing with Postman");
    assert_eq!(view.certificate_number, issued.certificate_number.as_str());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_underscore_ids_do_not_share_rows() {
    let store = PgStore::new(pool().await);
    let run = run_id();
    let (owner, owner_course) = (UserId::new(format!("u{run}_k")), CourseId::new(format!("c{run}")));
    let (other, other_course) = (UserId::new(format!("u{run}")), CourseId::new(format!("k_c{run}")));
    for user in [&owner, &other] {
        insert_user(&store, user).await;
    }
    for course in [&owner_course, &other_course] {
        insert_course(&store, course).await;
    }

    ProgressService::new(&store)
        .record_lesson_complete(&owner, &owner_course, &LessonId::new("v1"), LESSONS, None)
        .await
        .unwrap();

    let fresh = UserProgress::new(other.clone(), other_course.clone(), LESSONS, chrono::Utc::now());
    let err = ProgressStore::create_if_absent(&store, &fresh).await.unwrap_err();
    assert!(matches!(err, RepositoryError::KeyCollision(_)));

    let err = ProgressService::new(&store)
        .record_lesson_complete(&other, &other_course, &LessonId::new("x1"), LESSONS, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EnrollmentConflict(_)));

    let owned = ProgressService::new(&store)
        .get_progress(&owner, &owner_course)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owned.completed_lessons, vec![LessonId::new("v1")]);
}
