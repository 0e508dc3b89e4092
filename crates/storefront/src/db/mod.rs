//! Storage for progress records and certificates.
//!
//! # Database: `qacart_storefront`
//!
//! ## Tables (schema `storefront`)
//!
//! - `user_account` - Read-only projection of identity/billing user records
//! - `course` - Read-only projection of the course catalog
//! - `user_progress` - One row per user x course, keyed `{userId}_{courseId}`
//! - `certificate` - Issued certificates, keyed by the same deterministic ID,
//!   unique on `verification_code` and `certificate_number`
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Adapters
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx, used in production
//! - [`MemoryStore`] - In-process maps with the same semantics, used by tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p qacart-cli -- migrate
//! ```

pub mod certificates;
pub mod courses;
pub mod memory;
pub mod progress;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use qacart_core::{
    Certificate, CertificateId, CertificatePatch, CourseId, ProgressKey, ProgressPatch, UserId,
    UserProgress, VerificationCode,
};

use crate::models::{Course, UserAccount};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique verification code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The storage key is already held by a different (user, course) pair.
    #[error("key {0} is held by another enrollment")]
    KeyCollision(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a create-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was written.
    Created,
    /// A record with the same key already existed; nothing was written.
    AlreadyExists,
}

/// Which progress records a purge removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeScope {
    /// Every record belonging to a deleted user account.
    User(UserId),
    /// Every record for a deleted course.
    Course(CourseId),
}

/// Storage for [`UserProgress`] records.
pub trait ProgressStore: Send + Sync {
    /// Fetch the record for `key`, if any.
    fn get(
        &self,
        key: &ProgressKey,
    ) -> impl Future<Output = Result<Option<UserProgress>, RepositoryError>> + Send;

    /// Insert `progress` unless a record with the same key exists, then return
    /// whichever record is stored.
    fn create_if_absent(
        &self,
        progress: &UserProgress,
    ) -> impl Future<Output = Result<UserProgress, RepositoryError>> + Send;

    /// Overwrite the stored record only if its revision is still
    /// `expected_revision`. Returns `false` when another writer got there first.
    fn replace_if_revision(
        &self,
        progress: &UserProgress,
        expected_revision: u64,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Apply a partial update. Returns `false` if the record does not exist.
    fn apply_patch(
        &self,
        key: &ProgressKey,
        patch: ProgressPatch,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every record in `scope`, returning how many were removed.
    fn purge(&self, scope: &PurgeScope)
    -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Storage for [`Certificate`] records.
pub trait CertificateStore: Send + Sync {
    /// Fetch a certificate by its deterministic ID, whatever its status.
    fn find_by_id(
        &self,
        id: &CertificateId,
    ) -> impl Future<Output = Result<Option<Certificate>, RepositoryError>> + Send;

    /// Find the issued (non-revoked) certificate for a user's enrollment.
    fn find_by_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> impl Future<Output = Result<Option<Certificate>, RepositoryError>> + Send;

    /// Find the issued (non-revoked) certificate carrying `code`.
    fn find_by_verification_code(
        &self,
        code: &VerificationCode,
    ) -> impl Future<Output = Result<Option<Certificate>, RepositoryError>> + Send;

    /// Insert `certificate` unless its ID is already taken.
    ///
    /// A collision on the verification code or certificate number is reported
    /// as [`RepositoryError::Conflict`] so the caller can regenerate them.
    fn create_if_absent(
        &self,
        certificate: &Certificate,
    ) -> impl Future<Output = Result<CreateOutcome, RepositoryError>> + Send;

    /// Apply a partial update, returning the updated certificate if it exists.
    fn apply_patch(
        &self,
        id: &CertificateId,
        patch: CertificatePatch,
    ) -> impl Future<Output = Result<Option<Certificate>, RepositoryError>> + Send;
}

/// Read-only access to user accounts.
pub trait UserDirectory: Send + Sync {
    /// Fetch a user account.
    fn find_user(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<UserAccount>, RepositoryError>> + Send;
}

/// Read-only access to the course catalog.
pub trait CourseCatalog: Send + Sync {
    /// Fetch a course.
    fn find_course(
        &self,
        id: &CourseId,
    ) -> impl Future<Output = Result<Option<Course>, RepositoryError>> + Send;
}

/// `PostgreSQL`-backed store implementing every storage trait.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error from an insert, turning unique violations into `Conflict`.
fn map_insert_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or("unique").to_owned();
        return RepositoryError::Conflict(constraint);
    }
    RepositoryError::Database(e)
}

/// Convert a stored integer into its domain type.
fn from_db<T, U>(value: T, field: &str) -> Result<U, RepositoryError>
where
    U: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    U::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{field} out of range: {value}")))
}

/// Convert a domain integer into its column type.
fn to_db<T, U>(value: T, field: &str) -> Result<U, RepositoryError>
where
    U: TryFrom<T>,
    T: Copy + std::fmt::Display,
{
    U::try_from(value).map_err(|_| {
        RepositoryError::DataCorruption(format!("{field} does not fit its column: {value}"))
    })
}
