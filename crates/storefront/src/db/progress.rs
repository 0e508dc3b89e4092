//! `PostgreSQL` storage for user progress records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;

use qacart_core::{
    CourseId, LessonId, LessonProgress, ProgressKey, ProgressPatch, UserId, UserProgress,
};

use super::{PgStore, ProgressStore, PurgeScope, RepositoryError, from_db, to_db};

const SELECT_PROGRESS: &str = r"
    SELECT id, user_id, course_id, completed_lessons, total_lessons,
           progress_percentage, lesson_progress, is_completed, completed_at,
           created_at, updated_at, last_accessed, session_count,
           total_time_spent, revision
    FROM storefront.user_progress
";

#[derive(sqlx::FromRow)]
struct ProgressRow {
    #[allow(dead_code)]
    id: String,
    user_id: UserId,
    course_id: CourseId,
    completed_lessons: Vec<String>,
    total_lessons: i32,
    progress_percentage: i16,
    lesson_progress: Json<BTreeMap<LessonId, LessonProgress>>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    session_count: i32,
    total_time_spent: i64,
    revision: i64,
}

impl TryFrom<ProgressRow> for UserProgress {
    type Error = RepositoryError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            course_id: row.course_id,
            completed_lessons: row
                .completed_lessons
                .into_iter()
                .map(LessonId::new)
                .collect(),
            total_lessons: from_db(row.total_lessons, "total_lessons")?,
            progress_percentage: from_db(row.progress_percentage, "progress_percentage")?,
            lesson_progress: row.lesson_progress.0,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_accessed: row.last_accessed,
            session_count: from_db(row.session_count, "session_count")?,
            total_time_spent: from_db(row.total_time_spent, "total_time_spent")?,
            revision: from_db(row.revision, "revision")?,
        })
    }
}

/// Column values of a progress record, converted for binding.
struct ProgressColumns {
    completed_lessons: Vec<String>,
    total_lessons: i32,
    progress_percentage: i16,
    session_count: i32,
    total_time_spent: i64,
    revision: i64,
}

impl ProgressColumns {
    fn from_progress(progress: &UserProgress) -> Result<Self, RepositoryError> {
        Ok(Self {
            completed_lessons: progress
                .completed_lessons
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
            total_lessons: to_db(progress.total_lessons, "total_lessons")?,
            progress_percentage: i16::from(progress.progress_percentage),
            session_count: to_db(progress.session_count, "session_count")?,
            total_time_spent: to_db(progress.total_time_spent, "total_time_spent")?,
            revision: to_db(progress.revision, "revision")?,
        })
    }
}

impl PgStore {
    async fn fetch_progress(
        &self,
        key: &ProgressKey,
    ) -> Result<Option<UserProgress>, RepositoryError> {
        let row: Option<ProgressRow> = sqlx::query_as(&format!("{SELECT_PROGRESS} WHERE id = $1"))
            .bind(key.as_str())
            .fetch_optional(self.pool())
            .await?;

        row.map(UserProgress::try_from).transpose()
    }
}

impl ProgressStore for PgStore {
    async fn get(&self, key: &ProgressKey) -> Result<Option<UserProgress>, RepositoryError> {
        self.fetch_progress(key).await
    }

    async fn create_if_absent(
        &self,
        progress: &UserProgress,
    ) -> Result<UserProgress, RepositoryError> {
        let key = progress.key();
        let columns = ProgressColumns::from_progress(progress)?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_progress (
                id, user_id, course_id, completed_lessons, total_lessons,
                progress_percentage, lesson_progress, is_completed, completed_at,
                created_at, updated_at, last_accessed, session_count,
                total_time_spent, revision
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(key.as_str())
        .bind(&progress.user_id)
        .bind(&progress.course_id)
        .bind(&columns.completed_lessons)
        .bind(columns.total_lessons)
        .bind(columns.progress_percentage)
        .bind(Json(&progress.lesson_progress))
        .bind(progress.is_completed)
        .bind(progress.completed_at)
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .bind(progress.last_accessed)
        .bind(columns.session_count)
        .bind(columns.total_time_spent)
        .bind(columns.revision)
        .execute(self.pool())
        .await?;

        // Either our row or the one a concurrent writer created first.
        let stored = self
            .fetch_progress(&key)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if !stored.belongs_to(&progress.user_id, &progress.course_id) {
            return Err(RepositoryError::KeyCollision(key.as_str().to_owned()));
        }
        Ok(stored)
    }

    async fn replace_if_revision(
        &self,
        progress: &UserProgress,
        expected_revision: u64,
    ) -> Result<bool, RepositoryError> {
        let columns = ProgressColumns::from_progress(progress)?;
        let expected: i64 = to_db(expected_revision, "revision")?;

        let result = sqlx::query(
            r"
            UPDATE storefront.user_progress
            SET completed_lessons = $3,
                progress_percentage = $4,
                lesson_progress = $5,
                is_completed = $6,
                completed_at = $7,
                updated_at = $8,
                last_accessed = $9,
                session_count = $10,
                total_time_spent = $11,
                revision = $12
            WHERE id = $1 AND revision = $2
            ",
        )
        .bind(progress.key().as_str())
        .bind(expected)
        .bind(&columns.completed_lessons)
        .bind(columns.progress_percentage)
        .bind(Json(&progress.lesson_progress))
        .bind(progress.is_completed)
        .bind(progress.completed_at)
        .bind(progress.updated_at)
        .bind(progress.last_accessed)
        .bind(columns.session_count)
        .bind(columns.total_time_spent)
        .bind(columns.revision)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply_patch(
        &self,
        key: &ProgressKey,
        patch: ProgressPatch,
    ) -> Result<bool, RepositoryError> {
        let (write_accessed, last_accessed) = patch.last_accessed.into_write();
        let (write_updated, updated_at) = patch.updated_at.into_write();

        // Required columns ignore a removal, hence the COALESCE.
        let result = sqlx::query(
            r"
            UPDATE storefront.user_progress
            SET last_accessed = CASE WHEN $2 THEN COALESCE($3, last_accessed) ELSE last_accessed END,
                updated_at = CASE WHEN $4 THEN COALESCE($5, updated_at) ELSE updated_at END,
                revision = revision + 1
            WHERE id = $1
            ",
        )
        .bind(key.as_str())
        .bind(write_accessed)
        .bind(last_accessed)
        .bind(write_updated)
        .bind(updated_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn purge(&self, scope: &PurgeScope) -> Result<u64, RepositoryError> {
        let result = match scope {
            PurgeScope::User(user_id) => {
                sqlx::query("DELETE FROM storefront.user_progress WHERE user_id = $1")
                    .bind(user_id)
                    .execute(self.pool())
                    .await?
            }
            PurgeScope::Course(course_id) => {
                sqlx::query("DELETE FROM storefront.user_progress WHERE course_id = $1")
                    .bind(course_id)
                    .execute(self.pool())
                    .await?
            }
        };

        Ok(result.rows_affected())
    }
}
