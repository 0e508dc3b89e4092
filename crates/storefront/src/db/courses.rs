//! Read access to the course catalog projection, plus the upsert used by seeding.

use qacart_core::{CourseId, Language};

use super::{CourseCatalog, PgStore, RepositoryError, from_db, to_db};
use crate::models::Course;

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: CourseId,
    name: String,
    total_lessons: i32,
    language: Language,
}

impl TryFrom<CourseRow> for Course {
    type Error = RepositoryError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            total_lessons: from_db(row.total_lessons, "total_lessons")?,
            language: row.language,
        })
    }
}

impl CourseCatalog for PgStore {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, RepositoryError> {
        let row: Option<CourseRow> = sqlx::query_as(
            r"
            SELECT id, name, total_lessons, language
            FROM storefront.course
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Course::try_from).transpose()
    }
}

impl PgStore {
    /// Insert or update a catalog entry.
    ///
    /// Existing progress records keep the lesson count they were created with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_course(&self, course: &Course) -> Result<(), RepositoryError> {
        let total_lessons: i32 = to_db(course.total_lessons, "total_lessons")?;

        sqlx::query(
            r"
            INSERT INTO storefront.course (id, name, total_lessons, language)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                total_lessons = EXCLUDED.total_lessons,
                language = EXCLUDED.language
            ",
        )
        .bind(&course.id)
        .bind(&course.name)
        .bind(total_lessons)
        .bind(course.language)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
