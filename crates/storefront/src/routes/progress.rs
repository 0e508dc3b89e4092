//! Course progress route handlers.
//!
//! The course player calls these as the student moves through a course.
//! Lesson counts always come from the catalog at request time.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use qacart_core::{CourseId, LessonId, UserProgress};

use crate::db::CourseCatalog;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Course;
use crate::state::AppState;

/// Optional body of a lesson completion.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonRequest {
    /// Seconds spent on the lesson, as measured by the player.
    pub time_spent: Option<u32>,
}

async fn load_course(state: &AppState, course_id: &CourseId) -> Result<Course> {
    state
        .store()
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".to_owned()))
}

/// Current progress, or `null` when the student never started the course.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Option<UserProgress>>> {
    let progress = state.progress().get_progress(&user.id, &course_id).await?;
    Ok(Json(progress))
}

/// Student opened the course: create the record if needed and touch it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn access(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<UserProgress>> {
    let course = load_course(&state, &course_id).await?;
    let progress = state
        .progress()
        .start_course(&user.id, &course.id, course.total_lessons)
        .await?;
    Ok(Json(progress))
}

/// Best-effort "last accessed" bump. Never fails the request.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn view(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
) -> StatusCode {
    state
        .progress()
        .touch_last_accessed(&user.id, &course_id)
        .await;
    StatusCode::NO_CONTENT
}

/// Mark a lesson complete.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn complete_lesson(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((course_id, lesson_id)): Path<(CourseId, LessonId)>,
    body: Option<Json<CompleteLessonRequest>>,
) -> Result<Json<UserProgress>> {
    let Json(request) = body.unwrap_or_default();
    let course = load_course(&state, &course_id).await?;

    let progress = state
        .progress()
        .record_lesson_complete(
            &user.id,
            &course.id,
            &lesson_id,
            course.total_lessons,
            request.time_spent,
        )
        .await?;

    Ok(Json(progress))
}
