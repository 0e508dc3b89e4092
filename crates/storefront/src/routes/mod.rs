//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Progress (requires auth)
//! GET  /api/courses/{course_id}/progress                      - Current progress or null
//! POST /api/courses/{course_id}/access                        - Start or resume a course
//! POST /api/courses/{course_id}/view                          - Bump last accessed (204)
//! POST /api/courses/{course_id}/lessons/{lesson_id}/complete  - Complete a lesson
//!
//! # Certificates (requires auth)
//! GET  /api/courses/{course_id}/certificate/eligibility       - Eligibility verdict
//! GET  /api/courses/{course_id}/certificate                   - Issued certificate
//! POST /api/courses/{course_id}/certificate                   - Claim certificate
//!
//! # Public
//! GET  /api/certificates/verify/{code}                        - Verify by code
//! ```

pub mod certificates;
pub mod health;
pub mod progress;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, verify_rate_limiter};
use crate::state::AppState;

/// Create the signed-in course API router.
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses/{course_id}/progress", get(progress::show))
        .route("/api/courses/{course_id}/access", post(progress::access))
        .route("/api/courses/{course_id}/view", post(progress::view))
        .route(
            "/api/courses/{course_id}/lessons/{lesson_id}/complete",
            post(progress::complete_lesson),
        )
        .route(
            "/api/courses/{course_id}/certificate/eligibility",
            get(certificates::eligibility),
        )
        .route(
            "/api/courses/{course_id}/certificate",
            get(certificates::show).post(certificates::claim),
        )
        .route_layer(api_rate_limiter())
}

/// Create the public verification router.
pub fn verify_routes() -> Router<AppState> {
    Router::new()
        .route("/api/certificates/verify/{code}", get(certificates::verify))
        .route_layer(verify_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(course_routes())
        .merge(verify_routes())
}
