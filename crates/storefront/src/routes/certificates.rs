//! Certificate route handlers.
//!
//! Claiming and reading certificates requires a signed-in student.
//! Verification is public and rate limited per client IP.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use qacart_core::{Certificate, CourseId, Eligibility};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::VerificationResult;
use crate::state::AppState;

/// Body of a certificate claim.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCertificateRequest {
    /// Name to print on the certificate.
    pub student_name: String,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn eligibility(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Eligibility>> {
    let eligibility = state
        .certificates()
        .check_eligibility(&user.id, &course_id)
        .await?;
    Ok(Json(eligibility))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
) -> Result<Json<Certificate>> {
    let certificate = state
        .certificates()
        .get_certificate(&user.id, &course_id)
        .await?;
    Ok(Json(certificate))
}

/// Claim the certificate for a completed course.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn claim(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<CourseId>,
    Json(body): Json<ClaimCertificateRequest>,
) -> Result<(StatusCode, Json<Certificate>)> {
    add_breadcrumb(
        "certificate",
        "Claim submitted",
        Some(&[("course_id", course_id.as_str())]),
    );

    let certificate = state
        .certificates()
        .issue_certificate(&user.id, &course_id, &body.student_name)
        .await?;

    Ok((StatusCode::CREATED, Json(certificate)))
}

/// Public verification by code.
///
/// Malformed, unknown and revoked codes all get the same answer.
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<VerificationResult>> {
    let result = state.certificates().verify_by_code(&code).await?;
    Ok(Json(result))
}
