//! `PostgreSQL` storage for certificates.

use chrono::{DateTime, Utc};

use qacart_core::{
    Certificate, CertificateId, CertificateNumber, CertificatePatch, CertificateStatus, CourseId,
    Language, StudentName, UserId, VerificationCode,
};

use super::{CertificateStore, CreateOutcome, PgStore, RepositoryError, map_insert_error};

const CERTIFICATE_COLUMNS: &str = r"
    id, certificate_number, verification_code, user_id, course_id,
    student_name, course_name, issued_at, status, language,
    issuer_signature, revoked_at, revocation_reason
";

#[derive(sqlx::FromRow)]
struct CertificateRow {
    id: CertificateId,
    certificate_number: String,
    verification_code: String,
    user_id: UserId,
    course_id: CourseId,
    student_name: String,
    course_name: String,
    issued_at: DateTime<Utc>,
    status: CertificateStatus,
    language: Language,
    issuer_signature: String,
    revoked_at: Option<DateTime<Utc>>,
    revocation_reason: Option<String>,
}

impl TryFrom<CertificateRow> for Certificate {
    type Error = RepositoryError;

    fn try_from(row: CertificateRow) -> Result<Self, Self::Error> {
        let verification_code = VerificationCode::parse(&row.verification_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid verification code in database: {e}"))
        })?;
        let student_name = StudentName::parse(&row.student_name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid student name in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            certificate_number: CertificateNumber::from_stored(row.certificate_number),
            verification_code,
            user_id: row.user_id,
            course_id: row.course_id,
            student_name,
            course_name: row.course_name,
            issued_at: row.issued_at,
            status: row.status,
            language: row.language,
            issuer_signature: row.issuer_signature,
            revoked_at: row.revoked_at,
            revocation_reason: row.revocation_reason,
        })
    }
}

fn into_certificate(row: Option<CertificateRow>) -> Result<Option<Certificate>, RepositoryError> {
    row.map(Certificate::try_from).transpose()
}

impl CertificateStore for PgStore {
    async fn find_by_id(&self, id: &CertificateId) -> Result<Option<Certificate>, RepositoryError> {
        let row: Option<CertificateRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM storefront.certificate WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        into_certificate(row)
    }

    async fn find_by_enrollment(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let row: Option<CertificateRow> = sqlx::query_as(&format!(
            r"
            SELECT {CERTIFICATE_COLUMNS}
            FROM storefront.certificate
            WHERE user_id = $1 AND course_id = $2 AND status = $3
            LIMIT 1
            "
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(CertificateStatus::Issued)
        .fetch_optional(self.pool())
        .await?;

        into_certificate(row)
    }

    async fn find_by_verification_code(
        &self,
        code: &VerificationCode,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let row: Option<CertificateRow> = sqlx::query_as(&format!(
            r"
            SELECT {CERTIFICATE_COLUMNS}
            FROM storefront.certificate
            WHERE verification_code = $1 AND status = $2
            "
        ))
        .bind(code.as_str())
        .bind(CertificateStatus::Issued)
        .fetch_optional(self.pool())
        .await?;

        into_certificate(row)
    }

    async fn create_if_absent(
        &self,
        certificate: &Certificate,
    ) -> Result<CreateOutcome, RepositoryError> {
        // ON CONFLICT only covers the ID; code and number collisions still raise.
        let result = sqlx::query(&format!(
            r"
            INSERT INTO storefront.certificate ({CERTIFICATE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "
        ))
        .bind(&certificate.id)
        .bind(certificate.certificate_number.as_str())
        .bind(certificate.verification_code.as_str())
        .bind(&certificate.user_id)
        .bind(&certificate.course_id)
        .bind(certificate.student_name.as_str())
        .bind(&certificate.course_name)
        .bind(certificate.issued_at)
        .bind(certificate.status)
        .bind(certificate.language)
        .bind(&certificate.issuer_signature)
        .bind(certificate.revoked_at)
        .bind(&certificate.revocation_reason)
        .execute(self.pool())
        .await
        .map_err(map_insert_error)?;

        if result.rows_affected() == 1 {
            return Ok(CreateOutcome::Created);
        }

        match self.find_by_id(&certificate.id).await? {
            Some(existing) if !existing.belongs_to(&certificate.user_id, &certificate.course_id) => {
                Err(RepositoryError::KeyCollision(certificate.id.to_string()))
            }
            _ => Ok(CreateOutcome::AlreadyExists),
        }
    }

    async fn apply_patch(
        &self,
        id: &CertificateId,
        patch: CertificatePatch,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let (write_status, status) = patch.status.into_write();
        let (write_revoked_at, revoked_at) = patch.revoked_at.into_write();
        let (write_reason, reason) = patch.revocation_reason.into_write();

        let row: Option<CertificateRow> = sqlx::query_as(&format!(
            r"
            UPDATE storefront.certificate
            SET status = CASE WHEN $2 THEN COALESCE($3, status) ELSE status END,
                revoked_at = CASE WHEN $4 THEN $5 ELSE revoked_at END,
                revocation_reason = CASE WHEN $6 THEN $7 ELSE revocation_reason END
            WHERE id = $1
            RETURNING {CERTIFICATE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(write_status)
        .bind(status)
        .bind(write_revoked_at)
        .bind(revoked_at)
        .bind(write_reason)
        .bind(reason)
        .fetch_optional(self.pool())
        .await?;

        into_certificate(row)
    }
}
