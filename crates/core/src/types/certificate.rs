//! Course completion certificates.

use core::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CertificateId, CourseId, UserId};
use super::status::{CertificateStatus, Language};
use super::student_name::StudentName;

/// Characters used in verification codes and certificate numbers.
///
/// Excludes `0`/`O`, `1`/`I`/`L` so codes can be read off paper and typed.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Errors that can occur when parsing a [`VerificationCode`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCodeError {
    /// Wrong number of characters (or absurdly long input).
    #[error("verification code must be {expected} characters")]
    InvalidLength {
        /// Required length.
        expected: usize,
    },
    /// A character outside the code alphabet.
    #[error("verification code contains an invalid character")]
    InvalidCharacter,
}

/// Public lookup code printed on a certificate.
///
/// Ten characters from [`CODE_ALPHABET`] (~49 bits), case-insensitive on input.
///
/// ```
/// use qacart_core::VerificationCode;
///
/// let code = VerificationCode::parse(" abcd2345xy ").unwrap();
/// assert_eq!(code.as_str(), "ABCD2345XY");
///
/// assert!(VerificationCode::parse("ABCD").is_err());        // too short
/// assert!(VerificationCode::parse("ABCD2345X0").is_err());  // '0' is not in the alphabet
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Number of characters in a code.
    pub const LENGTH: usize = 10;

    /// Inputs longer than this are rejected before any character is inspected.
    pub const MAX_INPUT_BYTES: usize = 64;

    /// Parse and normalise a user-supplied code.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not exactly
    /// [`LENGTH`](Self::LENGTH) characters from [`CODE_ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, VerificationCodeError> {
        let invalid_length = VerificationCodeError::InvalidLength {
            expected: Self::LENGTH,
        };

        if s.len() > Self::MAX_INPUT_BYTES {
            return Err(invalid_length);
        }

        let trimmed = s.trim();
        if trimmed.len() != Self::LENGTH {
            return Err(invalid_length);
        }

        let normalised = trimmed.to_ascii_uppercase();
        if !normalised.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            return Err(VerificationCodeError::InvalidCharacter);
        }

        Ok(Self(normalised))
    }

    /// Build a code from a source of random indices.
    ///
    /// `pick(n)` must return a uniformly random index in `0..n`.
    #[must_use]
    pub fn generate_with(pick: impl FnMut(usize) -> usize) -> Self {
        Self(random_chars(Self::LENGTH, pick))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-facing certificate number, e.g. `QAC-2026-7KQ2M9XD`.
///
/// The format is cosmetic; the only contract is global uniqueness, which the
/// store enforces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateNumber(String);

impl CertificateNumber {
    const PREFIX: &'static str = "QAC";
    const SUFFIX_LENGTH: usize = 8;

    /// Build a number for a certificate issued at `issued_at`.
    #[must_use]
    pub fn generate_with(issued_at: DateTime<Utc>, pick: impl FnMut(usize) -> usize) -> Self {
        let suffix = random_chars(Self::SUFFIX_LENGTH, pick);
        Self(format!("{}-{}-{suffix}", Self::PREFIX, issued_at.year()))
    }

    /// Wrap a number read back from storage.
    #[must_use]
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn random_chars(len: usize, mut pick: impl FnMut(usize) -> usize) -> String {
    (0..len)
        .filter_map(|_| CODE_ALPHABET.get(pick(CODE_ALPHABET.len()) % CODE_ALPHABET.len()))
        .map(|&b| char::from(b))
        .collect()
}

/// An issued course certificate.
///
/// Once issued, `verification_code` and `certificate_number` never change.
/// Revocation flips `status` and stamps `revoked_at`; nothing is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: CertificateId,
    pub certificate_number: CertificateNumber,
    pub verification_code: VerificationCode,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// Name as entered by the student at claim time.
    pub student_name: StudentName,
    /// Course name as it was when the certificate was issued.
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
    pub status: CertificateStatus,
    pub language: Language,
    pub issuer_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl Certificate {
    /// Whether the certificate currently verifies.
    #[must_use]
    pub fn is_issued(&self) -> bool {
        self.status == CertificateStatus::Issued
    }

    /// Whether this certificate was issued for `user_id` in `course_id`.
    #[must_use]
    pub fn belongs_to(&self, user_id: &UserId, course_id: &CourseId) -> bool {
        &self.user_id == user_id && &self.course_id == course_id
    }

    /// The fields safe to show to anyone holding the verification code.
    #[must_use]
    pub fn public_view(&self) -> CertificatePublicView {
        CertificatePublicView {
            student_name: self.student_name.as_str().to_owned(),
            course_name: self.course_name.clone(),
            issued_at: self.issued_at,
            certificate_number: self.certificate_number.as_str().to_owned(),
        }
    }
}

/// Public subset of a certificate returned by verification.
///
/// Deliberately omits user, course and certificate IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePublicView {
    pub student_name: String,
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
    pub certificate_number: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn counter() -> impl FnMut(usize) -> usize {
        let mut next = 0;
        move |n| {
            next += 7;
            next % n
        }
    }

    fn sample(status: CertificateStatus) -> Certificate {
        let user = UserId::new("user-1");
        let course = CourseId::new("course-1");
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        Certificate {
            id: CertificateId::for_enrollment(&user, &course),
            certificate_number: CertificateNumber::generate_with(issued_at, counter()),
            verification_code: VerificationCode::generate_with(counter()),
            user_id: user,
            course_id: course,
            student_name: StudentName::parse("Ada Lovelace").unwrap(),
            course_name: "Playwright with TypeScript".to_owned(),
            issued_at,
            status,
            language: Language::En,
            issuer_signature: "QAcart Academy".to_owned(),
            revoked_at: None,
            revocation_reason: None,
        }
    }

    #[test]
    fn test_code_alphabet_has_no_ambiguous_characters() {
        for ambiguous in b"01OIL" {
            assert!(!CODE_ALPHABET.contains(ambiguous));
        }
    }

    #[test]
    fn test_generated_code_parses() {
        let code = VerificationCode::generate_with(counter());
        assert_eq!(code.as_str().len(), VerificationCode::LENGTH);
        assert_eq!(VerificationCode::parse(code.as_str()).unwrap(), code);
    }

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let code = VerificationCode::parse("  abcd2345xy\n").unwrap();
        assert_eq!(code.as_str(), "ABCD2345XY");
    }

    #[test]
    fn test_parse_rejects_bad_lengths() {
        assert!(matches!(
            VerificationCode::parse(""),
            Err(VerificationCodeError::InvalidLength { expected: 10 })
        ));
        assert!(matches!(
            VerificationCode::parse("ABCD2345XYZ"),
            Err(VerificationCodeError::InvalidLength { .. })
        ));
        assert!(matches!(
            VerificationCode::parse(&"A".repeat(10_000)),
            Err(VerificationCodeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_characters() {
        assert_eq!(
            VerificationCode::parse("ABCD2345X0"),
            Err(VerificationCodeError::InvalidCharacter)
        );
        assert_eq!(
            VerificationCode::parse("ABC' OR 1="),
            Err(VerificationCodeError::InvalidCharacter)
        );
        // Multi-byte characters change the byte length.
        assert!(VerificationCode::parse("ABCD2345Xé").is_err());
    }

    #[test]
    fn test_certificate_number_format() {
        let issued_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let number = CertificateNumber::generate_with(issued_at, counter());
        let parts: Vec<&str> = number.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "QAC");
        assert_eq!(parts[1], "2026");
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_public_view_omits_identifiers() {
        let certificate = sample(CertificateStatus::Issued);
        let json = serde_json::to_value(certificate.public_view()).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(json["studentName"], "Ada Lovelace");
        assert_eq!(json["courseName"], "Playwright with TypeScript");
        assert!(object.get("userId").is_none());
        assert!(object.get("id").is_none());
    }

    #[test]
    fn test_is_issued() {
        assert!(sample(CertificateStatus::Issued).is_issued());
        assert!(!sample(CertificateStatus::Revoked).is_issued());
    }
}
