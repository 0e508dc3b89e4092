//! Student name type printed on certificates.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StudentName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StudentNameError {
    /// The input is empty after trimming.
    #[error("student name cannot be empty")]
    Empty,
    /// The input is shorter than the minimum length.
    #[error("student name must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than the maximum length.
    #[error("student name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains digits, punctuation or other disallowed characters.
    #[error("student name may only contain Arabic or Latin letters and spaces")]
    InvalidCharacter,
}

/// The name a student wants printed on their certificate.
///
/// This is the single validation routine for certificate names. Route handlers
/// may call it early to give faster feedback, but the certificate issuer always
/// runs it again before anything is written.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 2-100 characters (Unicode scalar values)
/// - Only Latin letters (`a-z`, `A-Z`), Arabic letters (including harakat and
///   tatweel) and the space character
///
/// ## Examples
///
/// ```
/// use qacart_core::StudentName;
///
/// assert!(StudentName::parse("Ada Lovelace").is_ok());
/// assert!(StudentName::parse("  محمد علي  ").is_ok());
///
/// assert!(StudentName::parse("").is_err());          // empty
/// assert!(StudentName::parse("A").is_err());         // too short
/// assert!(StudentName::parse("R2-D2").is_err());     // digits and punctuation
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StudentName(String);

impl StudentName {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 2;

    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 100;

    /// Parse a `StudentName` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input:
    /// - Is empty
    /// - Is shorter than 2 or longer than 100 characters
    /// - Contains anything other than Arabic/Latin letters and spaces
    pub fn parse(s: &str) -> Result<Self, StudentNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(StudentNameError::Empty);
        }

        let len = trimmed.chars().count();
        if len < Self::MIN_LENGTH {
            return Err(StudentNameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(StudentNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !trimmed.chars().all(is_allowed_char) {
            return Err(StudentNameError::InvalidCharacter);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `StudentName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Latin letters, Arabic letters and marks, and the plain space.
///
/// Arabic punctuation (`،`, `؛`, `؟`) and Arabic-Indic digits sit inside the
/// Arabic block and are deliberately outside these ranges.
const fn is_allowed_char(c: char) -> bool {
    matches!(c,
        ' '
        | 'a'..='z'
        | 'A'..='Z'
        // hamza through yeh, including tatweel
        | '\u{0621}'..='\u{064A}'
        // harakat, tanween, shadda, sukun and other combining marks
        | '\u{064B}'..='\u{065F}'
        // superscript alef
        | '\u{0670}'
        // extended letters (Persian/Urdu forms commonly typed on Arabic keyboards)
        | '\u{0671}'..='\u{06D3}'
        | '\u{06D5}'
    )
}

impl fmt::Display for StudentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StudentName {
    type Err = StudentNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for StudentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latin_names() {
        assert!(StudentName::parse("Ada Lovelace").is_ok());
        assert!(StudentName::parse("Jo").is_ok());
        assert!(StudentName::parse("Grace Brewster Murray Hopper").is_ok());
    }

    #[test]
    fn test_parse_arabic_names() {
        assert!(StudentName::parse("محمد").is_ok());
        assert!(StudentName::parse("عبد الرحمن").is_ok());
        assert!(StudentName::parse("مُحَمَّد").is_ok());
    }

    #[test]
    fn test_parse_mixed_script() {
        assert!(StudentName::parse("Ahmad أحمد").is_ok());
    }

    #[test]
    fn test_parse_trims() {
        let name = StudentName::parse("   Ada Lovelace \t").unwrap();
        assert_eq!(name.as_str(), "Ada Lovelace");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(StudentName::parse(""), Err(StudentNameError::Empty));
        assert_eq!(StudentName::parse("    "), Err(StudentNameError::Empty));
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            StudentName::parse(" A "),
            Err(StudentNameError::TooShort { min: 2 })
        ));
        assert!(matches!(
            StudentName::parse("م"),
            Err(StudentNameError::TooShort { .. })
        ));
    }

    #[test]
    fn test_parse_length_counts_characters_not_bytes() {
        // 100 Arabic letters are 200 bytes but still within the limit.
        let name = "م".repeat(100);
        assert!(StudentName::parse(&name).is_ok());

        let name = "م".repeat(101);
        assert!(matches!(
            StudentName::parse(&name),
            Err(StudentNameError::TooLong { max: 100 })
        ));
    }

    #[test]
    fn test_parse_rejects_digits_and_punctuation() {
        for input in [
            "R2 D2",
            "O'Brien",
            "Smith-Jones",
            "Ada.",
            "محمد٣",
            "من؟",
            "علي، حسن",
            "<script>",
        ] {
            assert_eq!(
                StudentName::parse(input),
                Err(StudentNameError::InvalidCharacter),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_other_whitespace_inside() {
        assert_eq!(
            StudentName::parse("Ada\tLovelace"),
            Err(StudentNameError::InvalidCharacter)
        );
        assert_eq!(
            StudentName::parse("Ada\nLovelace"),
            Err(StudentNameError::InvalidCharacter)
        );
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            StudentNameError::InvalidCharacter.to_string(),
            "student name may only contain Arabic or Latin letters and spaces"
        );
        assert_eq!(
            StudentNameError::TooLong { max: 100 }.to_string(),
            "student name must be at most 100 characters"
        );
    }
}
