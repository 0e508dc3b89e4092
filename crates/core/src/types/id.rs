//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. IDs are opaque strings
//! issued by the identity provider and the course catalog.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use qacart_core::define_id;
/// define_id!(UserId);
/// define_id!(CourseId);
///
/// let user_id = UserId::new("u1");
/// let course_id = CourseId::new("u1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = course_id;
/// # assert_eq!(user_id.as_str(), course_id.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(CourseId);
define_id!(LessonId);
define_id!(CertificateId);

impl CertificateId {
    /// Derive the certificate ID for a user's enrollment in a course.
    ///
    /// The ID is deterministic so that the store's create-if-absent write on this
    /// key is what guarantees a single certificate per enrollment.
    #[must_use]
    pub fn for_enrollment(user_id: &UserId, course_id: &CourseId) -> Self {
        Self(enrollment_key(user_id, course_id))
    }
}

/// Storage key of a progress record: `{userId}_{courseId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressKey(String);

impl ProgressKey {
    /// Build the key for a user-course pair.
    #[must_use]
    pub fn new(user_id: &UserId, course_id: &CourseId) -> Self {
        Self(enrollment_key(user_id, course_id))
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn enrollment_key(user_id: &UserId, course_id: &CourseId) -> String {
    format!("{user_id}_{course_id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_key_format() {
        let key = ProgressKey::new(&UserId::new("user-1"), &CourseId::new("playwright"));
        assert_eq!(key.as_str(), "user-1_playwright");
        assert_eq!(key.to_string(), "user-1_playwright");
    }

    #[test]
    fn test_certificate_id_is_deterministic() {
        let user = UserId::new("abc");
        let course = CourseId::new("cypress");
        assert_eq!(
            CertificateId::for_enrollment(&user, &course),
            CertificateId::for_enrollment(&user, &course)
        );
        assert_eq!(
            CertificateId::for_enrollment(&user, &course).as_str(),
            ProgressKey::new(&user, &course).as_str()
        );
    }

    #[test]
    fn test_certificate_id_differs_per_course() {
        let user = UserId::new("abc");
        assert_ne!(
            CertificateId::for_enrollment(&user, &CourseId::new("a")),
            CertificateId::for_enrollment(&user, &CourseId::new("b"))
        );
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = LessonId::new("lesson-3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"lesson-3\"");
        let parsed: LessonId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
