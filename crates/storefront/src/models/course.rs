//! Course catalog domain type.

use serde::{Deserialize, Serialize};

use qacart_core::{CourseId, Language};

/// A course as published in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Catalog course ID.
    pub id: CourseId,
    /// Display name, snapshotted onto certificates at issuance.
    pub name: String,
    /// Authoritative lesson count at request time.
    pub total_lessons: u32,
    /// Language the course (and its certificate) is delivered in.
    pub language: Language,
}
