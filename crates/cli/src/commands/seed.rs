//! Seed the course catalog mirror from a YAML file.
//!
//! ```yaml
//! courses:
//!   - id: playwright
//!     name: Playwright with TypeScript
//!     totalLessons: 42
//!     language: en
//! ```
//!
//! Existing courses are updated in place. Progress records keep the lesson
//! count they were created with.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use qacart_storefront::db::PgStore;
use qacart_storefront::models::Course;

use super::{CommandError, connect};

/// Top-level layout of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CourseSeedFile {
    pub courses: Vec<Course>,
}

/// Validate a seed file, returning one message per problem.
pub fn validate(file: &CourseSeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for course in &file.courses {
        if course.id.as_str().trim().is_empty() {
            errors.push("course with an empty id".to_owned());
        }
        if !seen.insert(course.id.clone()) {
            errors.push(format!("{}: duplicate id", course.id));
        }
        if course.name.trim().is_empty() {
            errors.push(format!("{}: name must not be blank", course.id));
        }
        if course.total_lessons == 0 {
            errors.push(format!("{}: totalLessons must be positive", course.id));
        }
    }

    errors
}

/// Seed courses from a YAML file.
///
/// # Errors
///
/// Returns `CommandError` if the file cannot be read or fails validation, or if
/// a database write fails.
pub async fn courses(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading courses from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::Io(file_path.to_owned(), e))?;
    let file: CourseSeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::Invalid(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let store = PgStore::new(connect().await?);
    for course in &file.courses {
        store.upsert_course(course).await?;
        info!(course_id = %course.id, lessons = course.total_lessons, "Course upserted");
    }

    info!(courses = file.courses.len(), "Seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> CourseSeedFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_file() {
        let file = parse(
            r"
courses:
  - id: playwright
    name: Playwright with TypeScript
    totalLessons: 42
    language: en
  - id: cypress-ar
    name: Cypress بالعربي
    totalLessons: 30
    language: ar
",
        );
        assert_eq!(file.courses.len(), 2);
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn test_rejects_zero_lessons_and_duplicates() {
        let file = parse(
            r"
courses:
  - id: playwright
    name: Playwright
    totalLessons: 0
    language: en
  - id: playwright
    name: ' '
    totalLessons: 3
    language: en
",
        );
        let errors = validate(&file);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("totalLessons")));
        assert!(errors.iter().any(|e| e.contains("duplicate")));
    }

    #[test]
    fn test_unknown_language_is_a_parse_error() {
        let result: Result<CourseSeedFile, _> = serde_yaml::from_str(
            "courses:\n  - id: x\n    name: X\n    totalLessons: 1\n    language: fr\n",
        );
        assert!(result.is_err());
    }
}
