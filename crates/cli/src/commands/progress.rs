//! Progress maintenance commands.
//!
//! Run after a user account or a course is deleted upstream:
//!
//! ```bash
//! qacart-cli progress purge --user user-1
//! qacart-cli progress purge --course playwright
//! ```

use qacart_core::{CourseId, UserId};
use qacart_storefront::db::{PgStore, PurgeScope};
use qacart_storefront::services::ProgressService;

use super::{CommandError, connect};

/// Delete progress records for a user or a course.
///
/// # Errors
///
/// Returns `CommandError` if neither or both scopes are given, or the store fails.
pub async fn purge(user: Option<String>, course: Option<String>) -> Result<(), CommandError> {
    let scope = match (user, course) {
        (Some(user), None) => PurgeScope::User(UserId::new(user)),
        (None, Some(course)) => PurgeScope::Course(CourseId::new(course)),
        _ => {
            return Err(CommandError::Invalid(
                "pass exactly one of --user or --course".to_owned(),
            ));
        }
    };

    let store = PgStore::new(connect().await?);
    let removed = ProgressService::new(&store).purge(&scope).await?;

    tracing::info!(removed, "Progress purge complete");
    Ok(())
}
