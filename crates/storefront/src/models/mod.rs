//! Domain models owned by external collaborators and read by the storefront.
//!
//! User accounts and courses are managed elsewhere (identity/billing and the
//! course catalog). The storefront only reads them to evaluate eligibility and
//! to snapshot course details onto certificates.

pub mod course;
pub mod session;
pub mod user;

pub use course::Course;
pub use session::{CurrentUser, keys as session_keys};
pub use user::UserAccount;
