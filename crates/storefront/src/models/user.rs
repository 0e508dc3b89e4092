//! User account domain type.

use serde::{Deserialize, Serialize};

use qacart_core::{Subscription, UserId};

/// A user account as seen by the certificate workflow.
///
/// Only the subscription is consulted; it is never modified here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Identity-provider user ID.
    pub id: UserId,
    /// Display name, used to prefill the certificate name field.
    pub display_name: Option<String>,
    /// Current subscription.
    pub subscription: Subscription,
}
