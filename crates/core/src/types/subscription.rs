//! Subscription state embedded in a user account.
//!
//! Subscriptions are owned by the billing side of the platform; this crate only
//! reads them to decide whether a user counts as premium.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::SubscriptionStatus;

/// An admin-granted premium entitlement with its own expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftDetails {
    /// When the gift was granted.
    pub granted_at: DateTime<Utc>,
    /// When the gift stops counting as premium.
    pub expires_at: DateTime<Utc>,
}

impl GiftDetails {
    /// Whether the gift is still in effect at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A user's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription tier.
    pub status: SubscriptionStatus,
    /// Whether a paid subscription is currently active.
    pub is_active: bool,
    /// Gift subscription details, if one was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift: Option<GiftDetails>,
}

impl Subscription {
    /// A free subscription.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            status: SubscriptionStatus::Free,
            is_active: false,
            gift: None,
        }
    }

    /// An active paid premium subscription.
    #[must_use]
    pub const fn premium() -> Self {
        Self {
            status: SubscriptionStatus::Premium,
            is_active: true,
            gift: None,
        }
    }

    /// Whether the user counts as premium at `now`.
    ///
    /// Premium means the tier is `premium` and either the paid subscription is
    /// active or an unexpired gift is present.
    #[must_use]
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Premium
            && (self.is_active || self.gift.is_some_and(|gift| gift.is_active_at(now)))
    }
}
