//! Read access to the user account projection.
//!
//! Accounts are owned by identity/billing; this side never writes them.

use chrono::{DateTime, Utc};

use qacart_core::{GiftDetails, Subscription, SubscriptionStatus, UserId};

use super::{PgStore, RepositoryError, UserDirectory};
use crate::models::UserAccount;

#[derive(sqlx::FromRow)]
struct UserAccountRow {
    id: UserId,
    display_name: Option<String>,
    subscription_status: SubscriptionStatus,
    subscription_active: bool,
    gift_granted_at: Option<DateTime<Utc>>,
    gift_expires_at: Option<DateTime<Utc>>,
}

impl From<UserAccountRow> for UserAccount {
    fn from(row: UserAccountRow) -> Self {
        // A gift needs both timestamps; a half-written gift grants nothing.
        let gift = match (row.gift_granted_at, row.gift_expires_at) {
            (Some(granted_at), Some(expires_at)) => Some(GiftDetails {
                granted_at,
                expires_at,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            display_name: row.display_name,
            subscription: Subscription {
                status: row.subscription_status,
                is_active: row.subscription_active,
                gift,
            },
        }
    }
}

impl UserDirectory for PgStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let row: Option<UserAccountRow> = sqlx::query_as(
            r"
            SELECT id, display_name, subscription_status, subscription_active,
                   gift_granted_at, gift_expires_at
            FROM storefront.user_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(UserAccount::from))
    }
}
