//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DbResult;
use crate::models::SubscriptionRow;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Create or replace the subscription for a user.
    ///
    /// Conflict-safe on `user_id`; all mutable fields are overwritten
    /// atomically, so re-applying the same input is idempotent.
    async fn upsert(&self, sub: UpsertSubscription) -> DbResult<SubscriptionRow>;

    /// Find the subscription for a user
    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Option<SubscriptionRow>>;

    /// Find all subscriptions that ended before `as_of`
    async fn find_expired(&self, as_of: NaiveDate) -> DbResult<Vec<SubscriptionRow>>;

    /// Move the paid period forward after a successful renewal charge
    async fn update_period(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> DbResult<()>;

    /// Disable auto-renewal without touching the paid period
    async fn clear_recurring(&self, user_id: i64) -> DbResult<()>;

    /// Delete the subscription for a user
    async fn delete(&self, user_id: i64) -> DbResult<()>;
}

/// Upsert subscription input
#[derive(Debug, Clone)]
pub struct UpsertSubscription {
    pub user_id: i64,
    pub user_name: String,
    pub start_subscription: NaiveDate,
    pub end_subscription: NaiveDate,
    pub duration_months: i32,
    pub recurring_id: Option<String>,
}
