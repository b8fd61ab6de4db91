//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::NaiveDate;
use sqlx::FromRow;

/// Subscription row from the database
///
/// Exactly one row exists per user; the row is the single source of truth
/// for channel access. `recurring_id` being present is the sole switch for
/// auto-renewal eligibility.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubscriptionRow {
    /// Messenger user id (primary key)
    pub user_id: i64,
    /// Display label; synthesized as `user_<id>` when unknown
    pub user_name: String,
    /// First day of the current paid period
    pub start_subscription: NaiveDate,
    /// Day after which the subscription counts as expired
    pub end_subscription: NaiveDate,
    /// Paid tariff duration in months
    pub duration_months: i32,
    /// Gateway token identifying the renewable payment method
    pub recurring_id: Option<String>,
}
