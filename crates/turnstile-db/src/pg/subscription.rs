//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{SubscriptionRepository, UpsertSubscription};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn upsert(&self, sub: UpsertSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (user_id, user_name, start_subscription,
                                       end_subscription, duration_months, recurring_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET user_name = EXCLUDED.user_name,
                start_subscription = EXCLUDED.start_subscription,
                end_subscription = EXCLUDED.end_subscription,
                duration_months = EXCLUDED.duration_months,
                recurring_id = EXCLUDED.recurring_id
            RETURNING user_id, user_name, start_subscription, end_subscription,
                      duration_months, recurring_id
            "#,
        )
        .bind(sub.user_id)
        .bind(&sub.user_name)
        .bind(sub.start_subscription)
        .bind(sub.end_subscription)
        .bind(sub.duration_months)
        .bind(&sub.recurring_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, user_name, start_subscription, end_subscription,
                   duration_months, recurring_id
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_expired(&self, as_of: NaiveDate) -> DbResult<Vec<SubscriptionRow>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, user_name, start_subscription, end_subscription,
                   duration_months, recurring_id
            FROM subscriptions
            WHERE end_subscription < $1
            ORDER BY user_id
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update_period(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET start_subscription = $1, end_subscription = $2 WHERE user_id = $3",
        )
        .bind(start)
        .bind(end)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_recurring(&self, user_id: i64) -> DbResult<()> {
        sqlx::query("UPDATE subscriptions SET recurring_id = NULL WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, user_id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
