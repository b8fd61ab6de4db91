//! Mock collaborators for testing
//!
//! In-memory stand-ins for the subscription repository, the channel
//! messenger, and the recurring charger, recording every side effect so
//! tests can assert exact counts.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use turnstile_core::{ChannelMessenger, ChargeOutcome, CoreError, RecurringCharger};
use turnstile_db::{DbError, DbResult, SubscriptionRepository, SubscriptionRow, UpsertSubscription};

/// In-memory subscription repository for testing
#[derive(Default)]
pub struct MockSubscriptionRepository {
    rows: DashMap<i64, SubscriptionRow>,
    /// When set, every operation fails with a store error
    pub fail: Mutex<bool>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test row directly
    pub fn insert_row(&self, row: SubscriptionRow) {
        self.rows.insert(row.user_id, row);
    }

    pub fn get(&self, user_id: i64) -> Option<SubscriptionRow> {
        self.rows.get(&user_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check(&self) -> DbResult<()> {
        if *self.fail.lock().unwrap() {
            Err(DbError::Sqlx(sqlx_unavailable()))
        } else {
            Ok(())
        }
    }
}

fn sqlx_unavailable() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn upsert(&self, sub: UpsertSubscription) -> DbResult<SubscriptionRow> {
        self.check()?;
        let row = SubscriptionRow {
            user_id: sub.user_id,
            user_name: sub.user_name,
            start_subscription: sub.start_subscription,
            end_subscription: sub.end_subscription,
            duration_months: sub.duration_months,
            recurring_id: sub.recurring_id,
        };
        self.rows.insert(row.user_id, row.clone());
        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: i64) -> DbResult<Option<SubscriptionRow>> {
        self.check()?;
        Ok(self.get(user_id))
    }

    async fn find_expired(&self, as_of: NaiveDate) -> DbResult<Vec<SubscriptionRow>> {
        self.check()?;
        let mut rows: Vec<SubscriptionRow> = self
            .rows
            .iter()
            .filter(|r| r.end_subscription < as_of)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.user_id);
        Ok(rows)
    }

    async fn update_period(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> DbResult<()> {
        self.check()?;
        if let Some(mut row) = self.rows.get_mut(&user_id) {
            row.start_subscription = start;
            row.end_subscription = end;
        }
        Ok(())
    }

    async fn clear_recurring(&self, user_id: i64) -> DbResult<()> {
        self.check()?;
        if let Some(mut row) = self.rows.get_mut(&user_id) {
            row.recurring_id = None;
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64) -> DbResult<()> {
        self.check()?;
        self.rows.remove(&user_id);
        Ok(())
    }
}

/// Messenger that records every call instead of talking to a network
#[derive(Default)]
pub struct RecordingMessenger {
    pub messages: Mutex<Vec<(i64, String)>>,
    pub invite_links: Mutex<Vec<String>>,
    pub kicked: Mutex<Vec<i64>>,
    /// When set, kick_member fails (to exercise per-step isolation)
    pub fail_kicks: Mutex<bool>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn invite_count(&self) -> usize {
        self.invite_links.lock().unwrap().len()
    }

    pub fn kicked_users(&self) -> Vec<i64> {
        self.kicked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelMessenger for RecordingMessenger {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), CoreError> {
        self.messages.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }

    async fn create_invite_link(&self, name: &str) -> Result<String, CoreError> {
        self.invite_links.lock().unwrap().push(name.to_string());
        Ok(format!("https://t.me/+invite-{name}"))
    }

    async fn kick_member(&self, user_id: i64) -> Result<(), CoreError> {
        if *self.fail_kicks.lock().unwrap() {
            return Err(CoreError::Messenger("chat not found".to_string()));
        }
        self.kicked.lock().unwrap().push(user_id);
        Ok(())
    }
}

/// Charger with a scripted outcome
pub struct ScriptedCharger {
    outcome: Result<ChargeOutcome, String>,
    pub charges: Mutex<Vec<(String, u32)>>,
}

impl ScriptedCharger {
    pub fn succeeding() -> Self {
        Self {
            outcome: Ok(ChargeOutcome::Success),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            outcome: Ok(ChargeOutcome::Declined),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn erroring() -> Self {
        Self {
            outcome: Err("gateway unreachable".to_string()),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }
}

#[async_trait]
impl RecurringCharger for ScriptedCharger {
    async fn charge(&self, recurring_id: &str, amount: u32) -> Result<ChargeOutcome, CoreError> {
        self.charges
            .lock()
            .unwrap()
            .push((recurring_id.to_string(), amount));
        match &self.outcome {
            Ok(outcome) => Ok(*outcome),
            Err(e) => Err(CoreError::Provider(e.clone())),
        }
    }
}
