//! Subscription lifecycle tests
//!
//! Exercise the callback verification paths and the renewal sweep against
//! in-memory collaborators: payment confirmation idempotence, access grant
//! side effects, renewal success/decline, and non-renewing expiry.

mod common;

use std::sync::Arc;

use chrono::{Days, NaiveDate};

use common::mocks::{MockSubscriptionRepository, RecordingMessenger, ScriptedCharger};
use turnstile_core::{
    signature, CallbackParams, GatewayConfig, RenewalSweeper, SubscriptionService, SweepSummary,
};
use turnstile_db::SubscriptionRow;

const PASSWORD1: &str = "pass-one";
const PASSWORD2: &str = "pass-two";

fn config() -> GatewayConfig {
    GatewayConfig::new("shop", PASSWORD1, PASSWORD2)
}

fn service(
    repo: Arc<MockSubscriptionRepository>,
    messenger: Arc<RecordingMessenger>,
) -> SubscriptionService<MockSubscriptionRepository> {
    SubscriptionService::new(repo, messenger, config())
}

/// A callback signed with the given secret, as the gateway would send it
fn signed_params(user_id: i64, months: u32, out_sum: &str, password: &str) -> CallbackParams {
    let invoice_id = (user_id * 10 + i64::from(months)).to_string();
    let user = user_id.to_string();
    let months_field = months.to_string();
    let signature = signature::sign_callback(
        out_sum,
        &invoice_id,
        password,
        &[("Shp_months", &months_field), ("Shp_user", &user)],
    );
    CallbackParams {
        out_sum: out_sum.to_string(),
        invoice_id,
        user,
        months: months_field,
        signature,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expired_row(user_id: i64, months: i32, recurring: Option<&str>) -> SubscriptionRow {
    let end = date(2025, 1, 1);
    SubscriptionRow {
        user_id,
        user_name: format!("user_{user_id}"),
        start_subscription: end - Days::new(30 * months.max(0) as u64),
        end_subscription: end,
        duration_months: months,
        recurring_id: recurring.map(String::from),
    }
}

#[tokio::test]
async fn confirm_payment_persists_and_acknowledges() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let svc = service(Arc::clone(&repo), Arc::new(RecordingMessenger::new()));

    let params = signed_params(123, 3, "3490.00", PASSWORD2);
    let ack = svc.confirm_payment(&params).await.unwrap();
    assert_eq!(ack, "OK1233");

    let row = repo.get(123).unwrap();
    assert_eq!(row.user_name, "user_123");
    assert_eq!(row.duration_months, 3);
    assert_eq!(row.recurring_id.as_deref(), Some("1233"));
    assert_eq!(
        row.end_subscription - row.start_subscription,
        chrono::Duration::days(90)
    );
}

#[tokio::test]
async fn confirm_payment_is_idempotent_under_retries() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let svc = service(Arc::clone(&repo), Arc::new(RecordingMessenger::new()));

    let params = signed_params(123, 3, "3490.00", PASSWORD2);
    svc.confirm_payment(&params).await.unwrap();
    let first = repo.get(123).unwrap();

    let ack = svc.confirm_payment(&params).await.unwrap();
    assert_eq!(ack, "OK1233");
    assert_eq!(repo.get(123).unwrap(), first);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn confirm_payment_rejects_wrong_secret_without_side_effects() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let svc = service(Arc::clone(&repo), Arc::new(RecordingMessenger::new()));

    // Signed with password #1 but the result callback verifies with #2
    let params = signed_params(123, 3, "3490.00", PASSWORD1);
    let err = svc.confirm_payment(&params).await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(repo.len(), 0);
}

#[tokio::test]
async fn grant_access_sends_exactly_one_link_and_one_message() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    let svc = service(Arc::clone(&repo), Arc::clone(&messenger));

    let params = signed_params(55, 1, "1290.00", PASSWORD1);
    svc.grant_access(&params).await.unwrap();

    assert_eq!(messenger.invite_count(), 1);
    assert_eq!(messenger.message_count(), 1);
    let (to, text) = messenger.messages.lock().unwrap()[0].clone();
    assert_eq!(to, 55);
    assert!(text.contains("https://t.me/+invite-Payment InvId=551"));

    // The success path never persists subscription state
    assert_eq!(repo.len(), 0);
}

#[tokio::test]
async fn grant_access_with_bad_signature_has_zero_side_effects() {
    let messenger = Arc::new(RecordingMessenger::new());
    let svc = service(
        Arc::new(MockSubscriptionRepository::new()),
        Arc::clone(&messenger),
    );

    let mut params = signed_params(55, 1, "1290.00", PASSWORD1);
    params.signature = params.signature.chars().rev().collect();

    assert!(svc.grant_access(&params).await.unwrap_err().is_rejection());
    assert_eq!(messenger.invite_count(), 0);
    assert_eq!(messenger.message_count(), 0);
}

#[tokio::test]
async fn malformed_user_field_is_rejected_after_verification() {
    let svc = service(
        Arc::new(MockSubscriptionRepository::new()),
        Arc::new(RecordingMessenger::new()),
    );

    let invoice_id = "1233".to_string();
    let signature = signature::sign_callback(
        "3490.00",
        &invoice_id,
        PASSWORD2,
        &[("Shp_months", "3"), ("Shp_user", "not-a-number")],
    );
    let params = CallbackParams {
        out_sum: "3490.00".to_string(),
        invoice_id,
        user: "not-a-number".to_string(),
        months: "3".to_string(),
        signature,
    };

    assert!(svc
        .confirm_payment(&params)
        .await
        .unwrap_err()
        .is_rejection());
}

#[tokio::test]
async fn cancel_auto_renewal_clears_token_and_keeps_dates() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let svc = service(Arc::clone(&repo), Arc::new(RecordingMessenger::new()));

    let row = expired_row(9, 3, Some("rec-9"));
    let dates = (row.start_subscription, row.end_subscription);
    repo.insert_row(row);

    svc.cancel_auto_renewal(9).await.unwrap();

    let row = repo.get(9).unwrap();
    assert_eq!(row.recurring_id, None);
    assert_eq!((row.start_subscription, row.end_subscription), dates);
}

#[tokio::test]
async fn cancel_auto_renewal_surfaces_store_failures() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let svc = service(Arc::clone(&repo), Arc::new(RecordingMessenger::new()));

    repo.set_failing(true);
    let err = svc.cancel_auto_renewal(9).await.unwrap_err();
    assert!(err.is_store_failure());
}

#[tokio::test]
async fn sweep_renews_recurring_rows_and_advances_dates() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    let charger = Arc::new(ScriptedCharger::succeeding());
    let sweeper = RenewalSweeper::new(Arc::clone(&repo), messenger.clone(), charger.clone());

    repo.insert_row(expired_row(10, 3, Some("rec-10")));

    let today = date(2025, 1, 2);
    let summary = sweeper.sweep(today).await.unwrap();
    assert_eq!(
        summary,
        SweepSummary {
            renewed: 1,
            removed: 0,
            failed: 0
        }
    );

    let row = repo.get(10).unwrap();
    assert_eq!(row.start_subscription, today);
    assert_eq!(row.end_subscription, today + Days::new(90));

    // Charged the 3-month tariff price, notified the user, no kick
    assert_eq!(
        charger.charges.lock().unwrap()[0],
        ("rec-10".to_string(), 3490)
    );
    assert_eq!(messenger.message_count(), 1);
    assert!(messenger.kicked_users().is_empty());
}

#[tokio::test]
async fn sweep_uses_fallback_price_for_unknown_durations() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let charger = Arc::new(ScriptedCharger::succeeding());
    let sweeper = RenewalSweeper::new(
        Arc::clone(&repo),
        Arc::new(RecordingMessenger::new()),
        charger.clone(),
    );

    repo.insert_row(expired_row(11, 5, Some("rec-11")));
    sweeper.sweep(date(2025, 1, 2)).await.unwrap();

    assert_eq!(
        charger.charges.lock().unwrap()[0],
        ("rec-11".to_string(), 1290)
    );
}

#[tokio::test]
async fn sweep_removes_row_when_charge_is_declined() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    let sweeper = RenewalSweeper::new(
        Arc::clone(&repo),
        messenger.clone(),
        Arc::new(ScriptedCharger::declining()),
    );

    repo.insert_row(expired_row(20, 1, Some("rec-20")));

    let summary = sweeper.sweep(date(2025, 1, 2)).await.unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(repo.get(20), None);
    assert_eq!(messenger.kicked_users(), vec![20]);
    assert_eq!(messenger.message_count(), 1);
}

#[tokio::test]
async fn sweep_removes_non_renewing_rows_without_charging() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    let charger = Arc::new(ScriptedCharger::succeeding());
    let sweeper = RenewalSweeper::new(Arc::clone(&repo), messenger.clone(), charger.clone());

    repo.insert_row(expired_row(30, 6, None));

    let summary = sweeper.sweep(date(2025, 1, 2)).await.unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(charger.charge_count(), 0);
    assert_eq!(repo.get(30), None);
    assert_eq!(messenger.kicked_users(), vec![30]);
}

#[tokio::test]
async fn sweep_leaves_rows_untouched_on_transport_errors() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    let sweeper = RenewalSweeper::new(
        Arc::clone(&repo),
        messenger.clone(),
        Arc::new(ScriptedCharger::erroring()),
    );

    repo.insert_row(expired_row(40, 3, Some("rec-40")));

    let summary = sweeper.sweep(date(2025, 1, 2)).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(repo.get(40).is_some());
    assert!(messenger.kicked_users().is_empty());
}

#[tokio::test]
async fn sweep_ignores_rows_that_have_not_expired() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let sweeper = RenewalSweeper::new(
        Arc::clone(&repo),
        Arc::new(RecordingMessenger::new()),
        Arc::new(ScriptedCharger::succeeding()),
    );

    let mut row = expired_row(50, 1, None);
    row.end_subscription = date(2025, 6, 1);
    repo.insert_row(row);

    let summary = sweeper.sweep(date(2025, 1, 2)).await.unwrap();
    assert_eq!(summary, SweepSummary::default());
    assert!(repo.get(50).is_some());
}

#[tokio::test]
async fn removal_still_deletes_row_when_kick_fails() {
    let repo = Arc::new(MockSubscriptionRepository::new());
    let messenger = Arc::new(RecordingMessenger::new());
    *messenger.fail_kicks.lock().unwrap() = true;
    let sweeper = RenewalSweeper::new(
        Arc::clone(&repo),
        messenger.clone(),
        Arc::new(ScriptedCharger::declining()),
    );

    repo.insert_row(expired_row(60, 1, Some("rec-60")));
    repo.insert_row(expired_row(61, 1, None));

    let summary = sweeper.sweep(date(2025, 1, 2)).await.unwrap();

    // Kick failures are contained per step and per row
    assert_eq!(summary.removed, 2);
    assert_eq!(repo.len(), 0);
    assert_eq!(messenger.message_count(), 2);
}
