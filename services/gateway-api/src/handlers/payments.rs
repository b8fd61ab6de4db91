//! Payment link and subscription management handlers

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use turnstile_core::tariff;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub user_id: i64,
    pub months: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub invoice_id: i64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: &'static str,
}

/// POST /api/v1/payments/link
///
/// Issue a signed payment link for a supported tariff and deliver it to
/// the user by direct message.
pub async fn create_payment_link(
    State(state): State<AppState>,
    Json(req): Json<CreateLinkRequest>,
) -> ApiResult<Json<CreateLinkResponse>> {
    let start = Instant::now();

    let price = tariff::supported_price(req.months)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported tariff: {} months", req.months)))?;

    let url = state
        .payments
        .start_payment(state.messenger.as_ref(), req.user_id, req.months, price)
        .await?;

    metrics::counter!("gateway_payment_links_created_total").increment(1);
    metrics::histogram!("gateway_operation_duration_seconds", "operation" => "create_payment_link")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(user_id = %req.user_id, months = %req.months, "Payment link created");

    Ok(Json(CreateLinkResponse {
        invoice_id: tariff::invoice_id(req.user_id, req.months),
        url,
    }))
}

/// POST /api/v1/subscriptions/{user_id}/cancel
///
/// Disable auto-renewal for a user; the paid period keeps running until
/// its end date.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<CancelResponse>> {
    let start = Instant::now();

    state.service.cancel_auto_renewal(user_id).await?;

    metrics::counter!("gateway_cancellations_total").increment(1);
    metrics::histogram!("gateway_operation_duration_seconds", "operation" => "cancel_subscription")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(CancelResponse { status: "canceled" }))
}
