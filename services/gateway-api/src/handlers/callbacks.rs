//! Payment gateway callback handlers
//!
//! The gateway talks plain text over GET query parameters, so these
//! handlers bypass the JSON error envelope: `"OK<InvId>"` acknowledges the
//! result callback, `400 "bad sign"` rejects a forged one.

use std::collections::HashMap;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use turnstile_core::CallbackParams;

use crate::state::AppState;

/// GET /robokassa/result
///
/// Server-to-server payment confirmation; the only path that persists a
/// paid subscription.
pub async fn result_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let start = Instant::now();

    match state.service.confirm_payment(&params).await {
        Ok(ack) => {
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "result", "status" => "success")
            .increment(1);
            metrics::histogram!("gateway_operation_duration_seconds",
                "operation" => "confirm_payment")
            .record(start.elapsed().as_secs_f64());

            (StatusCode::OK, ack).into_response()
        }
        Err(e) if e.is_rejection() => {
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "result", "status" => "rejected")
            .increment(1);

            (StatusCode::BAD_REQUEST, "bad sign").into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, invoice_id = %params.invoice_id, "Result callback failed");
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "result", "status" => "error")
            .increment(1);

            (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
        }
    }
}

/// GET /robokassa/success
///
/// Browser redirect after payment; grants the invite link but never
/// persists subscription state.
pub async fn success_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.service.grant_access(&params).await {
        Ok(()) => {
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "success", "status" => "success")
            .increment(1);

            (
                StatusCode::OK,
                "Payment successful. Return to the chat for your invite link.",
            )
                .into_response()
        }
        Err(e) if e.is_rejection() => {
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "success", "status" => "rejected")
            .increment(1);

            (StatusCode::BAD_REQUEST, "bad sign").into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, invoice_id = %params.invoice_id, "Success callback failed");
            metrics::counter!("gateway_callbacks_processed_total",
                "kind" => "success", "status" => "error")
            .increment(1);

            (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
        }
    }
}

/// GET /robokassa/fail
///
/// User aborted or the payment failed; informational only, nothing to
/// verify and no state to mutate.
pub async fn fail_callback(Query(params): Query<HashMap<String, String>>) -> Response {
    tracing::warn!(params = ?params, "Payment canceled or failed");
    metrics::counter!("gateway_callbacks_processed_total",
        "kind" => "fail", "status" => "success")
    .increment(1);

    (StatusCode::OK, "Payment was not completed.").into_response()
}
