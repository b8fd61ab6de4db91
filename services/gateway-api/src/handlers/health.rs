//! Liveness and readiness probes
//!
//! Readiness covers what the callback endpoints actually need before they
//! are worth routing traffic to: a reachable subscription store and
//! configured gateway credentials.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub merchant: &'static str,
}

/// Liveness: the process is up and serving
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness: the store answers a ping and a merchant login is configured
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    if state.config.gateway.merchant_login.is_empty() {
        tracing::error!("Merchant login is not configured");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => Ok(Json(ReadyResponse {
            status: "ready",
            store: "reachable",
            merchant: "configured",
        })),
        Err(e) => {
            tracing::error!(error = ?e, "Subscription store ping failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
