//! Gateway API
//!
//! Paid channel-access service: issues signed payment links, verifies the
//! payment gateway's callbacks, and runs the daily renewal sweep.
//!
//! ## Gateway Callbacks (plain text, GET)
//!
//! - `GET /robokassa/result` - authoritative payment confirmation
//! - `GET /robokassa/success` - browser redirect, delivers the invite link
//! - `GET /robokassa/fail` - payment aborted, informational
//!
//! ## REST Endpoints
//!
//! - `POST /api/v1/payments/link` - issue and deliver a payment link
//! - `POST /api/v1/subscriptions/{user_id}/cancel` - disable auto-renewal
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod handlers;
mod scheduler;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use turnstile_core::{
    ChannelMessenger, PaymentLinkBuilder, RecurringCharger, RenewalSweeper, RobokassaCharger,
    SubscriptionService, TelegramMessenger,
};
use turnstile_db::pg::Repositories;

use crate::config::Config;
use crate::handlers::{health, ready};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("gateway_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gateway API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        test_mode = config.gateway.test_mode,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = turnstile_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Create repositories and collaborators
    let repos = Repositories::new(pool.clone());
    let repo = Arc::new(repos.subscriptions.clone());

    let messenger: Arc<dyn ChannelMessenger> = Arc::new(TelegramMessenger::new(
        &config.bot_token,
        config.channel_id,
    ));
    let charger: Arc<dyn RecurringCharger> = Arc::new(RobokassaCharger::new(config.gateway.clone()));

    // Create the subscription service and payment link builder
    let service = SubscriptionService::new(
        Arc::clone(&repo),
        Arc::clone(&messenger),
        config.gateway.clone(),
    );
    let payments = PaymentLinkBuilder::new(config.gateway.clone())?;

    // Create application state
    let state = AppState::new(service, payments, Arc::clone(&messenger), pool, config.clone());

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    // Start the renewal scheduler with its own shutdown channel
    let sweeper = RenewalSweeper::new(repo, messenger, charger);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler::run(sweeper, shutdown_rx));

    // Run the HTTP server until a shutdown signal arrives
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tokio::select! {
        result = run_http_server(app, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "HTTP server error");
            }
        }
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    // Stop the scheduler between iterations
    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // API v1 routes
    let api_v1 = Router::new()
        .route("/payments/link", post(handlers::create_payment_link))
        .route(
            "/subscriptions/{user_id}/cancel",
            post(handlers::cancel_subscription),
        );

    // Gateway callback routes (plain text, no JSON envelope)
    let callback_routes = Router::new()
        .route("/robokassa/result", get(handlers::result_callback))
        .route("/robokassa/success", get(handlers::success_callback))
        .route("/robokassa/fail", get(handlers::fail_callback));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(callback_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Latency buckets sized for callback handling; most of the work is one
    // upsert or a couple of Bot API calls
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("gateway_operation_duration_seconds".to_string()),
            latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "gateway_payment_links_created_total",
        "Total payment links issued"
    );
    metrics::describe_counter!(
        "gateway_callbacks_processed_total",
        "Total gateway callbacks by kind and status"
    );
    metrics::describe_counter!(
        "gateway_cancellations_total",
        "Total auto-renewal cancellations"
    );
    metrics::describe_counter!(
        "gateway_renewals_total",
        "Total sweep outcomes by kind"
    );
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    metrics::describe_histogram!(
        "gateway_operation_duration_seconds",
        "Gateway operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
