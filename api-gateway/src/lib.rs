//! # Voixi Gateway
//!
//! HTTP surface of the receptionist backend:
//! - Telephony webhooks, gated by usage metering, answering in TwiML
//! - Business notification endpoints (SMS)
//! - Usage, call log, health and metrics reads

pub mod calls;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod twiml;

pub use config::GatewayConfig;
pub use state::AppState;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use routes::{dashboard, notify, voice};

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // Health & metrics
        .route("/health", get(dashboard::health))
        .route("/metrics", get(dashboard::metrics))
        // Telephony
        .route("/webhooks/twilio/voice", post(voice::incoming_call))
        .route("/webhooks/twilio/status", post(voice::call_status))
        // Notifications
        .route("/api/notify/sms", post(notify::send_sms))
        .route("/api/notify/appointment", post(notify::appointment))
        .route("/api/notify/stock", post(notify::stock_alert))
        .route("/api/notify/insight", post(notify::insight))
        // Dashboard
        .route("/api/usage/:account", get(dashboard::usage))
        .route("/api/calls", get(dashboard::calls))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
