//! Read-only endpoints for the dashboard and operators

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use voixi_common::AccountId;
use voixi_metering::UsageSnapshot;

use crate::calls::CallRecord;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/usage/:account`
pub async fn usage(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<UsageSnapshot>, ApiError> {
    let account = AccountId::parse(Some(account.as_str()))?;
    Ok(Json(state.gate.usage(&account).await?))
}

/// `GET /api/calls`
pub async fn calls(State(state): State<AppState>, Query(query): Query<CallsQuery>) -> Json<Vec<CallRecord>> {
    Json(state.calls.recent(query.limit.unwrap_or(50)).await)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": voixi_common::VERSION,
        "ledger": state.gate.ledger().backend(),
        "sms": state.dispatcher.backend(),
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    match encoder.encode(&state.registry.gather(), &mut buf) {
        Ok(()) => ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buf).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
