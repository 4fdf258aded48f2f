//! Business notification endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use voixi_notify::{templates, DeliveryReport};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub time: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlertRequest {
    pub business_owner_phone: String,
    pub item_name: String,
    pub current_stock: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub business_owner_phone: String,
    pub insight_title: String,
    pub projected_roi: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required field: {field}")))
}

/// Stock counts arrive as numbers or strings
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `POST /api/notify/sms`
pub async fn send_sms(State(state): State<AppState>, Json(req): Json<SmsRequest>) -> Json<DeliveryReport> {
    Json(state.dispatcher.send(&req.to, &req.body).await)
}

/// `POST /api/notify/appointment`
pub async fn appointment(
    State(state): State<AppState>,
    Json(req): Json<AppointmentRequest>,
) -> Result<Json<DeliveryReport>, ApiError> {
    let phone = required(req.customer_phone, "customerPhone")?;
    let time = required(req.time, "time")?;
    let body = templates::appointment_confirmation(
        req.customer_name.as_deref(),
        req.service_name.as_deref(),
        &time,
    );
    Ok(Json(state.dispatcher.send(&phone, &body).await))
}

/// `POST /api/notify/stock`
pub async fn stock_alert(
    State(state): State<AppState>,
    Json(req): Json<StockAlertRequest>,
) -> Json<DeliveryReport> {
    let body = templates::low_stock_alert(&req.item_name, &display_value(&req.current_stock));
    Json(state.dispatcher.send(&req.business_owner_phone, &body).await)
}

/// `POST /api/notify/insight`
pub async fn insight(
    State(state): State<AppState>,
    Json(req): Json<InsightRequest>,
) -> Json<DeliveryReport> {
    let body = templates::revenue_insight(&req.insight_title, &req.projected_roi);
    Json(state.dispatcher.send(&req.business_owner_phone, &body).await)
}
