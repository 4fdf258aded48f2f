//! Telephony webhooks

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use voixi_common::{AdmissionDecision, MeteringError};
use voixi_metering::InboundEvent;

use crate::calls::CallRecord;
use crate::state::AppState;
use crate::twiml::{self, TwimlError};

/// Incoming call form posted by the provider
#[derive(Debug, Default, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "FromCountry")]
    pub from_country: Option<String>,
}

/// Call progress callback
#[derive(Debug, Default, Deserialize)]
pub struct StatusWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,
    #[serde(rename = "Duration")]
    pub duration: Option<String>,
}

fn twiml_response(status: StatusCode, document: Result<String, TwimlError>) -> Response {
    match document {
        Ok(xml) => (status, [(header::CONTENT_TYPE, twiml::CONTENT_TYPE)], xml).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render TwiML");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /webhooks/twilio/voice`
#[instrument(skip_all, fields(call_sid = ?form.call_sid, to = ?form.to))]
pub async fn incoming_call(State(state): State<AppState>, Form(form): Form<VoiceWebhook>) -> Response {
    let mut event = InboundEvent {
        account: form.to.clone(),
        caller: None,
    };
    if let Some(from) = form.from.as_deref() {
        event = event.with_caller(from);
    }

    match state.gate.check(&event).await {
        Ok(AdmissionDecision::Admit(admission)) => {
            info!(
                account = %admission.account,
                tier = %admission.tier,
                fail_open = admission.fail_open,
                "Connecting call to assistant"
            );
            if let Some(sid) = form.call_sid {
                state
                    .calls
                    .record(CallRecord::ringing(
                        sid,
                        form.from,
                        admission.account.into_inner(),
                        form.from_country,
                    ))
                    .await;
            }
            twiml_response(StatusCode::OK, twiml::connect_stream(&state.voice.stream_url()))
        }
        Ok(AdmissionDecision::Reject(reason)) => {
            info!(%reason, "Declining call");
            twiml_response(StatusCode::OK, twiml::say_and_hangup(&state.voice.decline_message))
        }
        // The provider only plays TwiML from 2xx responses
        Err(MeteringError::MissingAccountIdentifier) => {
            warn!(call_sid = ?form.call_sid, "Call without destination number, declining");
            twiml_response(StatusCode::OK, twiml::say_and_hangup(&state.voice.unroutable_message))
        }
        Err(e) => {
            error!(error = %e, "Usage check unavailable, declining call");
            twiml_response(StatusCode::OK, twiml::say_and_hangup(&state.voice.unavailable_message))
        }
    }
}

/// `POST /webhooks/twilio/status`
pub async fn call_status(State(state): State<AppState>, Form(form): Form<StatusWebhook>) -> StatusCode {
    if let (Some(sid), Some(status)) = (form.call_sid.as_deref(), form.call_status.as_deref()) {
        let duration = form.duration.as_deref().and_then(|d| d.trim().parse().ok());
        if !state.calls.update_status(sid, status, duration).await {
            info!(call_sid = sid, status, "Status for unknown call");
        }
    }
    StatusCode::OK
}
