//! Shared application state

use std::sync::Arc;
use voixi_common::VoixiError;
use voixi_metering::{build_ledger, AdmissionGate, TierPolicy};
use voixi_notify::NotificationDispatcher;

use crate::calls::CallLog;
use crate::config::{GatewayConfig, VoiceSettings};

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub dispatcher: NotificationDispatcher,
    pub calls: Arc<CallLog>,
    pub voice: Arc<VoiceSettings>,
    pub registry: prometheus::Registry,
}

impl AppState {
    pub fn new(gate: AdmissionGate, dispatcher: NotificationDispatcher, voice: VoiceSettings) -> Self {
        Self {
            gate: Arc::new(gate),
            dispatcher,
            calls: Arc::new(CallLog::default()),
            voice: Arc::new(voice),
            registry: prometheus::Registry::new(),
        }
    }

    /// Wire the ledger, policy and dispatcher from configuration
    pub async fn build(config: &GatewayConfig) -> Result<Self, VoixiError> {
        let ledger = build_ledger(&config.metering).await?;
        let policy = Arc::new(TierPolicy::new(config.metering.policy.clone()));
        let dispatcher = NotificationDispatcher::from_config(&config.notify)?;

        let mut gate =
            AdmissionGate::new(ledger, policy).with_fail_open(config.metering.fail_open);
        if config.notify.notify_caller_on_decline {
            gate = gate.with_decline_notices(dispatcher.clone(), config.voice.decline_message.clone());
        }

        let state = Self::new(gate, dispatcher, config.voice.clone());
        state
            .gate
            .metrics()
            .register(&state.registry)
            .map_err(|e| VoixiError::Internal(format!("metrics registration: {e}")))?;
        state
            .dispatcher
            .metrics()
            .register(&state.registry)
            .map_err(|e| VoixiError::Internal(format!("metrics registration: {e}")))?;

        Ok(state)
    }
}
