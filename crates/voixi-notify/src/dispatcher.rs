//! Notification dispatcher
//!
//! Sends are best effort: one attempt, no retry, and a failure is reported in the
//! returned [`DeliveryReport`] instead of being propagated. Without provider
//! credentials the dispatcher runs in mock mode, which logs the message and
//! reports [`DeliveryReport::Mocked`] so callers can tell it apart from a real send.

use crate::provider::{SmsProvider, TwilioSmsProvider};
use crate::NotifyConfig;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn, Instrument};
use voixi_common::NotifyError;

/// Outcome of a single send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    /// Accepted by the provider
    Sent { sid: String },
    /// No provider configured; logged only
    Mocked,
    /// Rejected or unreachable
    Failed { error: String },
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryReport::Failed { .. })
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, DeliveryReport::Mocked)
    }
}

impl Serialize for DeliveryReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            success: bool,
            mock: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            sid: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let wire = match self {
            DeliveryReport::Sent { sid } => Wire {
                success: true,
                mock: false,
                sid: Some(sid),
                error: None,
            },
            DeliveryReport::Mocked => Wire {
                success: true,
                mock: true,
                sid: None,
                error: None,
            },
            DeliveryReport::Failed { error } => Wire {
                success: false,
                mock: false,
                sid: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

/// Prometheus counters for outbound SMS
pub struct SmsMetrics {
    pub sent: prometheus::IntCounter,
    pub mocked: prometheus::IntCounter,
    pub failed: prometheus::IntCounter,
}

impl SmsMetrics {
    pub fn new() -> Self {
        Self {
            sent: prometheus::IntCounter::new("voixi_sms_sent_total", "SMS accepted by the provider")
                .expect("valid metric"),
            mocked: prometheus::IntCounter::new(
                "voixi_sms_mocked_total",
                "SMS logged in mock mode instead of sent",
            )
            .expect("valid metric"),
            failed: prometheus::IntCounter::new("voixi_sms_failed_total", "SMS send failures")
                .expect("valid metric"),
        }
    }

    pub fn register(&self, registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.sent.clone()))?;
        registry.register(Box::new(self.mocked.clone()))?;
        registry.register(Box::new(self.failed.clone()))?;
        Ok(())
    }
}

impl Default for SmsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
enum DeliveryMode {
    Live(Arc<dyn SmsProvider>),
    Mock,
}

/// Best-effort SMS dispatcher
#[derive(Clone)]
pub struct NotificationDispatcher {
    mode: DeliveryMode,
    metrics: Arc<SmsMetrics>,
}

impl NotificationDispatcher {
    /// Dispatcher that delivers through `provider`
    pub fn new(provider: Arc<dyn SmsProvider>) -> Self {
        Self {
            mode: DeliveryMode::Live(provider),
            metrics: Arc::new(SmsMetrics::new()),
        }
    }

    /// Dispatcher that only logs
    pub fn mock() -> Self {
        Self {
            mode: DeliveryMode::Mock,
            metrics: Arc::new(SmsMetrics::new()),
        }
    }

    /// Twilio when fully configured, mock mode otherwise
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        match TwilioSmsProvider::from_config(config)? {
            Some(provider) => {
                info!("SMS dispatcher using Twilio");
                Ok(Self::new(Arc::new(provider)))
            }
            None => {
                warn!("Twilio credentials incomplete, SMS dispatcher running in mock mode");
                Ok(Self::mock())
            }
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.mode, DeliveryMode::Mock)
    }

    /// Provider name, or `"mock"`
    pub fn backend(&self) -> &'static str {
        match &self.mode {
            DeliveryMode::Live(provider) => provider.name(),
            DeliveryMode::Mock => "mock",
        }
    }

    pub fn metrics(&self) -> Arc<SmsMetrics> {
        self.metrics.clone()
    }

    /// Attempt delivery once and report the outcome
    #[instrument(skip(self, body))]
    pub async fn send(&self, to: &str, body: &str) -> DeliveryReport {
        let report = match self.try_send(to, body).await {
            Ok(report) => report,
            Err(e) => {
                error!(to = %to, error = %e, "SMS failed");
                DeliveryReport::Failed {
                    error: e.to_string(),
                }
            }
        };

        match &report {
            DeliveryReport::Sent { .. } => self.metrics.sent.inc(),
            DeliveryReport::Mocked => self.metrics.mocked.inc(),
            DeliveryReport::Failed { .. } => self.metrics.failed.inc(),
        }
        report
    }

    /// Fire-and-forget send on a detached task.
    ///
    /// Aborting the returned handle cancels the attempt.
    pub fn dispatch(&self, to: impl Into<String>, body: impl Into<String>) -> JoinHandle<DeliveryReport> {
        let dispatcher = self.clone();
        let to = to.into();
        let body = body.into();
        let span = tracing::info_span!("sms_dispatch", to = %to);
        tokio::spawn(async move { dispatcher.send(&to, &body).await }.instrument(span))
    }

    async fn try_send(&self, to: &str, body: &str) -> Result<DeliveryReport, NotifyError> {
        let to = validate_destination(to)?;
        if body.trim().is_empty() {
            return Err(NotifyError::EmptyBody);
        }

        match &self.mode {
            DeliveryMode::Mock => {
                info!(to = %to, body = %body, mock = true, "Mock SMS");
                Ok(DeliveryReport::Mocked)
            }
            DeliveryMode::Live(provider) => {
                let sid = provider.send_sms(to, body).await?;
                info!(to = %to, sid = %sid, provider = provider.name(), "SMS sent");
                Ok(DeliveryReport::Sent { sid })
            }
        }
    }
}

/// Accepts dialable numbers: digits with optional leading `+` and common separators
fn validate_destination(to: &str) -> Result<&str, NotifyError> {
    let trimmed = to.trim();
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = trimmed
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.') || (c == '+' && i == 0));

    if digits == 0 || !allowed {
        return Err(NotifyError::InvalidDestination(to.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockSmsProvider;

    fn live(mock: MockSmsProvider) -> NotificationDispatcher {
        NotificationDispatcher::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_live_send_reports_sid() {
        let mut provider = MockSmsProvider::new();
        provider
            .expect_send_sms()
            .withf(|to, body| to == "+15550001234" && body == "hello")
            .times(1)
            .returning(|_, _| Ok("SM0001".to_string()));
        provider.expect_name().return_const("twilio");

        let dispatcher = live(provider);
        let report = dispatcher.send("+15550001234", "hello").await;

        assert_eq!(report, DeliveryReport::Sent { sid: "SM0001".into() });
        assert_eq!(dispatcher.metrics().sent.get(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_reported_not_propagated() {
        let mut provider = MockSmsProvider::new();
        provider.expect_send_sms().times(1).returning(|_, _| {
            Err(NotifyError::ProviderError {
                provider: "twilio".into(),
                message: "unreachable number".into(),
            })
        });
        provider.expect_name().return_const("twilio");

        let dispatcher = live(provider);
        let report = dispatcher.send("+15550001234", "hello").await;

        assert!(!report.is_success());
        assert!(matches!(report, DeliveryReport::Failed { ref error } if error.contains("unreachable")));
        assert_eq!(dispatcher.metrics().failed.get(), 1);
    }

    #[tokio::test]
    async fn test_invalid_destination_skips_provider() {
        let mut provider = MockSmsProvider::new();
        provider.expect_send_sms().times(0);
        provider.expect_name().return_const("twilio");

        let dispatcher = live(provider);
        for bad in ["", "call me", "12+34"] {
            let report = dispatcher.send(bad, "hello").await;
            assert!(matches!(report, DeliveryReport::Failed { .. }), "{:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_mock_mode_is_distinguishable() {
        let dispatcher = NotificationDispatcher::mock();
        let report = dispatcher.send("+1 (555) 000-1234", "hello").await;

        assert_eq!(report, DeliveryReport::Mocked);
        assert!(report.is_success());
        assert!(report.is_mock());
        assert_eq!(dispatcher.backend(), "mock");
        assert_eq!(dispatcher.metrics().mocked.get(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_runs_detached() {
        let dispatcher = NotificationDispatcher::mock();
        let handle = dispatcher.dispatch("+15550001234", "later");
        assert_eq!(handle.await.unwrap(), DeliveryReport::Mocked);
    }

    #[test]
    fn test_report_wire_format() {
        let sent = serde_json::to_value(DeliveryReport::Sent { sid: "SM1".into() }).unwrap();
        assert_eq!(sent, serde_json::json!({"success": true, "mock": false, "sid": "SM1"}));

        let mocked = serde_json::to_value(DeliveryReport::Mocked).unwrap();
        assert_eq!(mocked, serde_json::json!({"success": true, "mock": true}));

        let failed = serde_json::to_value(DeliveryReport::Failed { error: "boom".into() }).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "mock": false, "error": "boom"}));
    }

    #[test]
    fn test_from_config_without_credentials_is_mock() {
        let dispatcher = NotificationDispatcher::from_config(&NotifyConfig::default()).unwrap();
        assert!(dispatcher.is_mock());
    }
}
