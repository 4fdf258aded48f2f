//! # Voixi Notify
//!
//! Best-effort delivery of short text messages.
//!
//! - [`SmsProvider`]: seam to the external messaging provider
//! - [`TwilioSmsProvider`]: Twilio REST implementation
//! - [`NotificationDispatcher`]: validates, sends, and falls back to an explicit
//!   mock mode when the provider is not configured
//! - [`templates`]: business notification copy

pub mod dispatcher;
pub mod provider;
pub mod templates;

pub use dispatcher::{DeliveryReport, NotificationDispatcher, SmsMetrics};
pub use provider::{SmsProvider, TwilioSmsProvider};

use serde::{Deserialize, Serialize};

/// Default Twilio REST endpoint
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Twilio account SID
    pub twilio_account_sid: Option<String>,
    /// Twilio auth token
    pub twilio_auth_token: Option<String>,
    /// Sender number for outbound SMS
    pub twilio_from_number: Option<String>,
    /// REST API base URL
    pub api_base: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Text the caller a decline notice when their call is turned away
    pub notify_caller_on_decline: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            api_base: TWILIO_API_BASE.to_string(),
            request_timeout_secs: 10,
            notify_caller_on_decline: false,
        }
    }
}

impl NotifyConfig {
    /// Whether every credential needed for live delivery is present
    pub fn has_twilio_credentials(&self) -> bool {
        [
            &self.twilio_account_sid,
            &self.twilio_auth_token,
            &self.twilio_from_number,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(false, |s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_unconfigured() {
        let config = NotifyConfig::default();
        assert!(!config.has_twilio_credentials());
        assert_eq!(config.api_base, TWILIO_API_BASE);
    }

    #[test]
    fn test_blank_credentials_do_not_count() {
        let config = NotifyConfig {
            twilio_account_sid: Some("AC123".into()),
            twilio_auth_token: Some("  ".into()),
            twilio_from_number: Some("+15550009999".into()),
            ..Default::default()
        };
        assert!(!config.has_twilio_credentials());
    }
}
