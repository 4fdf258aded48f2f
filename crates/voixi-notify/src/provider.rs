//! SMS providers
//!
//! [`SmsProvider`] is the only seam to the outside messaging network. The
//! Twilio implementation posts to the Messages resource of the REST API.

use crate::NotifyConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use voixi_common::NotifyError;

/// Delivers one text message and returns the provider's message id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifyError>;

    /// Short provider name for logs and health output
    fn name(&self) -> &'static str;
}

/// Twilio Messages API client
pub struct TwilioSmsProvider {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

/// Subset of the Message resource we read back
#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

/// Twilio error body
#[derive(Debug, Deserialize)]
struct TwilioApiError {
    code: Option<u32>,
    message: String,
}

impl TwilioSmsProvider {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        Self::with_options(
            account_sid,
            auth_token,
            from_number,
            crate::TWILIO_API_BASE,
            Duration::from_secs(10),
        )
    }

    pub fn with_options(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        Ok(Self {
            client,
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from configuration; `None` when credentials are incomplete
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>, NotifyError> {
        if !config.has_twilio_credentials() {
            return Ok(None);
        }
        match (
            config.twilio_account_sid.as_deref(),
            config.twilio_auth_token.as_deref(),
            config.twilio_from_number.as_deref(),
        ) {
            (Some(sid), Some(token), Some(from)) => Self::with_options(
                sid.trim(),
                token.trim(),
                from.trim(),
                config.api_base.as_str(),
                Duration::from_secs(config.request_timeout_secs),
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsProvider for TwilioSmsProvider {
    #[instrument(skip(self, body), fields(provider = "twilio"))]
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifyError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let message: TwilioMessage = response
                .json()
                .await
                .map_err(|e| NotifyError::Http(e.to_string()))?;
            debug!(sid = %message.sid, "Twilio accepted message");
            return Ok(message.sid);
        }

        let message = match response.json::<TwilioApiError>().await {
            Ok(TwilioApiError { code: Some(code), message }) => format!("{} ({})", message, code),
            Ok(TwilioApiError { code: None, message }) => message,
            Err(_) => format!("HTTP {}", status),
        };
        Err(NotifyError::ProviderError {
            provider: self.name().to_string(),
            message,
        })
    }

    fn name(&self) -> &'static str {
        "twilio"
    }
}
