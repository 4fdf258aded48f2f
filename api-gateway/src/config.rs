//! Gateway configuration
//!
//! Layered: built-in defaults, then `config/voixi.toml` (or the file named by
//! `VOIXI_CONFIG`), then `VOIXI_*` environment variables using `__` between
//! nested keys (`VOIXI_METERING__FAIL_OPEN=false`). The conventional provider
//! variables (`PORT`, `TWILIO_*`, `VAPI_ASSISTANT_ID`, `REDIS_URL`) win last.

use serde::{Deserialize, Serialize};
use voixi_common::{VoixiError, DEFAULT_DECLINE_MESSAGE};
use voixi_metering::MeteringConfig;
use voixi_notify::NotifyConfig;

/// Default configuration file, extension optional
pub const DEFAULT_CONFIG_FILE: &str = "config/voixi";

/// Gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerSettings,
    pub metering: MeteringConfig,
    pub notify: NotifyConfig,
    pub voice: VoiceSettings,
}

/// Listener and logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_json: false,
        }
    }
}

/// Voice routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Voice-AI assistant that answers admitted calls
    pub assistant_id: String,
    /// Media stream endpoint; the assistant id is appended as a path segment
    pub stream_base_url: String,
    /// Spoken when a call is rejected at the ceiling
    pub decline_message: String,
    /// Spoken when a call cannot be attributed to an account
    pub unroutable_message: String,
    /// Spoken when the usage check fails and the gate fails closed
    pub unavailable_message: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            assistant_id: "your-vapi-assistant-id".to_string(),
            stream_base_url: "wss://api.vapi.ai/adapter/twilio/v1/stream".to_string(),
            decline_message: DEFAULT_DECLINE_MESSAGE.to_string(),
            unroutable_message: "We are unable to connect this call.".to_string(),
            unavailable_message: "This line is temporarily unavailable. Please try again later."
                .to_string(),
        }
    }
}

impl VoiceSettings {
    /// WebSocket URL the call audio is bridged to
    pub fn stream_url(&self) -> String {
        format!(
            "{}/{}",
            self.stream_base_url.trim_end_matches('/'),
            self.assistant_id
        )
    }
}

impl GatewayConfig {
    /// Load from `.env`, config file and process environment
    pub fn load() -> Result<Self, VoixiError> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let file = std::env::var("VOIXI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut cfg = Self::from_layers(Some(&file))?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Defaults, optional file, then `VOIXI_*` variables
    pub fn from_layers(file: Option<&str>) -> Result<Self, VoixiError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("VOIXI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| VoixiError::Config(e.to_string()))
    }

    /// Apply the conventional hosting and provider variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Check for hosting platform PORT first
        if let Some(port) = non_empty("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(sid) = non_empty("TWILIO_ACCOUNT_SID") {
            self.notify.twilio_account_sid = Some(sid);
        }
        if let Some(token) = non_empty("TWILIO_AUTH_TOKEN") {
            self.notify.twilio_auth_token = Some(token);
        }
        if let Some(number) = non_empty("TWILIO_PHONE_NUMBER") {
            self.notify.twilio_from_number = Some(number);
        }
        if let Some(assistant) = non_empty("VAPI_ASSISTANT_ID") {
            self.voice.assistant_id = assistant;
        }
        if let Some(url) = non_empty("REDIS_URL") {
            self.metering.redis_url = Some(url);
        }
        if let Some(json) = non_empty("VOIXI_LOG_JSON") {
            self.server.log_json = matches!(json.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
