//! Error types for Voixi
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using VoixiError
pub type Result<T> = std::result::Result<T, VoixiError>;

/// Unified error type for Voixi operations
#[derive(Debug, Error)]
pub enum VoixiError {
    // Metering errors
    #[error("Metering error: {0}")]
    Metering(#[from] MeteringError),

    // Notification errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Admission and usage ledger errors
#[derive(Debug, Error)]
pub enum MeteringError {
    /// The inbound event did not name the account it should be billed to.
    #[error("Inbound event has no account identifier")]
    MissingAccountIdentifier,

    /// The usage ledger could not be read or updated.
    #[error("Usage ledger unavailable: {0}")]
    LedgerUnavailable(String),
}

/// Outbound notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{provider} rejected message: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Invalid destination number: {0:?}")]
    InvalidDestination(String),

    #[error("Message body is empty")]
    EmptyBody,

    #[error("HTTP transport error: {0}")]
    Http(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoixiError::Metering(MeteringError::LedgerUnavailable("redis down".into()));
        assert!(err.to_string().contains("redis down"));
    }

    #[test]
    fn test_subsystem_errors_convert() {
        fn check() -> Result<()> {
            Err(MeteringError::MissingAccountIdentifier)?
        }
        assert!(matches!(
            check(),
            Err(VoixiError::Metering(MeteringError::MissingAccountIdentifier))
        ));

        let err: VoixiError = NotifyError::EmptyBody.into();
        assert_eq!(err.to_string(), "Notification error: Message body is empty");
    }

    #[test]
    fn test_provider_error_names_provider() {
        let err = NotifyError::ProviderError {
            provider: "twilio".into(),
            message: "21211 invalid To".into(),
        };
        assert_eq!(err.to_string(), "twilio rejected message: 21211 invalid To");
    }
}
