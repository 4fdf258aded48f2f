//! AccountId - identifier of the metered subject
//!
//! Inbound calls are billed to the business that owns the dialled number, so the
//! account identifier is the `To` number of the telephony webhook.

use crate::error::MeteringError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account key; one ledger entry per distinct value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Build an identifier from an optional raw field.
    ///
    /// Absent, empty and whitespace-only values are all treated as missing.
    pub fn parse(raw: Option<&str>) -> Result<Self, MeteringError> {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Ok(Self(value.to_string())),
            _ => Err(MeteringError::MissingAccountIdentifier),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for AccountId {
    type Error = MeteringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(Some(value))
    }
}

impl TryFrom<String> for AccountId {
    type Error = MeteringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(Some(&value))
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = AccountId::parse(Some("  +15550001234 ")).unwrap();
        assert_eq!(id.as_str(), "+15550001234");
    }

    #[test]
    fn test_missing_values_rejected() {
        for raw in [None, Some(""), Some("   ")] {
            assert!(matches!(
                AccountId::parse(raw),
                Err(MeteringError::MissingAccountIdentifier)
            ));
        }
    }
}
