//! # Voixi Common
//!
//! Shared types and errors for the Voixi call metering backend.
//!
//! ## Core Types
//!
//! - [`AccountId`]: metered subject (the business phone number a call is placed to)
//! - [`Tier`]/[`Ceiling`]: subscription level and its per-period usage ceiling
//! - [`AdmissionDecision`]: outcome of an admission check
//!
//! ## Errors
//!
//! - [`VoixiError`]: umbrella error with [`MeteringError`] and [`NotifyError`] variants

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{MeteringError, NotifyError, Result, VoixiError};
pub use types::{
    account::AccountId,
    decision::{Admission, AdmissionDecision, RejectReason},
    tier::{Ceiling, Tier},
};

/// Voixi version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Admitted events per period on the Basic tier
pub const BASIC_TIER_CEILING: u64 = 500;

/// Spoken to a caller whose business has used up its allowance
pub const DEFAULT_DECLINE_MESSAGE: &str = "We apologize, but this number has exceeded its monthly interaction limit. Please contact the business owner directly.";

/// Brand used in outbound SMS copy
pub const BRAND_NAME: &str = "VOIXI1";
