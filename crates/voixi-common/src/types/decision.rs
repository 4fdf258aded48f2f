//! Admission decisions
//!
//! Decisions are transient: they are returned to the caller of the gate and
//! never persisted.

use super::{account::AccountId, tier::Tier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An admitted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub account: AccountId,
    pub tier: Tier,
    /// Usage after this event was counted. `None` when the ledger could not be
    /// consulted and the event was let through anyway.
    pub usage: Option<u64>,
    /// Admitted because of an internal failure rather than a real check
    pub fail_open: bool,
}

/// Why an event was turned away
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    CeilingExceeded { tier: Tier, ceiling: u64, usage: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::CeilingExceeded { tier, ceiling, usage } => write!(
                f,
                "{} tier allowance of {} interactions used ({} this period)",
                tier, ceiling, usage
            ),
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    Admit(Admission),
    Reject(RejectReason),
}

impl AdmissionDecision {
    pub fn is_admit(&self) -> bool {
        matches!(self, AdmissionDecision::Admit(_))
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, AdmissionDecision::Reject(_))
    }
}
