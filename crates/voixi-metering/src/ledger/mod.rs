//! Usage ledger
//!
//! Counts admitted events per account for the current billing period:
//! - InMemoryLedger: process-local counters in a DashMap
//! - RedisLedger: shared counters for multi-instance deployments
//!
//! Both backends implement [`UsageLedger::increment_within`] as a single atomic
//! check-and-increment, so concurrent events for one account cannot push its
//! usage past the ceiling.

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryLedger;
pub use self::redis::RedisLedger;

use async_trait::async_trait;
use voixi_common::{AccountId, Ceiling, MeteringError};

/// Result of a conditional increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Counted; carries the new usage
    Counted(u64),
    /// Ceiling already reached; usage left unchanged
    AtCeiling(u64),
}

/// Per-account usage counter store
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Usage in the current period; 0 when the account has no record.
    ///
    /// Only fails when the backing store is unreachable.
    async fn get(&self, account: &AccountId) -> Result<u64, MeteringError>;

    /// Count one event unconditionally and return the new usage
    async fn increment(&self, account: &AccountId) -> Result<u64, MeteringError>;

    /// Count one event only while usage is below `ceiling`
    async fn increment_within(
        &self,
        account: &AccountId,
        ceiling: Ceiling,
    ) -> Result<IncrementOutcome, MeteringError>;

    /// Zero one account's usage for the current period
    async fn reset(&self, account: &AccountId) -> Result<(), MeteringError>;

    /// Zero every account
    async fn reset_all(&self) -> Result<(), MeteringError>;

    /// Drop records from closed periods; returns how many were removed
    async fn roll_over(&self) -> Result<usize, MeteringError>;

    /// Key of the period being counted
    fn current_period(&self) -> String;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}
