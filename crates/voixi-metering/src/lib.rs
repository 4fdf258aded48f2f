//! # Voixi Metering
//!
//! Usage metering for inbound calls.
//!
//! ## Admission
//!
//! ```text
//! event → resolve tier → increment_within(ceiling) → Admit | Reject
//! ```
//!
//! - [`ledger`]: per-account usage counters bucketed by billing period
//! - [`policy`]: tier assignment and ceiling table
//! - [`gate`]: the admission decision, fail-open policy and decline notices

pub mod gate;
pub mod ledger;
pub mod metrics;
pub mod period;
pub mod policy;

pub use gate::{AdmissionGate, InboundEvent, UsageSnapshot};
pub use ledger::{InMemoryLedger, IncrementOutcome, RedisLedger, UsageLedger};
pub use metrics::GateMetrics;
pub use period::{BillingPeriod, Clock, ManualClock, SystemClock};
pub use policy::{PolicyConfig, SuffixRule, TierCeilings, TierPolicy, TierResolver};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voixi_common::MeteringError;

/// Metering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteringConfig {
    /// Admit events when the check itself fails
    pub fail_open: bool,
    /// Usage reset cadence
    pub billing_period: BillingPeriod,
    /// How often closed-period records are pruned (in-memory ledger)
    pub rollover_interval_secs: u64,
    /// Shared ledger; in-memory when unset
    pub redis_url: Option<String>,
    /// Tier assignment and ceilings
    pub policy: PolicyConfig,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            fail_open: true,
            billing_period: BillingPeriod::Monthly,
            rollover_interval_secs: 3600,
            redis_url: None,
            policy: PolicyConfig::default(),
        }
    }
}

/// Create the configured ledger.
///
/// The in-memory ledger gets a background rollover task that lives as long as
/// the runtime.
pub async fn build_ledger(config: &MeteringConfig) -> Result<Arc<dyn UsageLedger>, MeteringError> {
    match config.redis_url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => Ok(Arc::new(RedisLedger::connect(url, config.billing_period).await?)),
        None => {
            let ledger = Arc::new(InMemoryLedger::new(config.billing_period));
            ledger
                .clone()
                .start_rollover(Duration::from_secs(config.rollover_interval_secs.max(1)));
            info!(period = %config.billing_period, "Using in-memory usage ledger");
            Ok(ledger)
        }
    }
}
