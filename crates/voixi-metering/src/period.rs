//! Billing periods and clocks
//!
//! Usage is bucketed by a period key derived from the current UTC time. A record
//! whose key differs from the current one belongs to a closed period and counts
//! as zero.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reset cadence for usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    /// Calendar month, UTC
    #[default]
    Monthly,
    /// Calendar day, UTC
    Daily,
}

impl BillingPeriod {
    /// `"2026-10"` for monthly, `"2026-10-19"` for daily
    pub fn key_at(&self, at: DateTime<Utc>) -> String {
        match self {
            BillingPeriod::Monthly => at.format("%Y-%m").to_string(),
            BillingPeriod::Daily => at.format("%Y-%m-%d").to_string(),
        }
    }

    /// Upper bound on the length of one period
    pub fn max_length(&self) -> Duration {
        match self {
            BillingPeriod::Monthly => Duration::days(31),
            BillingPeriod::Daily => Duration::days(1),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingPeriod::Monthly => write!(f, "monthly"),
            BillingPeriod::Daily => write!(f, "daily"),
        }
    }
}

/// Time source for period boundaries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
