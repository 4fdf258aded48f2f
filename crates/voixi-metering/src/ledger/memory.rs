//! In-memory usage ledger
//!
//! Records live in a DashMap keyed by account. Each record remembers the period
//! it was counted in; a record from a closed period reads as zero and is restarted
//! on the next increment. The shard lock held by `entry()` makes the conditional
//! increment atomic per account while other accounts proceed in parallel.

use super::{IncrementOutcome, UsageLedger};
use crate::period::{BillingPeriod, Clock, SystemClock};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use voixi_common::{AccountId, Ceiling, MeteringError};

/// Usage counted for one account
#[derive(Debug, Clone, PartialEq, Eq)]
struct UsageRecord {
    period_key: String,
    count: u64,
}

impl UsageRecord {
    fn count_in(&self, period_key: &str) -> u64 {
        if self.period_key == period_key {
            self.count
        } else {
            0
        }
    }

    /// Move to `period_key`, zeroing the count if it changed
    fn roll_to(&mut self, period_key: &str) {
        if self.period_key != period_key {
            self.period_key = period_key.to_string();
            self.count = 0;
        }
    }
}

/// Process-local usage ledger
pub struct InMemoryLedger {
    records: Arc<DashMap<AccountId, UsageRecord>>,
    period: BillingPeriod,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    pub fn new(period: BillingPeriod) -> Self {
        Self::with_clock(period, Arc::new(SystemClock))
    }

    pub fn with_clock(period: BillingPeriod, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            period,
            clock,
        }
    }

    /// Monthly ledger on the wall clock
    pub fn monthly() -> Self {
        Self::new(BillingPeriod::Monthly)
    }

    /// Number of stored records, including stale ones
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn period_key(&self) -> String {
        self.period.key_at(self.clock.now())
    }

    /// Start background pruning of closed-period records
    pub fn start_rollover(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;
                if let Ok(removed) = self.roll_over().await {
                    if removed > 0 {
                        info!(removed, "Pruned usage records from closed periods");
                    }
                }
            }
        })
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::monthly()
    }
}

#[async_trait]
impl UsageLedger for InMemoryLedger {
    async fn get(&self, account: &AccountId) -> Result<u64, MeteringError> {
        let period_key = self.period_key();
        Ok(self
            .records
            .get(account)
            .map(|r| r.count_in(&period_key))
            .unwrap_or(0))
    }

    #[instrument(skip(self), fields(account = %account))]
    async fn increment(&self, account: &AccountId) -> Result<u64, MeteringError> {
        let period_key = self.period_key();
        let mut record = self
            .records
            .entry(account.clone())
            .or_insert_with(|| UsageRecord {
                period_key: period_key.clone(),
                count: 0,
            });
        record.roll_to(&period_key);
        record.count = record.count.saturating_add(1);
        Ok(record.count)
    }

    #[instrument(skip(self), fields(account = %account, ceiling = %ceiling))]
    async fn increment_within(
        &self,
        account: &AccountId,
        ceiling: Ceiling,
    ) -> Result<IncrementOutcome, MeteringError> {
        let period_key = self.period_key();
        let mut record = self
            .records
            .entry(account.clone())
            .or_insert_with(|| UsageRecord {
                period_key: period_key.clone(),
                count: 0,
            });
        record.roll_to(&period_key);

        if !ceiling.permits(record.count) {
            debug!(usage = record.count, "At ceiling");
            return Ok(IncrementOutcome::AtCeiling(record.count));
        }
        record.count = record.count.saturating_add(1);
        Ok(IncrementOutcome::Counted(record.count))
    }

    async fn reset(&self, account: &AccountId) -> Result<(), MeteringError> {
        self.records.remove(account);
        Ok(())
    }

    async fn reset_all(&self) -> Result<(), MeteringError> {
        self.records.clear();
        info!("Cleared all usage records");
        Ok(())
    }

    async fn roll_over(&self) -> Result<usize, MeteringError> {
        let period_key = self.period_key();
        let before = self.records.len();
        self.records.retain(|_, record| record.period_key == period_key);
        Ok(before.saturating_sub(self.records.len()))
    }

    fn current_period(&self) -> String {
        self.period_key()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::ManualClock;
    use chrono::{TimeZone, Utc};

    fn account(id: &str) -> AccountId {
        AccountId::parse(Some(id)).unwrap()
    }

    #[tokio::test]
    async fn test_get_defaults_to_zero() {
        let ledger = InMemoryLedger::monthly();
        assert_eq!(ledger.get(&account("+15550000001")).await.unwrap(), 0);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_increment_creates_and_counts() {
        let ledger = InMemoryLedger::monthly();
        let a = account("+15550000001");

        assert_eq!(ledger.increment(&a).await.unwrap(), 1);
        assert_eq!(ledger.increment(&a).await.unwrap(), 2);
        assert_eq!(ledger.get(&a).await.unwrap(), 2);
        assert_eq!(ledger.get(&account("+15550000002")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_within_stops_at_ceiling() {
        let ledger = InMemoryLedger::monthly();
        let a = account("+15550000001");

        for expected in 1..=3 {
            assert_eq!(
                ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap(),
                IncrementOutcome::Counted(expected)
            );
        }
        assert_eq!(
            ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap(),
            IncrementOutcome::AtCeiling(3)
        );
        assert_eq!(ledger.get(&a).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_new_period_restarts_count() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap(),
        ));
        let ledger = InMemoryLedger::with_clock(BillingPeriod::Monthly, clock.clone());
        let a = account("+15550000001");

        ledger.increment(&a).await.unwrap();
        ledger.increment(&a).await.unwrap();
        assert_eq!(ledger.current_period(), "2026-01");

        clock.set(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 1).unwrap());
        assert_eq!(ledger.get(&a).await.unwrap(), 0);
        assert_eq!(ledger.increment(&a).await.unwrap(), 1);
        assert_eq!(ledger.current_period(), "2026-02");
    }

    #[tokio::test]
    async fn test_roll_over_prunes_closed_periods() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap(),
        ));
        let ledger = InMemoryLedger::with_clock(BillingPeriod::Daily, clock.clone());

        ledger.increment(&account("+15550000001")).await.unwrap();
        ledger.increment(&account("+15550000002")).await.unwrap();
        clock.advance(chrono::Duration::days(1));
        ledger.increment(&account("+15550000002")).await.unwrap();

        assert_eq!(ledger.roll_over().await.unwrap(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_resets() {
        let ledger = InMemoryLedger::monthly();
        let a = account("+15550000001");
        let b = account("+15550000002");
        ledger.increment(&a).await.unwrap();
        ledger.increment(&b).await.unwrap();

        ledger.reset(&a).await.unwrap();
        assert_eq!(ledger.get(&a).await.unwrap(), 0);
        assert_eq!(ledger.get(&b).await.unwrap(), 1);

        ledger.reset_all().await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_never_pass_ceiling() {
        let ledger = Arc::new(InMemoryLedger::monthly());
        let a = account("+15550000001");

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let ledger = ledger.clone();
                let a = a.clone();
                tokio::spawn(async move { ledger.increment_within(&a, Ceiling::Limited(10)).await })
            })
            .collect();

        let mut counted = 0;
        for task in futures::future::join_all(tasks).await {
            if let IncrementOutcome::Counted(_) = task.unwrap().unwrap() {
                counted += 1;
            }
        }
        assert_eq!(counted, 10);
        assert_eq!(ledger.get(&a).await.unwrap(), 10);
    }
}
