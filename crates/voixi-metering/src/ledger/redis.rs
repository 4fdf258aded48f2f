//! Redis usage ledger
//!
//! Keys are `{prefix}:{period}:{account}` and expire two period lengths after
//! their last write, so closed periods clean themselves up. The conditional
//! increment runs as a Lua script to keep check and increment atomic across
//! gateway instances.

use super::{IncrementOutcome, UsageLedger};
use crate::period::{BillingPeriod, Clock, SystemClock};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use voixi_common::{AccountId, Ceiling, MeteringError};

const INCREMENT_WITHIN: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
local ceiling = tonumber(ARGV[1])
if ceiling >= 0 and current >= ceiling then
  return {0, current}
end
local updated = redis.call('INCR', KEYS[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return {1, updated}
"#;

/// Shared usage ledger backed by Redis
pub struct RedisLedger {
    connection: ConnectionManager,
    prefix: String,
    period: BillingPeriod,
    clock: Arc<dyn Clock>,
    script: Script,
}

impl RedisLedger {
    /// Connect to Redis
    pub async fn connect(redis_url: &str, period: BillingPeriod) -> Result<Self, MeteringError> {
        let client = Client::open(redis_url).map_err(unavailable)?;
        let connection = ConnectionManager::new(client).await.map_err(unavailable)?;
        info!(period = %period, "Connected usage ledger to Redis");

        Ok(Self {
            connection,
            prefix: "voixi:usage".to_string(),
            period,
            clock: Arc::new(SystemClock),
            script: Script::new(INCREMENT_WITHIN),
        })
    }

    /// Use a custom key prefix
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn key(&self, account: &AccountId) -> String {
        usage_key(&self.prefix, &self.period.key_at(self.clock.now()), account)
    }

    fn ttl_secs(&self) -> i64 {
        self.period.max_length().num_seconds() * 2
    }
}

fn usage_key(prefix: &str, period_key: &str, account: &AccountId) -> String {
    format!("{}:{}:{}", prefix, period_key, account)
}

fn unavailable(err: redis::RedisError) -> MeteringError {
    warn!("Redis ledger error: {}", err);
    MeteringError::LedgerUnavailable(err.to_string())
}

/// Encode a ceiling for the Lua script; negative means unlimited
fn ceiling_arg(ceiling: Ceiling) -> i64 {
    match ceiling.limit() {
        Some(n) => i64::try_from(n).unwrap_or(i64::MAX),
        None => -1,
    }
}

#[async_trait]
impl UsageLedger for RedisLedger {
    async fn get(&self, account: &AccountId) -> Result<u64, MeteringError> {
        let mut conn = self.connection.clone();
        let value: Option<u64> = conn.get(self.key(account)).await.map_err(unavailable)?;
        Ok(value.unwrap_or(0))
    }

    #[instrument(skip(self), fields(account = %account))]
    async fn increment(&self, account: &AccountId) -> Result<u64, MeteringError> {
        let key = self.key(account);
        let mut conn = self.connection.clone();
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&key, 1u64)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_secs())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(count)
    }

    #[instrument(skip(self), fields(account = %account, ceiling = %ceiling))]
    async fn increment_within(
        &self,
        account: &AccountId,
        ceiling: Ceiling,
    ) -> Result<IncrementOutcome, MeteringError> {
        let mut conn = self.connection.clone();
        let (counted, usage): (i64, u64) = self
            .script
            .key(self.key(account))
            .arg(ceiling_arg(ceiling))
            .arg(self.ttl_secs())
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(if counted == 1 {
            IncrementOutcome::Counted(usage)
        } else {
            IncrementOutcome::AtCeiling(usage)
        })
    }

    async fn reset(&self, account: &AccountId) -> Result<(), MeteringError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.key(account)).await.map_err(unavailable)
    }

    async fn reset_all(&self) -> Result<(), MeteringError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}:*", self.prefix);
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter: redis::AsyncIter<String> =
                conn.scan_match(&pattern).await.map_err(unavailable)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await.map_err(unavailable)?;
        }
        info!(removed = keys.len(), "Cleared all usage records");
        Ok(())
    }

    async fn roll_over(&self) -> Result<usize, MeteringError> {
        // Closed periods expire server-side.
        Ok(0)
    }

    fn current_period(&self) -> String {
        self.period.key_at(self.clock.now())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::ManualClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_usage_key_layout() {
        let account = AccountId::parse(Some("+15550008888")).unwrap();
        assert_eq!(
            usage_key("voixi:usage", "2026-10", &account),
            "voixi:usage:2026-10:+15550008888"
        );
    }

    #[test]
    fn test_ceiling_arg() {
        assert_eq!(ceiling_arg(Ceiling::Limited(500)), 500);
        assert_eq!(ceiling_arg(Ceiling::Unlimited), -1);
        assert_eq!(ceiling_arg(Ceiling::Limited(u64::MAX)), i64::MAX);
    }

    // Integration tests against a live server.
    // Run with: REDIS_URL=redis://127.0.0.1:6379 cargo test -p voixi-metering -- --ignored

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    fn october() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()))
    }

    /// Ledger under its own prefix with every key from earlier runs removed
    async fn ledger(name: &str, clock: Arc<ManualClock>) -> RedisLedger {
        let ledger = RedisLedger::connect(&redis_url(), BillingPeriod::Monthly)
            .await
            .unwrap()
            .with_prefix(&format!("voixi:test:{}", name))
            .with_clock(clock);
        ledger.reset_all().await.unwrap();
        ledger
    }

    fn account(id: &str) -> AccountId {
        AccountId::parse(Some(id)).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_increment_within_stops_at_ceiling() {
        let ledger = ledger("ceiling", october()).await;
        let a = account("+15550001234");

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
        assert_eq!(
            ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap(),
            IncrementOutcome::AtCeiling(3)
        );
        assert_eq!(ledger.get(&a).await.unwrap(), 3);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_unlimited_always_counts() {
        let ledger = ledger("unlimited", october()).await;
        let a = account("+15550009999");

        for expected in 1..=50 {
            assert_eq!(
                ledger.increment_within(&a, Ceiling::Unlimited).await.unwrap(),
                IncrementOutcome::Counted(expected)
            );
        }
        assert_eq!(ledger.get(&a).await.unwrap(), 50);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_increment_sets_expiry() {
        let ledger = ledger("increment", october()).await;
        let a = account("+15550001234");

        assert_eq!(ledger.increment(&a).await.unwrap(), 1);
        assert_eq!(ledger.increment(&a).await.unwrap(), 2);

        let mut conn = ledger.connection.clone();
        let ttl: i64 = redis::cmd("TTL")
            .arg(ledger.key(&a))
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(ttl > 0 && ttl <= ledger.ttl_secs());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires Redis"]
    async fn test_concurrent_increment_within_respects_ceiling() {
        let ledger = Arc::new(ledger("concurrent", october()).await);

        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .increment_within(&account("+15550001234"), Ceiling::Limited(50))
                        .await
                })
            })
            .collect();

        let counted = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(IncrementOutcome::Counted(_)))))
            .count();

        assert_eq!(counted, 50);
        assert_eq!(ledger.get(&account("+15550001234")).await.unwrap(), 50);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_reset_and_reset_all() {
        let ledger = ledger("reset", october()).await;
        let a = account("+15550001234");
        let b = account("+15550008888");

        ledger.increment(&a).await.unwrap();
        ledger.increment(&a).await.unwrap();
        ledger.increment(&b).await.unwrap();

        ledger.reset(&a).await.unwrap();
        assert_eq!(ledger.get(&a).await.unwrap(), 0);
        assert_eq!(ledger.get(&b).await.unwrap(), 1);

        ledger.reset_all().await.unwrap();
        assert_eq!(ledger.get(&b).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_new_period_starts_from_zero() {
        let clock = october();
        let ledger = ledger("rollover", clock.clone()).await;
        let a = account("+15550001234");

        for _ in 0..3 {
            ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap();
        }
        assert_eq!(
            ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap(),
            IncrementOutcome::AtCeiling(3)
        );

        clock.set(Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
        assert_eq!(ledger.current_period(), "2026-11");
        assert_eq!(ledger.get(&a).await.unwrap(), 0);
        assert_eq!(
            ledger.increment_within(&a, Ceiling::Limited(3)).await.unwrap(),
            IncrementOutcome::Counted(1)
        );
    }
}
