//! Call log
//!
//! Keeps recent inbound call attempts for the dashboard, newest evicting
//! oldest once the log is full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Default number of calls retained
pub const DEFAULT_CAPACITY: usize = 1000;

/// One inbound call attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: String,
    pub caller_number: Option<String>,
    pub business_number: String,
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Provider call status; `RINGING` until the first status callback
    pub status: String,
    pub duration_secs: Option<u32>,
}

impl CallRecord {
    pub fn ringing(
        id: String,
        caller_number: Option<String>,
        business_number: String,
        country: Option<String>,
    ) -> Self {
        Self {
            id,
            caller_number,
            business_number,
            country,
            timestamp: Utc::now(),
            status: "RINGING".to_string(),
            duration_secs: None,
        }
    }
}

/// Bounded in-memory call log
pub struct CallLog {
    calls: RwLock<HashMap<String, CallRecord>>,
    capacity: usize,
}

impl CallLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            calls: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, call: CallRecord) {
        let mut calls = self.calls.write().await;
        if calls.len() >= self.capacity && !calls.contains_key(&call.id) {
            let oldest = calls
                .values()
                .min_by_key(|c| c.timestamp)
                .map(|c| c.id.clone());
            if let Some(id) = oldest {
                calls.remove(&id);
            }
        }
        debug!(call_sid = %call.id, "Logged call");
        calls.insert(call.id.clone(), call);
    }

    /// Apply a status callback; returns false for unknown calls
    pub async fn update_status(&self, id: &str, status: &str, duration_secs: Option<u32>) -> bool {
        let mut calls = self.calls.write().await;
        match calls.get_mut(id) {
            Some(call) => {
                call.status = status.to_uppercase();
                if duration_secs.is_some() {
                    call.duration_secs = duration_secs;
                }
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, id: &str) -> Option<CallRecord> {
        self.calls.read().await.get(id).cloned()
    }

    /// Newest first
    pub async fn recent(&self, limit: usize) -> Vec<CallRecord> {
        let calls = self.calls.read().await;
        let mut all: Vec<_> = calls.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(limit);
        all
    }
}

impl Default for CallLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str) -> CallRecord {
        CallRecord::ringing(id.into(), Some("+15557654321".into()), "+15550001234".into(), Some("US".into()))
    }

    #[tokio::test]
    async fn test_status_update() {
        let log = CallLog::default();
        log.record(call("CA1")).await;

        assert!(log.update_status("CA1", "completed", Some(42)).await);
        let stored = log.get("CA1").await.unwrap();
        assert_eq!(stored.status, "COMPLETED");
        assert_eq!(stored.duration_secs, Some(42));

        assert!(!log.update_status("CA404", "completed", None).await);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let log = CallLog::new(2);
        let mut first = call("CA1");
        first.timestamp = Utc::now() - chrono::Duration::minutes(5);
        log.record(first).await;
        log.record(call("CA2")).await;
        log.record(call("CA3")).await;

        assert!(log.get("CA1").await.is_none());
        assert_eq!(log.recent(10).await.len(), 2);
    }
}
