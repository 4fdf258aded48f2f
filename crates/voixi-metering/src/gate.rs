//! Admission Gate
//!
//! The single decision point for inbound events. For each event it resolves the
//! account's tier, then asks the ledger to count the event if usage is below the
//! tier ceiling. Events at the ceiling are rejected and leave usage unchanged.
//!
//! When the tier lookup or the ledger fails, the gate's `fail_open` flag decides:
//! admit the event uncounted (the default, favouring availability over billing
//! accuracy) or surface [`MeteringError::LedgerUnavailable`]. An event without an
//! account identifier is always an error.

use crate::ledger::{IncrementOutcome, UsageLedger};
use crate::metrics::GateMetrics;
use crate::policy::TierResolver;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use voixi_common::{
    AccountId, Admission, AdmissionDecision, Ceiling, MeteringError, RejectReason, Tier,
};
use voixi_notify::{templates, NotificationDispatcher};

/// An inbound event awaiting admission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// Account the event is billed to
    pub account: Option<String>,
    /// Party that originated the event, reachable for decline notices
    pub caller: Option<String>,
}

impl InboundEvent {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }
}

/// Current standing of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub account: AccountId,
    pub tier: Tier,
    pub usage: u64,
    /// `null` when unlimited
    #[serde(serialize_with = "ceiling_limit")]
    pub ceiling: Ceiling,
    pub remaining: Option<u64>,
    pub period: String,
}

fn ceiling_limit<S: serde::Serializer>(ceiling: &Ceiling, serializer: S) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&ceiling.limit(), serializer)
}

/// Usage-metering admission gate
pub struct AdmissionGate {
    ledger: Arc<dyn UsageLedger>,
    resolver: Arc<dyn TierResolver>,
    fail_open: bool,
    decline_notices: Option<DeclineNotices>,
    metrics: Arc<GateMetrics>,
}

/// SMS sent to callers on reject
struct DeclineNotices {
    dispatcher: NotificationDispatcher,
    message: String,
}

impl AdmissionGate {
    /// Gate that fails open
    pub fn new(ledger: Arc<dyn UsageLedger>, resolver: Arc<dyn TierResolver>) -> Self {
        Self {
            ledger,
            resolver,
            fail_open: true,
            decline_notices: None,
            metrics: Arc::new(GateMetrics::new()),
        }
    }

    /// Choose what happens when the check itself fails
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Text callers `message` when their event is rejected
    pub fn with_decline_notices(
        mut self,
        dispatcher: NotificationDispatcher,
        message: impl Into<String>,
    ) -> Self {
        self.decline_notices = Some(DeclineNotices {
            dispatcher,
            message: message.into(),
        });
        self
    }

    pub fn fail_open(&self) -> bool {
        self.fail_open
    }

    pub fn ledger(&self) -> &Arc<dyn UsageLedger> {
        &self.ledger
    }

    pub fn metrics(&self) -> Arc<GateMetrics> {
        self.metrics.clone()
    }

    /// Decide whether an event may proceed, counting it if so
    #[instrument(skip(self, event), fields(account = ?event.account))]
    pub async fn check(&self, event: &InboundEvent) -> Result<AdmissionDecision, MeteringError> {
        let account = match AccountId::parse(event.account.as_deref()) {
            Ok(account) => account,
            Err(e) => {
                self.metrics.missing_account.inc();
                warn!("Rejecting inbound event without account identifier");
                return Err(e);
            }
        };

        let tier = match self.resolver.resolve(&account) {
            Ok(tier) => tier,
            Err(e) => return self.internal_failure(account, Tier::most_restrictive(), e),
        };
        let ceiling = self.resolver.ceiling(tier);

        match self.ledger.increment_within(&account, ceiling).await {
            Ok(IncrementOutcome::Counted(usage)) => {
                info!(account = %account, tier = %tier, usage, ceiling = %ceiling, "Admitted");
                self.metrics.admitted.inc();
                Ok(AdmissionDecision::Admit(Admission {
                    account,
                    tier,
                    usage: Some(usage),
                    fail_open: false,
                }))
            }
            Ok(IncrementOutcome::AtCeiling(usage)) => {
                let reason = RejectReason::CeilingExceeded {
                    tier,
                    ceiling: ceiling.limit().unwrap_or(usage),
                    usage,
                };
                warn!(account = %account, tier = %tier, usage, "Ceiling exceeded, rejecting");
                self.metrics.rejected.inc();
                self.send_decline_notice(event.caller.as_deref(), &reason);
                Ok(AdmissionDecision::Reject(reason))
            }
            Err(e) => self.internal_failure(account, tier, e),
        }
    }

    /// Read an account's standing without counting anything
    pub async fn usage(&self, account: &AccountId) -> Result<UsageSnapshot, MeteringError> {
        let tier = self.resolver.resolve(account)?;
        let ceiling = self.resolver.ceiling(tier);
        let usage = self.ledger.get(account).await?;

        Ok(UsageSnapshot {
            account: account.clone(),
            tier,
            usage,
            ceiling,
            remaining: ceiling.remaining(usage),
            period: self.ledger.current_period(),
        })
    }

    fn internal_failure(
        &self,
        account: AccountId,
        tier: Tier,
        err: MeteringError,
    ) -> Result<AdmissionDecision, MeteringError> {
        self.metrics.ledger_errors.inc();
        error!(account = %account, error = %err, "Admission check failed");

        if !self.fail_open {
            return Err(match err {
                MeteringError::LedgerUnavailable(_) => err,
                other => MeteringError::LedgerUnavailable(other.to_string()),
            });
        }

        warn!(account = %account, "Failing open, admitting uncounted event");
        self.metrics.fail_open_admitted.inc();
        Ok(AdmissionDecision::Admit(Admission {
            account,
            tier,
            usage: None,
            fail_open: true,
        }))
    }

    fn send_decline_notice(&self, caller: Option<&str>, reason: &RejectReason) {
        if let (Some(notices), Some(caller)) = (&self.decline_notices, caller) {
            debug!(caller, %reason, "Sending decline notice");
            // Detached: the decision never waits on delivery.
            drop(
                notices
                    .dispatcher
                    .dispatch(caller, templates::call_declined(&notices.message)),
            );
        }
    }
}
