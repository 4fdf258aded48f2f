//! Prometheus counters for admission decisions

/// Admission gate metrics
pub struct GateMetrics {
    pub admitted: prometheus::IntCounter,
    pub rejected: prometheus::IntCounter,
    pub fail_open_admitted: prometheus::IntCounter,
    pub missing_account: prometheus::IntCounter,
    pub ledger_errors: prometheus::IntCounter,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self {
            admitted: prometheus::IntCounter::new(
                "voixi_gate_admitted_total",
                "Inbound events admitted after a usage check",
            )
            .expect("valid metric"),
            rejected: prometheus::IntCounter::new(
                "voixi_gate_rejected_total",
                "Inbound events rejected at the tier ceiling",
            )
            .expect("valid metric"),
            fail_open_admitted: prometheus::IntCounter::new(
                "voixi_gate_fail_open_total",
                "Inbound events admitted because the check itself failed",
            )
            .expect("valid metric"),
            missing_account: prometheus::IntCounter::new(
                "voixi_gate_missing_account_total",
                "Inbound events without an account identifier",
            )
            .expect("valid metric"),
            ledger_errors: prometheus::IntCounter::new(
                "voixi_gate_internal_errors_total",
                "Ledger or tier lookup failures during admission",
            )
            .expect("valid metric"),
        }
    }

    pub fn register(&self, registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.admitted.clone()))?;
        registry.register(Box::new(self.rejected.clone()))?;
        registry.register(Box::new(self.fail_open_admitted.clone()))?;
        registry.register(Box::new(self.missing_account.clone()))?;
        registry.register(Box::new(self.ledger_errors.clone()))?;
        Ok(())
    }
}

impl Default for GateMetrics {
    fn default() -> Self {
        Self::new()
    }
}
