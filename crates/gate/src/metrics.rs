//! Prometheus metrics

use prometheus::{IntCounter, Opts, Registry};

/// Authentication counters
#[derive(Clone)]
pub struct AuthMetrics {
    pub attempts: IntCounter,
    pub failures: IntCounter,
    pub rebinds: IntCounter,
    pub fallbacks: IntCounter,
}

impl AuthMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let attempts = IntCounter::with_opts(Opts::new(
            "gatelink_auth_attempts_total",
            "Total authenticate messages received",
        ))?;

        let failures = IntCounter::with_opts(Opts::new(
            "gatelink_auth_failures_total",
            "Total authenticate messages rejected",
        ))?;

        let rebinds = IntCounter::with_opts(Opts::new(
            "gatelink_auth_rebinds_total",
            "Total connections rebound to an authenticated identity",
        ))?;

        let fallbacks = IntCounter::with_opts(Opts::new(
            "gatelink_auth_fallbacks_total",
            "Total rebinds refused by the registry, credentials stored instead",
        ))?;

        Ok(Self {
            attempts,
            failures,
            rebinds,
            fallbacks,
        })
    }

    /// Register all counters
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.attempts.clone()))?;
        registry.register(Box::new(self.failures.clone()))?;
        registry.register(Box::new(self.rebinds.clone()))?;
        registry.register(Box::new(self.fallbacks.clone()))?;
        Ok(())
    }
}
