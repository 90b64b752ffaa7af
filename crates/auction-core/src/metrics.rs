//! Prometheus metrics for the transaction lifecycle

use crate::types::TxStage;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Lifecycle counters on a registry owned by this struct, so several
/// instances (one per test) never collide on registration.
pub struct LifecycleMetrics {
    registry: Registry,
    /// Transactions that reached each stage
    pub stage_transitions: IntCounterVec,
    /// Terminal failures by error kind
    pub failures: IntCounterVec,
    /// Broadcast-to-receipt latency
    pub confirmation_latency: Histogram,
    /// Read-only contract calls by function
    pub contract_calls: IntCounterVec,
}

impl LifecycleMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("auction".to_string()), None)?;

        let stage_transitions = IntCounterVec::new(
            Opts::new("tx_stage_total", "Transactions that reached a lifecycle stage"),
            &["stage"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new("tx_failures_total", "Lifecycle failures by kind"),
            &["kind"],
        )?;
        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "tx_confirmation_seconds",
                "Time from broadcast to receipt",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;
        let contract_calls = IntCounterVec::new(
            Opts::new("contract_calls_total", "Read-only contract calls"),
            &["function"],
        )?;

        registry.register(Box::new(stage_transitions.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;
        registry.register(Box::new(contract_calls.clone()))?;

        Ok(Self {
            registry,
            stage_transitions,
            failures,
            confirmation_latency,
            contract_calls,
        })
    }

    pub fn record_stage(&self, stage: TxStage) {
        self.stage_transitions
            .with_label_values(&[stage.as_str()])
            .inc();
    }

    pub fn record_failure(&self, kind: &str) {
        self.failures.with_label_values(&[kind]).inc();
    }

    pub fn observe_confirmation(&self, elapsed: Duration) {
        self.confirmation_latency.observe(elapsed.as_secs_f64());
    }

    pub fn record_call(&self, function: &str) {
        self.contract_calls.with_label_values(&[function]).inc();
    }

    pub fn stage_count(&self, stage: TxStage) -> u64 {
        self.stage_transitions
            .with_label_values(&[stage.as_str()])
            .get()
    }

    /// Render the registry in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
