#![allow(dead_code)] // Public surface is feature-gated at the crate root
//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! Implement [`MetricsSink`] to forward evaluation and reload events to any
//! backend (Prometheus, OpenTelemetry, a counter in a test). The sink is a
//! process-wide registration; it is invoked synchronously on the decision
//! path, so implementations must be cheap and must not block.
//!
//! Only available from the public API when the `observability` feature is
//! enabled; the engine records into the module unconditionally.

use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use once_cell::sync::Lazy;
use serde::Serialize;

/// Snapshot of one evaluation, passed to [`MetricsSink::on_evaluation`].
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats {
    /// Total wall-clock time for the decision.
    pub duration: Duration,
    /// Time spent narrowing candidates.
    pub retrieval: Duration,
    /// Time spent evaluating candidate rules.
    pub evaluation: Duration,
    /// Whether the decision permitted the action.
    pub allowed: bool,
    /// The requested action identifier.
    pub action: String,
    /// How many candidate policies were considered.
    pub candidates: usize,
}

/// Snapshot of one snapshot install, passed to [`MetricsSink::on_reload`].
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    /// When the reload completed.
    pub reload_time: SystemTime,
    /// Policies in the installed snapshot.
    pub policy_count: usize,
}

/// Consumer of engine metrics. Registered process-wide via [`set_sink`].
pub trait MetricsSink: Send + Sync {
    fn on_evaluation(&self, stats: &EvaluationStats);
    fn on_reload(&self, stats: &ReloadStats);
}

static SINK: Lazy<RwLock<Option<Arc<dyn MetricsSink>>>> = Lazy::new(|| RwLock::new(None));

/// Install the process-wide sink, replacing any previous registration.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    *SINK.write().expect("metrics sink lock poisoned") = Some(sink);
}

pub(crate) fn record_evaluation(stats: &EvaluationStats) {
    if let Some(sink) = SINK.read().expect("metrics sink lock poisoned").as_ref() {
        sink.on_evaluation(stats);
    }
}

pub(crate) fn record_reload(policy_count: usize) {
    if let Some(sink) = SINK.read().expect("metrics sink lock poisoned").as_ref() {
        sink.on_reload(&ReloadStats {
            reload_time: SystemTime::now(),
            policy_count,
        });
    }
}
