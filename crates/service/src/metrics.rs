//! Per-call metrics

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

/// Receives one record per finished call
pub trait MetricsSink: Send + Sync {
    fn record_call(&self, operation: &str, code: &str, duration: Duration);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_call(&self, _operation: &str, _code: &str, _duration: Duration) {}
}

#[derive(Debug, Default)]
struct OperationStats {
    outcomes: HashMap<String, u64>,
    /// Most recent durations in milliseconds, bounded by `max_samples`
    durations: Vec<f64>,
}

/// In-memory counters per operation and outcome code.
#[derive(Debug)]
pub struct CallMetrics {
    operations: Mutex<HashMap<String, OperationStats>>,
    /// Maximum samples to keep per operation (to prevent unbounded growth)
    max_samples: usize,
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CallMetrics {
    pub fn new() -> Self {
        Self {
            operations: Mutex::new(HashMap::new()),
            max_samples: 1000,
        }
    }

    /// Set the maximum number of duration samples kept per operation.
    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = max.max(1);
        self
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let operations = match self.operations.lock() {
            Ok(ops) => ops,
            Err(poisoned) => poisoned.into_inner(),
        };

        let operations = operations
            .iter()
            .map(|(name, stats)| {
                let calls = stats.outcomes.values().sum();
                let outcomes = stats
                    .outcomes
                    .iter()
                    .map(|(code, count)| (code.clone(), *count))
                    .collect();
                let mean_ms = if stats.durations.is_empty() {
                    0.0
                } else {
                    stats.durations.iter().sum::<f64>() / stats.durations.len() as f64
                };
                let max_ms = stats.durations.iter().copied().fold(0.0, f64::max);
                (
                    name.clone(),
                    OperationSnapshot {
                        calls,
                        outcomes,
                        mean_ms,
                        max_ms,
                    },
                )
            })
            .collect();

        MetricsSnapshot { operations }
    }
}

impl MetricsSink for CallMetrics {
    fn record_call(&self, operation: &str, code: &str, duration: Duration) {
        let mut operations = match self.operations.lock() {
            Ok(ops) => ops,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stats = operations.entry(operation.to_string()).or_default();
        *stats.outcomes.entry(code.to_string()).or_insert(0) += 1;

        stats.durations.push(duration.as_secs_f64() * 1000.0);
        if stats.durations.len() > self.max_samples {
            stats.durations.remove(0);
        }

        tracing::trace!(target: "service::metrics", operation, code, "recorded call");
    }
}

/// Serializable view of [`CallMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub operations: BTreeMap<String, OperationSnapshot>,
}

impl MetricsSnapshot {
    /// Calls of `operation` that ended with `code`
    pub fn count(&self, operation: &str, code: &str) -> u64 {
        self.operations
            .get(operation)
            .and_then(|op| op.outcomes.get(code))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationSnapshot {
    pub calls: u64,
    pub outcomes: BTreeMap<String, u64>,
    pub mean_ms: f64,
    pub max_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_outcome() {
        let metrics = CallMetrics::new();
        metrics.record_call("GenerateDocument", "ok", Duration::from_millis(10));
        metrics.record_call("GenerateDocument", "ok", Duration::from_millis(30));
        metrics.record_call("GenerateDocument", "cancelled", Duration::from_millis(5));
        metrics.record_call("ListPlaceholders", "unauthenticated", Duration::ZERO);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.count("GenerateDocument", "ok"), 2);
        assert_eq!(snapshot.count("GenerateDocument", "cancelled"), 1);
        assert_eq!(snapshot.count("ListPlaceholders", "unauthenticated"), 1);
        assert_eq!(snapshot.count("GenerateRendered", "ok"), 0);

        let doc = &snapshot.operations["GenerateDocument"];
        assert_eq!(doc.calls, 3);
        assert!((doc.max_ms - 30.0).abs() < 1e-9);
        assert!((doc.mean_ms - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_samples_bounded() {
        let metrics = CallMetrics::new().with_max_samples(2);
        for ms in [100, 1, 2] {
            metrics.record_call("op", "ok", Duration::from_millis(ms));
        }
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.operations["op"].calls, 3);
        assert!((snapshot.operations["op"].max_ms - 2.0).abs() < 1e-9);
    }
}
