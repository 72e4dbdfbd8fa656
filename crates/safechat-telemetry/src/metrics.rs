//! Triage metrics collection and reporting

use safechat_core::Priority;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for triage throughput and flagging statistics.
///
/// Counters are atomic; `snapshot()` is the read surface consumed by
/// external statistics reporting.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    messages_triaged: AtomicU64,
    messages_flagged: AtomicU64,
    pii_detections: AtomicU64,
    crisis_detections: AtomicU64,
    flagged_critical: AtomicU64,
    flagged_high: AtomicU64,
    flagged_medium: AtomicU64,
    flagged_low: AtomicU64,
    decisions_recorded: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                messages_triaged: AtomicU64::new(0),
                messages_flagged: AtomicU64::new(0),
                pii_detections: AtomicU64::new(0),
                crisis_detections: AtomicU64::new(0),
                flagged_critical: AtomicU64::new(0),
                flagged_high: AtomicU64::new(0),
                flagged_medium: AtomicU64::new(0),
                flagged_low: AtomicU64::new(0),
                decisions_recorded: AtomicU64::new(0),
            }),
        }
    }

    /// Record a triaged message
    pub fn record_triaged(&self) {
        self.inner.messages_triaged.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flagged message at its priority
    pub fn record_flagged(&self, priority: Priority) {
        self.inner.messages_flagged.fetch_add(1, Ordering::Relaxed);
        let counter = match priority {
            Priority::Critical => &self.inner.flagged_critical,
            Priority::High => &self.inner.flagged_high,
            Priority::Medium => &self.inner.flagged_medium,
            Priority::Low => &self.inner.flagged_low,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message containing PII
    pub fn record_pii_detection(&self) {
        self.inner.pii_detections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a crisis classification
    pub fn record_crisis_detection(&self) {
        self.inner.crisis_detections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a moderator decision
    pub fn record_decision(&self) {
        self.inner.decisions_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_triaged: self.inner.messages_triaged.load(Ordering::Relaxed),
            messages_flagged: self.inner.messages_flagged.load(Ordering::Relaxed),
            pii_detections: self.inner.pii_detections.load(Ordering::Relaxed),
            crisis_detections: self.inner.crisis_detections.load(Ordering::Relaxed),
            flagged_critical: self.inner.flagged_critical.load(Ordering::Relaxed),
            flagged_high: self.inner.flagged_high.load(Ordering::Relaxed),
            flagged_medium: self.inner.flagged_medium.load(Ordering::Relaxed),
            flagged_low: self.inner.flagged_low.load(Ordering::Relaxed),
            decisions_recorded: self.inner.decisions_recorded.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_triaged: u64,
    pub messages_flagged: u64,
    pub pii_detections: u64,
    pub crisis_detections: u64,
    pub flagged_critical: u64,
    pub flagged_high: u64,
    pub flagged_medium: u64,
    pub flagged_low: u64,
    pub decisions_recorded: u64,
}

impl MetricsSnapshot {
    /// Fraction of triaged messages that were flagged
    pub fn flag_rate(&self) -> f64 {
        if self.messages_triaged == 0 {
            0.0
        } else {
            self.messages_flagged as f64 / self.messages_triaged as f64
        }
    }

    /// Flagged entries still awaiting a decision
    pub fn pending_decisions(&self) -> u64 {
        self.messages_flagged.saturating_sub(self.decisions_recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        metrics.record_triaged();
        metrics.record_triaged();
        metrics.record_flagged(Priority::Critical);
        metrics.record_crisis_detection();
        metrics.record_decision();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_triaged, 2);
        assert_eq!(snapshot.messages_flagged, 1);
        assert_eq!(snapshot.flagged_critical, 1);
        assert_eq!(snapshot.flag_rate(), 0.5);
        assert_eq!(snapshot.pending_decisions(), 0);
    }

    #[test]
    fn test_empty_rates() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.flag_rate(), 0.0);
    }
}
