//! SafeChat Telemetry
//!
//! Hash-chained audit trail and in-process metrics for the triage engine.
//! The audit log gives the moderation workflow a tamper-evident record of
//! every triage outcome and moderator decision; the metrics collector feeds
//! external statistics reporting.

pub mod audit;
pub mod metrics;

pub use audit::{AuditEvent, AuditEventKind, AuditLog, AuditSeverity};
pub use metrics::{MetricsCollector, MetricsSnapshot};
