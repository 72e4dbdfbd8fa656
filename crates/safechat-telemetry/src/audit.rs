//! Hash-chained audit trail for triage and moderation events

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use safechat_core::Priority;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Append-only audit log with hash-chained events for tamper detection.
///
/// Safe to share across threads; appends serialize on an internal lock.
pub struct AuditLog {
    inner: Mutex<Chain>,
}

struct Chain {
    events: Vec<AuditEvent>,
    chain_hash: Option<String>,
}

impl AuditLog {
    /// Create a new empty audit log
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Chain {
                events: Vec::new(),
                chain_hash: None,
            }),
        }
    }

    /// Append an event, chaining it to the previous one
    pub fn record(&self, event: AuditEvent) {
        let mut chain = self.inner.lock();

        let mut event = event;
        event.previous_hash = chain.chain_hash.clone();

        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());

        chain.chain_hash = Some(hash);
        chain.events.push(event);
    }

    /// Verify the integrity of the full chain
    pub fn verify(&self) -> bool {
        let chain = self.inner.lock();
        let mut prev_hash: Option<String> = None;

        for event in &chain.events {
            if event.previous_hash != prev_hash {
                return false;
            }

            let computed = compute_hash(event);
            if event.hash.as_ref() != Some(&computed) {
                return false;
            }

            prev_hash = event.hash.clone();
        }

        true
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_hash(event: &AuditEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.kind.as_str().as_bytes());
    if let Some(ref data) = event.data {
        hasher.update(data.as_bytes());
    }
    hasher.update(event.timestamp.to_rfc3339().as_bytes());
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// A single event in the audit chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What happened
    pub kind: AuditEventKind,

    /// Event payload (JSON serialized)
    pub data: Option<String>,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Hash of this event
    pub hash: Option<String>,

    /// Hash of the previous event (for chaining)
    pub previous_hash: Option<String>,

    /// Severity level
    pub severity: AuditSeverity,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(kind: AuditEventKind) -> Self {
        Self {
            kind,
            data: None,
            timestamp: Utc::now(),
            hash: None,
            previous_hash: None,
            severity: AuditSeverity::Info,
        }
    }

    /// Attach a serializable payload
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_string(&data).ok();
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Kinds of auditable events emitted by the triage engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    MessageTriaged,
    MessageFlagged,
    PiiRedacted,
    ModeratorDecision,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageTriaged => "message_triaged",
            Self::MessageFlagged => "message_flagged",
            Self::PiiRedacted => "pii_redacted",
            Self::ModeratorDecision => "moderator_decision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    High,
    Critical,
}

impl From<Priority> for AuditSeverity {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Critical => Self::Critical,
            Priority::High => Self::High,
            Priority::Medium => Self::Warning,
            Priority::Low => Self::Info,
        }
    }
}
