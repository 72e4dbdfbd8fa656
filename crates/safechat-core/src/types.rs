//! Core types for SafeChat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Safety category assigned to a message by the content classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Medical,
    Financial,
    Legal,
    Crisis,
    Safe,
}

impl Category {
    /// Severity rank used for escalation comparisons.
    ///
    /// Ordering: safe < financial/legal < medical < crisis.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Financial | Self::Legal => 1,
            Self::Medical => 2,
            Self::Crisis => 3,
        }
    }

    /// Whether this category requires any safety handling at all
    pub fn is_sensitive(&self) -> bool {
        !matches!(self, Self::Safe)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Financial => "financial",
            Self::Legal => "legal",
            Self::Crisis => "crisis",
            Self::Safe => "safe",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence level derived from the 0-100 confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Map a confidence score to its level.
    ///
    /// High >= 80, Medium 50-79, Low <= 49. These thresholds are documented
    /// externally and must not drift.
    pub fn from_score(score: f32) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Review priority tier assigned to a flagged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank: lower sorts first in the pending queue view
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Target moderator response time in minutes
    pub fn target_minutes(&self) -> u32 {
        match self {
            Self::Critical => 0,
            Self::High => 5,
            Self::Medium => 15,
            Self::Low => 60,
        }
    }
}

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Kind of personally identifiable information found in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    Email,
    Ssn,
    CreditCard,
    Phone,
    Address,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

/// How aggressively low-confidence responses are flagged for review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Strict,
    #[default]
    Moderate,
    Lenient,
}

impl SafetyLevel {
    /// Confidence score below which a response is flagged regardless of category
    pub fn flag_threshold(&self) -> f32 {
        match self {
            Self::Strict => 70.0,
            Self::Moderate => 50.0,
            Self::Lenient => 30.0,
        }
    }
}

/// Per-request settings supplied by the chat collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriageSettings {
    /// Flagging strictness
    #[serde(default)]
    pub safety_level: SafetyLevel,

    /// Whether to attach the learning-mode analysis to results
    #[serde(default = "default_true")]
    pub transparency: bool,

    /// Whether triage and decision events are recorded to audit/metrics
    #[serde(default = "default_true")]
    pub data_logging: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            safety_level: SafetyLevel::default(),
            transparency: true,
            data_logging: true,
        }
    }
}

/// Immutable record of one conversation turn after triage.
///
/// Created once by the orchestrator; moderation never mutates it (the final
/// response text after a moderator decision is a new value, the original is
/// preserved in the decision record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id
    pub id: Uuid,

    /// Conversation/session this turn belongs to
    pub conversation_id: String,

    /// Sender role
    pub role: Role,

    /// Message text, with any detected PII already redacted
    pub text: String,

    /// Safety category
    pub category: Category,

    /// Raw matched-category confidence proxy from the classifier (0.0-1.0)
    pub raw_confidence: f32,

    /// Response confidence score (0-100)
    pub confidence_score: f32,

    /// Level derived from the confidence score
    pub confidence_level: ConfidenceLevel,

    /// Whether this turn was flagged for human review
    pub flagged: bool,

    /// PII kinds detected in the original text (empty if none)
    pub pii_types: Vec<PiiKind>,

    /// Review priority, if flagged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Human-readable reason for the priority assignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,

    /// Target moderator response time in minutes (0 when unflagged)
    pub target_response_minutes: u32,

    /// When this turn was triaged
    pub timestamp: DateTime<Utc>,
}
