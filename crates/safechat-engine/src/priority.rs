//! Priority assignment for flagged messages
//!
//! The rules are checked in strict severity order and the first match wins,
//! so a crisis message is always Critical regardless of what else it trips.
//! A `None` result means the message is not flagged at all.

use safechat_classifiers::KeywordTables;
use safechat_core::{Category, ConfidenceLevel, Priority};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::ContextAnalysis;

/// Toxicity indicator count at or above which a message is escalated
const TOXICITY_FLAG_COUNT: usize = 2;

/// Outcome of a priority assessment for a flagged message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityDecision {
    pub priority: Priority,
    pub reason: String,
    pub target_minutes: u32,
}

impl PriorityDecision {
    fn new(priority: Priority, reason: impl Into<String>) -> Self {
        Self {
            priority,
            reason: reason.into(),
            target_minutes: priority.target_minutes(),
        }
    }
}

/// Assigns a review priority (or none) to a triaged message
pub struct PriorityCalculator {
    tables: Arc<KeywordTables>,
}

impl PriorityCalculator {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }

    /// Assess a message after classification, confidence scoring, and
    /// context analysis. Returns `None` when no rule applies.
    #[allow(clippy::too_many_arguments)]
    pub fn assess(
        &self,
        category: Category,
        confidence_level: ConfidenceLevel,
        confidence_score: f32,
        raw_confidence: f32,
        text: &str,
        toxicity_indicators: usize,
        analysis: &ContextAnalysis,
        flag_threshold: f32,
    ) -> Option<PriorityDecision> {
        let lower = text.to_lowercase();
        let contains_any =
            |terms: &[String]| terms.iter().any(|t| lower.contains(t.as_str()));

        if category == Category::Crisis {
            return Some(PriorityDecision::new(
                Priority::Critical,
                "Mental health crisis detected",
            ));
        }

        if category == Category::Medical {
            return Some(PriorityDecision::new(
                Priority::High,
                "Medical advice request requires professional oversight",
            ));
        }

        if category == Category::Legal {
            let reason = if contains_any(&self.tables.illegal_intent) {
                "Illegal activity inquiry detected"
            } else {
                "Legal advice request"
            };
            return Some(PriorityDecision::new(Priority::High, reason));
        }

        if analysis.risk_escalation && category.is_sensitive() {
            return Some(PriorityDecision::new(
                Priority::High,
                "Conversation risk escalation detected",
            ));
        }

        if toxicity_indicators >= TOXICITY_FLAG_COUNT {
            return Some(PriorityDecision::new(
                Priority::High,
                format!("High toxicity detected ({} indicators)", toxicity_indicators),
            ));
        }

        if category == Category::Financial {
            let reason = if confidence_score < 30.0 || raw_confidence < 0.3 {
                "High-risk financial advice with low confidence".to_string()
            } else if contains_any(&self.tables.high_risk_financial) {
                "High-risk financial advice detected".to_string()
            } else {
                "Financial advice request".to_string()
            };
            return Some(PriorityDecision::new(Priority::Medium, reason));
        }

        if confidence_level == ConfidenceLevel::Low {
            return Some(PriorityDecision::new(
                Priority::Medium,
                format!("Low confidence response ({:.0}%)", confidence_score),
            ));
        }

        if confidence_score < flag_threshold {
            return Some(PriorityDecision::new(
                Priority::Medium,
                format!(
                    "Confidence {:.0}% below safety threshold {:.0}%",
                    confidence_score, flag_threshold
                ),
            ));
        }

        if analysis.filter_bypass_attempt {
            return Some(PriorityDecision::new(
                Priority::Medium,
                "Possible filter bypass attempt",
            ));
        }

        if contains_any(&self.tables.controversial) {
            return Some(PriorityDecision::new(
                Priority::Medium,
                "Controversial historical topic",
            ));
        }

        if contains_any(&self.tables.political) {
            return Some(PriorityDecision::new(Priority::Low, "Political discussion"));
        }

        if contains_any(&self.tables.religious) {
            return Some(PriorityDecision::new(Priority::Low, "Religious topic"));
        }

        None
    }
}
