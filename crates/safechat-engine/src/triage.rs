//! Triage orchestrator
//!
//! Runs the full pipeline for one user turn: PII redaction, category
//! classification, confidence scoring, toxicity signal, context analysis,
//! priority assignment, and (when flagged) enqueueing for human review.
//!
//! Raw message text never leaves this function: classification, context
//! tracking, queueing, and audit all see the redacted text only.

use std::sync::Arc;

use safechat_classifiers::{
    Classifier, ConfidenceReport, ConfidenceScorer, ContentClassifier, KeywordTables, PiiDetector,
    PiiScan, ToxicityClassifier,
};
use safechat_core::{Category, Message, Result, Role, TriageSettings};
use safechat_telemetry::{AuditEvent, AuditEventKind, AuditLog, MetricsCollector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{ContextAnalysis, ContextTracker};
use crate::learning::LearningAnalysis;
use crate::priority::PriorityCalculator;
use crate::queue::{ModerationQueue, ModeratorAction, ModeratorDecision, QueueEntry};

/// One user turn submitted for triage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRequest {
    pub conversation_id: String,
    pub text: String,

    /// The response the assistant proposes to send; moderators review this
    pub proposed_response: String,

    #[serde(default)]
    pub settings: TriageSettings,
}

/// Outcome of triaging one turn
#[derive(Debug, Clone, Serialize)]
pub struct TriageResult {
    pub message: Message,
    pub proposed_response: String,
    pub context: ContextAnalysis,

    /// Set when the message was flagged and enqueued
    pub queue_entry_id: Option<Uuid>,

    /// Set when transparency is enabled
    pub learning: Option<LearningAnalysis>,
}

impl TriageResult {
    /// The message text after PII redaction
    pub fn redacted_text(&self) -> &str {
        &self.message.text
    }
}

/// The triage engine ties the classification stages, context tracker,
/// moderation queue, and telemetry together.
pub struct TriageEngine {
    content: Arc<ContentClassifier>,
    pii: PiiDetector,
    toxicity: ToxicityClassifier,
    confidence: ConfidenceScorer,
    priority: PriorityCalculator,
    context: ContextTracker,
    queue: Arc<ModerationQueue>,
    audit: Arc<AuditLog>,
    metrics: MetricsCollector,
}

impl TriageEngine {
    /// Build an engine with the compiled default keyword tables
    pub fn new() -> Result<Self> {
        Self::with_tables(KeywordTables::default())
    }

    /// Build an engine with custom keyword tables
    pub fn with_tables(tables: KeywordTables) -> Result<Self> {
        let tables = Arc::new(tables);
        let content = Arc::new(ContentClassifier::new(&tables)?);

        Ok(Self {
            toxicity: ToxicityClassifier::new(&tables),
            pii: PiiDetector::new()?,
            confidence: ConfidenceScorer::new()?,
            priority: PriorityCalculator::new(tables.clone()),
            context: ContextTracker::new(content.clone(), tables),
            content,
            queue: Arc::new(ModerationQueue::new()),
            audit: Arc::new(AuditLog::new()),
            metrics: MetricsCollector::new(),
        })
    }

    /// Run the full triage pipeline for one user turn.
    pub async fn triage(&self, request: TriageRequest) -> Result<TriageResult> {
        let settings = &request.settings;

        let scan = self.pii.scan(&request.text);
        let redacted = scan.redacted.clone();

        let classification = self.content.classify(&redacted).await?;
        let category = classification.category;
        let raw_confidence = classification.score;
        let keyword_hits = classification.metadata.matched.len();

        if category == Category::Crisis {
            tracing::warn!(
                conversation_id = %request.conversation_id,
                "crisis content detected"
            );
        }

        let report =
            self.confidence
                .score(&redacted, &request.proposed_response, category);

        let toxicity = self.toxicity.classify(&redacted).await?;
        let toxicity_indicators = toxicity.metadata.matched.len();

        let analysis =
            self.context
                .observe(&request.conversation_id, &redacted, category, keyword_hits);

        let decision = self.priority.assess(
            category,
            report.level,
            report.score,
            raw_confidence,
            &redacted,
            toxicity_indicators,
            &analysis,
            settings.safety_level.flag_threshold(),
        );

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: request.conversation_id.clone(),
            role: Role::User,
            text: redacted,
            category,
            raw_confidence,
            confidence_score: report.score,
            confidence_level: report.level,
            flagged: decision.is_some(),
            pii_types: scan.kinds.clone(),
            priority: decision.as_ref().map(|d| d.priority),
            escalation_reason: decision.as_ref().map(|d| d.reason.clone()),
            target_response_minutes: decision.as_ref().map(|d| d.target_minutes).unwrap_or(0),
            timestamp: chrono::Utc::now(),
        };

        // Crisis content is always recorded, whatever the logging setting
        if settings.data_logging || category == Category::Crisis {
            self.record_triage(&message, &scan, &report);
        }

        let queue_entry_id = if message.flagged {
            Some(
                self.queue
                    .enqueue(message.clone(), request.proposed_response.clone())?,
            )
        } else {
            None
        };

        let learning = settings
            .transparency
            .then(|| LearningAnalysis::build(category, &scan, &report, &analysis));

        tracing::debug!(
            conversation_id = %message.conversation_id,
            category = %message.category,
            confidence = message.confidence_score,
            flagged = message.flagged,
            "triage complete"
        );

        Ok(TriageResult {
            message,
            proposed_response: request.proposed_response,
            context: analysis,
            queue_entry_id,
            learning,
        })
    }

    fn record_triage(&self, message: &Message, scan: &PiiScan, report: &ConfidenceReport) {
        self.metrics.record_triaged();

        if !scan.is_clean() {
            self.metrics.record_pii_detection();
            self.audit.record(
                AuditEvent::new(AuditEventKind::PiiRedacted).with_data(serde_json::json!({
                    "message_id": message.id,
                    "kinds": scan.kinds,
                })),
            );
        }

        if message.category == Category::Crisis {
            self.metrics.record_crisis_detection();
        }

        self.audit.record(
            AuditEvent::new(AuditEventKind::MessageTriaged).with_data(serde_json::json!({
                "message_id": message.id,
                "category": message.category,
                "confidence_score": report.score,
                "flagged": message.flagged,
            })),
        );

        if let Some(priority) = message.priority {
            self.metrics.record_flagged(priority);
            self.audit.record(
                AuditEvent::new(AuditEventKind::MessageFlagged)
                    .with_severity(priority.into())
                    .with_data(serde_json::json!({
                        "message_id": message.id,
                        "priority": priority,
                        "reason": message.escalation_reason,
                    })),
            );
        }
    }

    /// Entries awaiting moderator review, highest priority first
    pub fn pending(&self) -> Vec<QueueEntry> {
        self.queue.pending()
    }

    /// Apply a moderator action to a queued entry and record the decision
    pub fn submit_action(
        &self,
        entry_id: Uuid,
        action: ModeratorAction,
        review_duration_seconds: u64,
    ) -> Result<ModeratorDecision> {
        let decision = self.queue.submit(entry_id, action, review_duration_seconds)?;

        self.metrics.record_decision();
        self.audit.record(
            AuditEvent::new(AuditEventKind::ModeratorDecision).with_data(serde_json::json!({
                "decision_id": decision.id,
                "entry_id": decision.entry_id,
                "action": decision.action,
            })),
        );

        Ok(decision)
    }

    pub fn queue(&self) -> &ModerationQueue {
        &self.queue
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safechat_core::{ConfidenceLevel, Priority};

    fn request(conversation_id: &str, text: &str) -> TriageRequest {
        TriageRequest {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
            proposed_response: "Here is a helpful answer.".to_string(),
            settings: TriageSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_safe_factual_message_passes_through() {
        let engine = TriageEngine::new().unwrap();
        let result = engine.triage(request("c1", "What is 2+2?")).await.unwrap();

        assert_eq!(result.message.category, Category::Safe);
        assert_eq!(result.message.confidence_score, 100.0);
        assert_eq!(result.message.confidence_level, ConfidenceLevel::High);
        assert!(!result.message.flagged);
        assert!(result.queue_entry_id.is_none());
        assert!(engine.pending().is_empty());
    }

    #[tokio::test]
    async fn test_crisis_message_flags_critical() {
        let engine = TriageEngine::new().unwrap();
        let result = engine
            .triage(request("c1", "I feel hopeless and I want to die"))
            .await
            .unwrap();

        assert_eq!(result.message.category, Category::Crisis);
        assert_eq!(result.message.priority, Some(Priority::Critical));
        assert_eq!(result.message.target_response_minutes, 0);
        assert!(result.message.flagged);
        assert!(result.queue_entry_id.is_some());
    }

    #[tokio::test]
    async fn test_pii_redacted_before_anything_else() {
        let engine = TriageEngine::new().unwrap();
        let result = engine
            .triage(request("c1", "My email is jane@example.com"))
            .await
            .unwrap();

        assert!(!result.redacted_text().contains("jane@example.com"));
        assert!(result.redacted_text().contains("[REDACTED]"));
        assert_eq!(result.message.pii_types, vec![safechat_core::PiiKind::Email]);
    }

    #[tokio::test]
    async fn test_transparency_off_skips_learning() {
        let engine = TriageEngine::new().unwrap();
        let mut req = request("c1", "hello there");
        req.settings.transparency = false;

        let result = engine.triage(req).await.unwrap();
        assert!(result.learning.is_none());
    }

    #[tokio::test]
    async fn test_data_logging_off_skips_metrics_except_crisis() {
        let engine = TriageEngine::new().unwrap();

        let mut quiet = request("c1", "hello there");
        quiet.settings.data_logging = false;
        engine.triage(quiet).await.unwrap();
        assert_eq!(engine.metrics().snapshot().messages_triaged, 0);
        assert!(engine.audit().is_empty());

        let mut crisis = request("c1", "I want to end my life");
        crisis.settings.data_logging = false;
        engine.triage(crisis).await.unwrap();

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.messages_triaged, 1);
        assert_eq!(snapshot.crisis_detections, 1);
        assert!(!engine.audit().is_empty());
    }

    #[tokio::test]
    async fn test_moderator_decision_recorded() {
        let engine = TriageEngine::new().unwrap();
        let result = engine
            .triage(request("c1", "I have a headache, what should I take?"))
            .await
            .unwrap();

        let entry_id = result.queue_entry_id.unwrap();
        let decision = engine
            .submit_action(entry_id, ModeratorAction::Approve, 20)
            .unwrap();

        assert!(decision.final_response.ends_with("(Approved)"));
        assert_eq!(engine.metrics().snapshot().decisions_recorded, 1);
        assert!(engine.audit().verify());
    }
}
