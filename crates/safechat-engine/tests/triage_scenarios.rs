//! End-to-end triage scenarios against the full engine

use safechat_core::{Category, ConfidenceLevel, PiiKind, Priority, SafetyLevel, TriageSettings};
use safechat_engine::{
    ModeratorAction, RejectionReason, TriageEngine, TriageRequest, CONTEXT_CAPACITY,
};

fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn request(conversation_id: &str, text: &str, response: &str) -> TriageRequest {
    init_logging();
    TriageRequest {
        conversation_id: conversation_id.to_string(),
        text: text.to_string(),
        proposed_response: response.to_string(),
        settings: TriageSettings::default(),
    }
}

#[tokio::test]
async fn crisis_message_is_critical_and_immediate() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request(
            "s1",
            "I want to die",
            "Please reach out to someone you trust.",
        ))
        .await
        .unwrap();

    assert_eq!(result.message.category, Category::Crisis);
    assert_eq!(result.message.confidence_score, 15.0);
    assert_eq!(result.message.confidence_level, ConfidenceLevel::Low);
    assert_eq!(result.message.priority, Some(Priority::Critical));
    assert_eq!(result.message.target_response_minutes, 0);
    assert!(result.message.flagged);

    // Crisis lands at the head of the queue
    let pending = engine.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message.priority, Some(Priority::Critical));
}

#[tokio::test]
async fn medical_question_flags_high_with_medium_confidence() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request(
            "s1",
            "I have a headache",
            "Headaches are often caused by dehydration or stress.",
        ))
        .await
        .unwrap();

    assert_eq!(result.message.category, Category::Medical);
    assert!(result.message.confidence_score >= 60.0);
    assert!(result.message.confidence_score <= 85.0);
    assert_eq!(result.message.confidence_level, ConfidenceLevel::Medium);
    assert_eq!(result.message.priority, Some(Priority::High));
    assert_eq!(result.message.target_response_minutes, 5);
}

#[tokio::test]
async fn simple_factual_question_passes_unflagged() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request("s1", "What is 2+2?", "2+2 equals 4."))
        .await
        .unwrap();

    assert_eq!(result.message.category, Category::Safe);
    assert_eq!(result.message.confidence_score, 100.0);
    assert_eq!(result.message.confidence_level, ConfidenceLevel::High);
    assert!(!result.message.flagged);
    assert!(result.message.priority.is_none());
    assert!(engine.pending().is_empty());
}

#[tokio::test]
async fn email_address_is_redacted_everywhere() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request(
            "s1",
            "You can reach me at john@example.com about this",
            "Noted.",
        ))
        .await
        .unwrap();

    assert_eq!(result.message.pii_types, vec![PiiKind::Email]);
    assert!(!result.redacted_text().contains("john@example.com"));
    assert!(result.redacted_text().contains("[REDACTED]"));

    // Nothing downstream ever sees the raw address
    for event in engine.audit().events() {
        if let Some(data) = &event.data {
            assert!(!data.contains("john@example.com"));
        }
    }
}

#[tokio::test]
async fn symptom_escalation_across_turns() {
    let engine = TriageEngine::new().unwrap();

    let first = engine
        .triage(request("s1", "I have a headache", "Try resting."))
        .await
        .unwrap();
    assert!(!first.context.risk_escalation);

    let second = engine
        .triage(request(
            "s1",
            "Actually my chest feels tight",
            "That can have many causes.",
        ))
        .await
        .unwrap();

    assert!(second.context.risk_escalation);
    assert!(second
        .context
        .context_flags
        .iter()
        .any(|f| f.contains("Medical risk escalation")));
}

#[tokio::test]
async fn context_is_bounded_per_conversation() {
    let engine = TriageEngine::new().unwrap();

    for i in 0..(CONTEXT_CAPACITY + 1) {
        engine
            .triage(request("s1", &format!("message number {}", i), "Okay."))
            .await
            .unwrap();
    }

    let result = engine
        .triage(request("s1", "one more", "Okay."))
        .await
        .unwrap();

    // Only the most recent turns are surfaced; the oldest were evicted
    assert_eq!(result.context.previous_queries.len(), 3);
    assert_eq!(result.context.previous_queries[2].text, "message number 10");
}

#[tokio::test]
async fn conversations_do_not_leak_context() {
    let engine = TriageEngine::new().unwrap();

    engine
        .triage(request("s1", "I have a headache", "Try resting."))
        .await
        .unwrap();

    let other = engine
        .triage(request(
            "s2",
            "Actually my chest feels tight",
            "That can have many causes.",
        ))
        .await
        .unwrap();

    assert!(!other.context.risk_escalation);
    assert!(other.context.previous_queries.is_empty());
}

#[tokio::test]
async fn queue_orders_by_priority_then_arrival() {
    let engine = TriageEngine::new().unwrap();

    engine
        .triage(request("a", "what about the election results", "It depends."))
        .await
        .unwrap();
    engine
        .triage(request("b", "I have a headache", "Try resting."))
        .await
        .unwrap();
    engine
        .triage(request("c", "I feel hopeless and want to end it all", "Please seek help."))
        .await
        .unwrap();
    engine
        .triage(request("d", "do I need a lawyer", "Possibly."))
        .await
        .unwrap();

    let pending = engine.pending();
    let priorities: Vec<Priority> = pending
        .iter()
        .map(|e| e.message.priority.unwrap())
        .collect();

    assert_eq!(
        priorities,
        vec![
            Priority::Critical,
            Priority::High,
            Priority::High,
            Priority::Low
        ]
    );
    // FIFO within the High band: the medical turn arrived before the legal one
    assert_eq!(pending[1].message.category, Category::Medical);
    assert_eq!(pending[2].message.category, Category::Legal);
}

#[tokio::test]
async fn each_entry_resolves_exactly_once() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request("s1", "I have a headache", "Try resting."))
        .await
        .unwrap();
    let entry_id = result.queue_entry_id.unwrap();

    engine
        .submit_action(
            entry_id,
            ModeratorAction::RejectWithAlternative {
                alternative_text: "Please consult a healthcare professional.".to_string(),
                reason: RejectionReason::SafetyConcern,
                notes: None,
            },
            42,
        )
        .unwrap();

    let err = engine
        .submit_action(entry_id, ModeratorAction::Approve, 5)
        .unwrap_err();
    assert!(err.to_string().contains("already resolved"));

    assert!(engine.pending().is_empty());
    assert!(engine.audit().verify());
}

#[tokio::test]
async fn escalated_entry_remains_actionable() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request("s1", "I have a headache", "Try resting."))
        .await
        .unwrap();
    let entry_id = result.queue_entry_id.unwrap();

    let decision = engine
        .submit_action(entry_id, ModeratorAction::Escalate, 8)
        .unwrap();
    assert!(decision.final_response.ends_with("(Escalated to Admin)"));

    // Still visible to moderators and still accepts a terminal decision
    assert_eq!(engine.pending().len(), 1);
    engine
        .submit_action(entry_id, ModeratorAction::Approve, 3)
        .unwrap();
    assert!(engine.pending().is_empty());
}

#[tokio::test]
async fn strict_safety_level_flags_medium_confidence() {
    let engine = TriageEngine::new().unwrap();

    let mut req = request("s1", "do you think my favorite team is good", "Hard to say.");
    req.settings.safety_level = SafetyLevel::Strict;

    let result = engine.triage(req).await.unwrap();

    assert!(result.message.flagged);
    assert_eq!(result.message.priority, Some(Priority::Medium));
    assert!(result
        .message
        .escalation_reason
        .as_deref()
        .unwrap()
        .contains("safety threshold"));
}

#[tokio::test]
async fn transparency_attaches_learning_analysis() {
    let engine = TriageEngine::new().unwrap();

    let result = engine
        .triage(request("s1", "I have a headache", "Try resting."))
        .await
        .unwrap();

    let learning = result.learning.unwrap();
    assert_eq!(learning.risk_category, "medical");
    assert!(learning
        .triggered_guardrails
        .contains(&"medical_advice_detection".to_string()));
    assert!(learning.human_review_reason.is_some());
}

#[tokio::test]
async fn metrics_track_flag_volume() {
    let engine = TriageEngine::new().unwrap();

    engine
        .triage(request("a", "What is 2+2?", "4."))
        .await
        .unwrap();
    engine
        .triage(request("b", "I have a headache", "Rest."))
        .await
        .unwrap();

    let snapshot = engine.metrics().snapshot();
    assert_eq!(snapshot.messages_triaged, 2);
    assert_eq!(snapshot.messages_flagged, 1);
    assert_eq!(snapshot.flagged_high, 1);
    assert_eq!(snapshot.flag_rate(), 0.5);
}
