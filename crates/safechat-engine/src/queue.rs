//! Moderation queue and decision state machine
//!
//! Flagged messages wait here for a human decision. Each entry resolves
//! exactly once; resolved entries stay in the map so decisions remain
//! queryable, but they drop out of the pending view.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use safechat_core::{Error, Message, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Canned response sent to the user when a moderator asks for more detail
pub const CLARIFICATION_PROMPT: &str =
    "Can you provide more details about your situation? This will help me give you a more accurate response.";

/// Lifecycle state of a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Approved,
    Edited,
    Rejected,
    ClarificationRequested,
    Escalated,
}

impl EntryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Edited => "edited",
            Self::Rejected => "rejected",
            Self::ClarificationRequested => "clarification_requested",
            Self::Escalated => "escalated",
        }
    }

    /// Whether a moderator can still act on the entry
    fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending | Self::Escalated)
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a response was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Inaccurate,
    Inappropriate,
    Incomplete,
    SafetyConcern,
    Other,
}

/// What a moderator chose to do with a pending entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModeratorAction {
    /// Release the proposed response unchanged
    Approve,

    /// Release a corrected response
    EditAndApprove {
        edited_text: String,
        notes: Option<String>,
    },

    /// Withhold the proposed response and send an alternative
    RejectWithAlternative {
        alternative_text: String,
        reason: RejectionReason,
        notes: Option<String>,
    },

    /// Ask the user for more detail instead of answering
    RequestClarification,

    /// Hand the entry to an administrator; it stays actionable
    Escalate,
}

impl ModeratorAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Approve => ActionKind::Approve,
            Self::EditAndApprove { .. } => ActionKind::Edit,
            Self::RejectWithAlternative { .. } => ActionKind::Reject,
            Self::RequestClarification => ActionKind::Clarify,
            Self::Escalate => ActionKind::Escalate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Edit,
    Reject,
    Clarify,
    Escalate,
}

/// Record of one moderator decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeratorDecision {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub action: ActionKind,
    pub original_response: String,
    pub final_response: String,
    pub rejection_reason: Option<RejectionReason>,
    pub notes: Option<String>,
    pub review_duration_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// One flagged message awaiting (or past) review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: Uuid,
    pub message: Message,
    pub proposed_response: String,
    pub state: EntryState,
    pub enqueued_at: DateTime<Utc>,

    /// Monotonic tiebreaker for entries enqueued at the same instant
    pub seq: u64,
}

/// Thread-safe moderation queue.
///
/// Entries are independently locked so concurrent decisions on different
/// entries never contend.
pub struct ModerationQueue {
    entries: RwLock<HashMap<Uuid, Arc<Mutex<QueueEntry>>>>,
    next_seq: AtomicU64,
}

impl ModerationQueue {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Add a flagged message to the queue. The message must carry a
    /// priority; unflagged messages have no business here.
    pub fn enqueue(&self, message: Message, proposed_response: String) -> Result<Uuid> {
        if message.priority.is_none() {
            return Err(Error::internal(
                "attempted to enqueue a message without a priority",
            ));
        }

        let id = Uuid::new_v4();
        let entry = QueueEntry {
            id,
            message,
            proposed_response,
            state: EntryState::Pending,
            enqueued_at: Utc::now(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };

        self.entries.write().insert(id, Arc::new(Mutex::new(entry)));
        Ok(id)
    }

    /// Entries still awaiting a decision, highest priority first, FIFO
    /// within a priority. Escalated entries sort ahead of everything.
    pub fn pending(&self) -> Vec<QueueEntry> {
        let mut pending: Vec<QueueEntry> = {
            let map = self.entries.read();
            map.values()
                .map(|e| e.lock().clone())
                .filter(|e| e.state.is_actionable())
                .collect()
        };

        pending.sort_by(|a, b| {
            view_rank(a)
                .cmp(&view_rank(b))
                .then(a.enqueued_at.cmp(&b.enqueued_at))
                .then(a.seq.cmp(&b.seq))
        });
        pending
    }

    /// Look up an entry by id
    pub fn entry(&self, entry_id: Uuid) -> Option<QueueEntry> {
        let map = self.entries.read();
        map.get(&entry_id).map(|e| e.lock().clone())
    }

    /// Apply a moderator action to a pending entry.
    ///
    /// Validation failures leave the entry untouched. Acting on an already
    /// resolved entry is an invalid transition.
    pub fn submit(
        &self,
        entry_id: Uuid,
        action: ModeratorAction,
        review_duration_seconds: u64,
    ) -> Result<ModeratorDecision> {
        validate_action(&action)?;

        let entry = {
            let map = self.entries.read();
            map.get(&entry_id)
                .cloned()
                .ok_or_else(|| Error::invalid_transition(format!("no queue entry {}", entry_id)))?
        };
        let mut entry = entry.lock();

        if !entry.state.is_actionable() {
            return Err(Error::invalid_transition(format!(
                "entry {} already resolved as {}",
                entry_id, entry.state
            )));
        }

        let original = entry.proposed_response.clone();
        let (state, final_response, rejection_reason, notes) = match &action {
            ModeratorAction::Approve => (
                EntryState::Approved,
                format!("{} (Approved)", original),
                None,
                None,
            ),
            ModeratorAction::EditAndApprove { edited_text, notes } => (
                EntryState::Edited,
                format!("{} (Human-Edited)", edited_text),
                None,
                notes.clone(),
            ),
            ModeratorAction::RejectWithAlternative {
                alternative_text,
                reason,
                notes,
            } => (
                EntryState::Rejected,
                format!("{} (Rejected & Replaced)", alternative_text),
                Some(*reason),
                notes.clone(),
            ),
            ModeratorAction::RequestClarification => (
                EntryState::ClarificationRequested,
                CLARIFICATION_PROMPT.to_string(),
                None,
                None,
            ),
            ModeratorAction::Escalate => (
                EntryState::Escalated,
                format!("{} (Escalated to Admin)", original),
                None,
                None,
            ),
        };

        entry.state = state;

        Ok(ModeratorDecision {
            id: Uuid::new_v4(),
            entry_id,
            action: action.kind(),
            original_response: original,
            final_response,
            rejection_reason,
            notes,
            review_duration_seconds,
            timestamp: Utc::now(),
        })
    }

    /// Total entries ever enqueued (resolved included)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ModerationQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn view_rank(entry: &QueueEntry) -> u8 {
    if entry.state == EntryState::Escalated {
        return 0;
    }
    match entry.message.priority {
        Some(p) => 1 + p.rank(),
        None => u8::MAX,
    }
}

fn validate_action(action: &ModeratorAction) -> Result<()> {
    match action {
        ModeratorAction::EditAndApprove { edited_text, .. } => {
            if edited_text.trim().is_empty() {
                return Err(Error::validation("edited text must not be empty"));
            }
        }
        ModeratorAction::RejectWithAlternative {
            alternative_text, ..
        } => {
            if alternative_text.trim().is_empty() {
                return Err(Error::validation("alternative text must not be empty"));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safechat_core::{Category, ConfidenceLevel, Priority, Role};

    fn flagged_message(priority: Priority) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: "c1".to_string(),
            role: Role::User,
            text: "flagged text".to_string(),
            category: Category::Medical,
            raw_confidence: 0.65,
            confidence_score: 60.0,
            confidence_level: ConfidenceLevel::Medium,
            flagged: true,
            pii_types: Vec::new(),
            priority: Some(priority),
            escalation_reason: Some("test".to_string()),
            target_response_minutes: priority.target_minutes(),
            timestamp: Utc::now(),
        }
    }

    fn unflagged_message() -> Message {
        let mut message = flagged_message(Priority::Low);
        message.flagged = false;
        message.priority = None;
        message
    }

    #[test]
    fn test_enqueue_requires_priority() {
        let queue = ModerationQueue::new();
        let err = queue
            .enqueue(unflagged_message(), "response".to_string())
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_approve_tags_response() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::High), "Take an aspirin".to_string())
            .unwrap();

        let decision = queue.submit(id, ModeratorAction::Approve, 12).unwrap();

        assert_eq!(decision.action, ActionKind::Approve);
        assert_eq!(decision.final_response, "Take an aspirin (Approved)");
        assert_eq!(decision.original_response, "Take an aspirin");
        assert_eq!(queue.entry(id).unwrap().state, EntryState::Approved);
    }

    #[test]
    fn test_edit_tags_response() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::High), "original".to_string())
            .unwrap();

        let decision = queue
            .submit(
                id,
                ModeratorAction::EditAndApprove {
                    edited_text: "See a doctor".to_string(),
                    notes: Some("softened".to_string()),
                },
                30,
            )
            .unwrap();

        assert_eq!(decision.final_response, "See a doctor (Human-Edited)");
        assert_eq!(decision.notes.as_deref(), Some("softened"));
    }

    #[test]
    fn test_reject_records_reason() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::Medium), "bad advice".to_string())
            .unwrap();

        let decision = queue
            .submit(
                id,
                ModeratorAction::RejectWithAlternative {
                    alternative_text: "Please consult a professional".to_string(),
                    reason: RejectionReason::SafetyConcern,
                    notes: None,
                },
                45,
            )
            .unwrap();

        assert_eq!(
            decision.final_response,
            "Please consult a professional (Rejected & Replaced)"
        );
        assert_eq!(
            decision.rejection_reason,
            Some(RejectionReason::SafetyConcern)
        );
    }

    #[test]
    fn test_clarification_uses_prompt() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::Medium), "unclear".to_string())
            .unwrap();

        let decision = queue
            .submit(id, ModeratorAction::RequestClarification, 5)
            .unwrap();

        assert_eq!(decision.final_response, CLARIFICATION_PROMPT);
        assert_eq!(
            queue.entry(id).unwrap().state,
            EntryState::ClarificationRequested
        );
    }

    #[test]
    fn test_empty_edit_rejected_without_state_change() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::High), "original".to_string())
            .unwrap();

        let err = queue
            .submit(
                id,
                ModeratorAction::EditAndApprove {
                    edited_text: "   ".to_string(),
                    notes: None,
                },
                10,
            )
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(queue.entry(id).unwrap().state, EntryState::Pending);

        // Entry is still actionable after the failed attempt
        queue.submit(id, ModeratorAction::Approve, 10).unwrap();
    }

    #[test]
    fn test_double_resolution_is_invalid() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::High), "original".to_string())
            .unwrap();

        queue.submit(id, ModeratorAction::Approve, 10).unwrap();
        let err = queue.submit(id, ModeratorAction::Approve, 10).unwrap_err();

        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[test]
    fn test_unknown_entry_is_invalid_transition() {
        let queue = ModerationQueue::new();
        let err = queue
            .submit(Uuid::new_v4(), ModeratorAction::Approve, 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[test]
    fn test_escalated_entry_stays_actionable_and_sorts_first() {
        let queue = ModerationQueue::new();
        let critical = queue
            .enqueue(flagged_message(Priority::Critical), "a".to_string())
            .unwrap();
        let medium = queue
            .enqueue(flagged_message(Priority::Medium), "b".to_string())
            .unwrap();

        queue.submit(medium, ModeratorAction::Escalate, 10).unwrap();

        let pending = queue.pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, medium);
        assert_eq!(pending[0].state, EntryState::Escalated);
        assert_eq!(pending[1].id, critical);

        // Escalated entries accept a terminal decision
        queue.submit(medium, ModeratorAction::Approve, 5).unwrap();
        assert_eq!(queue.pending().len(), 1);
    }

    #[test]
    fn test_pending_sorted_by_priority_then_fifo() {
        let queue = ModerationQueue::new();
        let low = queue
            .enqueue(flagged_message(Priority::Low), "a".to_string())
            .unwrap();
        let critical = queue
            .enqueue(flagged_message(Priority::Critical), "b".to_string())
            .unwrap();
        let high_1 = queue
            .enqueue(flagged_message(Priority::High), "c".to_string())
            .unwrap();
        let high_2 = queue
            .enqueue(flagged_message(Priority::High), "d".to_string())
            .unwrap();

        let order: Vec<Uuid> = queue.pending().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![critical, high_1, high_2, low]);
    }

    #[test]
    fn test_resolved_entries_leave_pending_view() {
        let queue = ModerationQueue::new();
        let id = queue
            .enqueue(flagged_message(Priority::High), "x".to_string())
            .unwrap();

        assert_eq!(queue.pending().len(), 1);
        queue.submit(id, ModeratorAction::Approve, 3).unwrap();

        assert!(queue.pending().is_empty());
        assert_eq!(queue.len(), 1);
    }
}
