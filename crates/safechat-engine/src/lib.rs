//! SafeChat Engine
//!
//! Stateful orchestration on top of the classification stages: the triage
//! pipeline, per-conversation context tracking, priority assignment, and the
//! human moderation queue.
//!
//! The [`TriageEngine`] is the main entry point:
//!
//! ```no_run
//! use safechat_engine::{TriageEngine, TriageRequest};
//! use safechat_core::TriageSettings;
//!
//! # async fn run() -> safechat_core::Result<()> {
//! let engine = TriageEngine::new()?;
//! let result = engine
//!     .triage(TriageRequest {
//!         conversation_id: "session-1".to_string(),
//!         text: "I have a headache, what should I take?".to_string(),
//!         proposed_response: "You could try resting.".to_string(),
//!         settings: TriageSettings::default(),
//!     })
//!     .await?;
//!
//! if result.message.flagged {
//!     // A moderator reviews the entry before the response is released
//! }
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod learning;
pub mod priority;
pub mod queue;
pub mod triage;

pub use context::{ContextAnalysis, ContextTracker, PreviousQuery, CONTEXT_CAPACITY};
pub use learning::LearningAnalysis;
pub use priority::{PriorityCalculator, PriorityDecision};
pub use queue::{
    ActionKind, EntryState, ModerationQueue, ModeratorAction, ModeratorDecision, QueueEntry,
    RejectionReason, CLARIFICATION_PROMPT,
};
pub use triage::{TriageEngine, TriageRequest, TriageResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::context::{ContextAnalysis, ContextTracker};
    pub use crate::priority::{PriorityCalculator, PriorityDecision};
    pub use crate::queue::{ModerationQueue, ModeratorAction, ModeratorDecision};
    pub use crate::triage::{TriageEngine, TriageRequest, TriageResult};
}
