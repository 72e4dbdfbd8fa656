//! SafeChat Core
//!
//! Core types and error handling shared across the SafeChat triage engine.
//!
//! This crate provides:
//! - Common value types for categories, priorities, confidence levels, and
//!   triaged messages
//! - Error types and result handling
//! - Per-request settings consumed by the orchestrator

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    Category, ConfidenceLevel, Message, PiiKind, Priority, Role, SafetyLevel, TriageSettings,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        Category, ConfidenceLevel, Message, PiiKind, Priority, Role, SafetyLevel, TriageSettings,
    };
}
