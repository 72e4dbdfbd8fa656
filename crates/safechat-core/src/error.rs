//! Error types for SafeChat

/// Result type alias using SafeChat's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for triage and moderation operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A moderator action is missing a required field
    #[error("validation error: {0}")]
    Validation(String),

    /// An action was submitted against an already-resolved or unknown entry
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Classifier construction or execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors (invariant violations, should never surface)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new invalid-transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
