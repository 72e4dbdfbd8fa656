//! Classifier trait and common types

use async_trait::async_trait;
use safechat_core::{Category, Result};

/// Trait for text classifiers in the triage pipeline
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of classification
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    /// Category signal produced by this classifier (`Safe` when no signal)
    pub category: Category,

    /// Raw signal strength (0.0-1.0)
    pub score: f32,

    /// Additional metadata
    pub metadata: ClassificationMetadata,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ClassificationResult {
    /// Create a new classification result
    pub fn new(category: Category, score: f32) -> Self {
        Self {
            category,
            score,
            metadata: ClassificationMetadata::default(),
            latency_us: 0,
        }
    }

    /// Number of distinct terms that matched
    pub fn matched_count(&self) -> usize {
        self.metadata.matched.len()
    }
}

/// Metadata about classification
#[derive(Debug, Clone, Default)]
pub struct ClassificationMetadata {
    /// Distinct terms that matched, in table order
    pub matched: Vec<String>,

    /// Matched byte spans
    pub spans: Vec<(usize, usize)>,

    /// Additional key-value pairs
    pub extra: Vec<(String, String)>,
}
