//! SafeChat Classifiers
//!
//! Deterministic pattern-based classification stages for the triage
//! pipeline:
//! - Content category matching (keyword tables, severity tie-break)
//! - PII detection and idempotent redaction
//! - Response confidence scoring with an explainable factor breakdown
//! - Toxic language signal
//!
//! All stages run on CPU with no model dependencies; identical inputs
//! always produce identical outputs.

pub mod category;
pub mod classifier;
pub mod confidence;
pub mod keywords;
pub mod pii;
pub mod toxicity;

pub use category::{CategoryMatch, ContentClassifier};
pub use classifier::{ClassificationMetadata, ClassificationResult, Classifier};
pub use confidence::{ConfidenceFactor, ConfidenceReport, ConfidenceScorer};
pub use keywords::KeywordTables;
pub use pii::{PiiDetector, PiiScan, REDACTION_PLACEHOLDER};
pub use toxicity::ToxicityClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::category::{CategoryMatch, ContentClassifier};
    pub use crate::classifier::{ClassificationResult, Classifier};
    pub use crate::confidence::{ConfidenceFactor, ConfidenceReport, ConfidenceScorer};
    pub use crate::keywords::KeywordTables;
    pub use crate::pii::{PiiDetector, PiiScan};
    pub use crate::toxicity::ToxicityClassifier;
}
