//! Toxic language signal classifier
//!
//! Lexicon-based and intentionally dependency-light. Toxicity is a priority
//! signal, not a safety category: the result always carries `Category::Safe`
//! and downstream consumers read the matched indicator count.

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::keywords::KeywordTables;
use safechat_core::{Category, Result};
use std::time::Instant;

pub struct ToxicityClassifier {
    terms: Vec<String>,
}

impl ToxicityClassifier {
    /// Create a classifier over the toxicity lexicon
    pub fn new(tables: &KeywordTables) -> Self {
        Self {
            terms: tables.toxicity.clone(),
        }
    }

    /// Distinct toxic indicators present in the text
    pub fn indicators(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| lower.contains(term.as_str()))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl Classifier for ToxicityClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let matched = self.indicators(text);

        // Confidence stays bounded for a lexicon-only approach
        let score = (matched.len() as f32 * 0.35).clamp(0.0, 0.95);

        Ok(ClassificationResult {
            category: Category::Safe,
            score,
            metadata: ClassificationMetadata {
                matched,
                spans: Vec::new(),
                extra: vec![("model".to_string(), "toxicity-lexicon".to_string())],
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        "toxicity"
    }
}
