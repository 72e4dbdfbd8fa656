//! Content category classifier

use crate::classifier::{ClassificationMetadata, ClassificationResult, Classifier};
use crate::keywords::KeywordTables;
use aho_corasick::AhoCorasick;
use safechat_core::{Category, Error, Result};
use std::time::Instant;

/// Severity-ordered categories checked by the classifier. Crisis terms
/// short-circuit every other check.
const CHECK_ORDER: [Category; 4] = [
    Category::Crisis,
    Category::Medical,
    Category::Legal,
    Category::Financial,
];

/// A category match with its raw confidence proxy
#[derive(Debug, Clone)]
pub struct CategoryMatch {
    pub category: Category,
    /// Raw matched-category confidence proxy (0.0-1.0). This is a signal
    /// into the confidence scorer, not the final confidence score.
    pub raw_confidence: f32,
    /// Distinct terms that matched, in table order
    pub matched: Vec<String>,
    /// Matched byte spans
    pub spans: Vec<(usize, usize)>,
}

impl CategoryMatch {
    fn safe() -> Self {
        Self {
            category: Category::Safe,
            raw_confidence: 0.0,
            matched: Vec::new(),
            spans: Vec::new(),
        }
    }
}

/// Keyword-based content classifier using Aho-Corasick matchers, one per
/// sensitive category. Matching is case-insensitive substring containment.
pub struct ContentClassifier {
    matchers: Vec<(Category, AhoCorasick, Vec<String>)>,
}

impl ContentClassifier {
    /// Build a classifier from keyword tables
    pub fn new(tables: &KeywordTables) -> Result<Self> {
        let mut matchers = Vec::with_capacity(CHECK_ORDER.len());

        for category in CHECK_ORDER {
            let terms = tables.category_terms(category).to_vec();
            let ac = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(&terms)
                .map_err(|e| {
                    Error::classifier(format!("failed to build {} matcher: {}", category, e))
                })?;
            matchers.push((category, ac, terms));
        }

        Ok(Self { matchers })
    }

    /// Match the text against the category tables.
    ///
    /// Returns the highest-severity matching category (crisis > medical >
    /// legal > financial) or `Safe`. Never fails; empty or non-matching
    /// input is a safe, zero-confidence match.
    pub fn match_category(&self, text: &str) -> CategoryMatch {
        for (category, matcher, terms) in &self.matchers {
            let mut matched_ids = vec![false; terms.len()];
            let mut spans = Vec::new();

            for m in matcher.find_iter(text) {
                matched_ids[m.pattern().as_usize()] = true;
                spans.push((m.start(), m.end()));
            }

            let matched: Vec<String> = terms
                .iter()
                .zip(&matched_ids)
                .filter(|(_, hit)| **hit)
                .map(|(term, _)| term.clone())
                .collect();

            if matched.is_empty() {
                continue;
            }

            let hits = matched.len() as f32;
            // Crisis content is kept at a very low raw confidence so it is
            // always flagged downstream.
            let raw_confidence = if *category == Category::Crisis {
                (0.10 + hits * 0.05).min(0.30)
            } else {
                (0.50 + hits * 0.15).min(0.95)
            };

            return CategoryMatch {
                category: *category,
                raw_confidence,
                matched,
                spans,
            };
        }

        CategoryMatch::safe()
    }
}

#[async_trait::async_trait]
impl Classifier for ContentClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let m = self.match_category(text);

        Ok(ClassificationResult {
            category: m.category,
            score: m.raw_confidence,
            metadata: ClassificationMetadata {
                matched: m.matched,
                spans: m.spans,
                extra: Vec::new(),
            },
            latency_us: start.elapsed().as_micros() as u64,
        })
    }

    fn name(&self) -> &str {
        "content_category"
    }
}
