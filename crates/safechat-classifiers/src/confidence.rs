//! Response confidence scorer
//!
//! Scores how confident the system should be in a proposed response
//! (0-100), via an additive factor model over query and response
//! characteristics. This is distinct from the classifier's own raw match
//! confidence, which only feeds in as the category signal.

use regex::Regex;
use safechat_core::{Category, ConfidenceLevel, Error, Result};
use serde::{Deserialize, Serialize};

/// Neutral starting score before any factor is applied
const BASELINE: f32 = 70.0;

/// One applied scoring factor with its signed percentage impact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    pub factor: String,
    /// Signed percentage-point impact on the score
    pub impact: i32,
}

/// Scoring outcome: final score, level, and the ordered factor breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Final score, clamped to [0, 100]
    pub score: f32,
    pub level: ConfidenceLevel,
    /// Factors in application order
    pub factors: Vec<ConfidenceFactor>,
}

const FACTUAL_PATTERNS: &[&str] = &[
    "what is",
    "what are",
    "what was",
    "what were",
    "who is",
    "who was",
    "who invented",
    "who created",
    "where is",
    "where was",
    "where did",
    "when did",
    "when was",
    "when is",
    "how many",
    "how much",
    "how does",
    "how do",
    "define",
    "definition of",
    "explain",
    "describe",
    "capital of",
    "invented",
    "discovered",
    "created",
];

const SUBJECTIVE_PATTERNS: &[&str] = &[
    "should i",
    "what should i",
    "do you think",
    "do you recommend",
    "best",
    "worst",
    "better",
    "prefer",
    "favorite",
    "opinion",
    "think about",
    "believe",
];

const ADVICE_PATTERNS: &[&str] = &[
    "should i",
    "what should i do",
    "what should i",
    "advice",
    "recommend",
    "suggest",
    "tell me what to",
    "help me decide",
];

const FUTURE_PATTERNS: &[&str] = &[
    "will",
    "going to",
    "predict",
    "forecast",
    "future",
    "tomorrow",
    "next year",
    "will happen",
    "will it",
];

const HISTORICAL_PATTERNS: &[&str] = &[
    "invented",
    "discovered",
    "created",
    "founded",
    "established",
    "who invented",
    "who discovered",
    "when was",
    "when did",
];

const SCIENTIFIC_PATTERNS: &[&str] = &[
    "science",
    "physics",
    "chemistry",
    "biology",
    "math",
    "mathematics",
    "photosynthesis",
    "gravity",
    "temperature",
    "boils at",
    "formula",
    "equation",
    "theory",
    "law of",
];

const MATH_OPERATORS: &[&str] = &[
    "+", "-", "*", "×", "÷", "/", "times", "plus", "minus", "equals",
];

const UNCERTAIN_LANGUAGE: &[&str] = &[
    "maybe",
    "perhaps",
    "might",
    "could",
    "possibly",
    "uncertain",
    "unclear",
    "not sure",
];

const FACTUAL_INDICATORS: &[&str] = &[
    "fact",
    "established",
    "research",
    "study",
    "data",
    "evidence",
    "scientific",
    "verifiable",
];

fn contains_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// Deterministic confidence scorer. Identical inputs always produce
/// identical outputs.
pub struct ConfidenceScorer {
    math_expr: Regex,
}

impl ConfidenceScorer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            math_expr: Regex::new(r"\d+\s*[+\-*/×÷]\s*\d+")
                .map_err(|e| Error::classifier(format!("failed to compile math regex: {}", e)))?,
        })
    }

    /// Score a user message and the proposed response to it.
    ///
    /// The base factor is picked from the query shape (factual, advice,
    /// prediction, subjective) and the category; response wording then
    /// applies small adjustments. Clamped to [0, 100].
    pub fn score(&self, message: &str, response: &str, category: Category) -> ConfidenceReport {
        let msg = message.to_lowercase();
        let resp = response.to_lowercase();
        let mut factors = Vec::new();
        let mut score = BASELINE;

        let is_factual = contains_any(&msg, FACTUAL_PATTERNS);
        let is_subjective = contains_any(&msg, SUBJECTIVE_PATTERNS);
        let is_advice = contains_any(&msg, ADVICE_PATTERNS);
        let is_future = contains_any(&msg, FUTURE_PATTERNS);

        let apply = |score: &mut f32, target: f32, factor: &str, factors: &mut Vec<ConfidenceFactor>| {
            factors.push(ConfidenceFactor {
                factor: factor.to_string(),
                impact: (target - BASELINE) as i32,
            });
            *score = target;
        };

        if is_factual && !is_subjective && !is_advice {
            if contains_any(&msg, MATH_OPERATORS) && self.math_expr.is_match(&msg) {
                apply(
                    &mut score,
                    100.0,
                    "Query asks for verifiable mathematical calculation",
                    &mut factors,
                );
            } else if msg.contains("capital") {
                apply(
                    &mut score,
                    100.0,
                    "Query asks for verifiable geographical fact",
                    &mut factors,
                );
            } else if contains_any(&msg, HISTORICAL_PATTERNS) {
                apply(
                    &mut score,
                    95.0,
                    "Query asks for verifiable historical fact",
                    &mut factors,
                );
            } else if contains_any(&msg, SCIENTIFIC_PATTERNS) {
                apply(
                    &mut score,
                    95.0,
                    "Query asks for verifiable scientific fact",
                    &mut factors,
                );
            } else if !category.is_sensitive() {
                apply(
                    &mut score,
                    90.0,
                    "Query asks for verifiable factual information",
                    &mut factors,
                );
            } else {
                apply(
                    &mut score,
                    50.0,
                    "Query is factual but involves sensitive category",
                    &mut factors,
                );
            }
        } else if is_advice {
            match category {
                Category::Medical | Category::Financial | Category::Legal => apply(
                    &mut score,
                    25.0,
                    "Query requests personal advice in sensitive category",
                    &mut factors,
                ),
                _ if msg.contains("invest") || msg.contains("buy") || msg.contains("stock") => {
                    apply(
                        &mut score,
                        30.0,
                        "Query requests personal financial advice",
                        &mut factors,
                    )
                }
                _ => apply(&mut score, 35.0, "Query requests personal advice", &mut factors),
            }
        } else if is_future {
            if msg.contains("weather") {
                apply(
                    &mut score,
                    65.0,
                    "Query about weather requires current data",
                    &mut factors,
                );
            } else {
                apply(
                    &mut score,
                    40.0,
                    "Query involves future predictions with uncertainty",
                    &mut factors,
                );
            }
        } else if category == Category::Crisis {
            apply(
                &mut score,
                15.0,
                "Crisis content requires immediate human intervention and professional support",
                &mut factors,
            );
        } else if category.is_sensitive() {
            // Medical keeps a smaller penalty than financial/legal: symptom
            // statements are common and the high review priority already
            // covers the risk.
            let target = if category == Category::Medical { 60.0 } else { 50.0 };
            apply(
                &mut score,
                target,
                &format!(
                    "Topic involves {} content requiring professional expertise",
                    category
                ),
                &mut factors,
            );
        } else if is_subjective {
            if contains_any(&msg, &["best", "worst", "better", "prefer"]) {
                apply(
                    &mut score,
                    60.0,
                    "Query requests subjective comparison or opinion",
                    &mut factors,
                );
            } else {
                apply(&mut score, 55.0, "Query requests subjective opinion", &mut factors);
            }
        } else if msg.contains("weather") {
            apply(
                &mut score,
                65.0,
                "Weather information requires current data",
                &mut factors,
            );
        } else if msg.contains("today") || msg.contains("current") || msg.contains("recent") {
            apply(
                &mut score,
                60.0,
                "Query about current events requires up-to-date information",
                &mut factors,
            );
        } else {
            apply(&mut score, 70.0, "Standard confidence for general query", &mut factors);
        }

        // Response wording adjustments
        let uncertain_count = UNCERTAIN_LANGUAGE.iter().filter(|w| resp.contains(**w)).count();
        if uncertain_count > 0 {
            let delta = uncertain_count as f32 * 8.0;
            factors.push(ConfidenceFactor {
                factor: "Response contains uncertain language".to_string(),
                impact: -(delta as i32),
            });
            score -= delta;
        }

        if contains_any(&resp, FACTUAL_INDICATORS) && score < 80.0 {
            factors.push(ConfidenceFactor {
                factor: "Response references established facts or evidence".to_string(),
                impact: 5,
            });
            score += 5.0;
        }

        if is_factual
            && score < 90.0
            && contains_any(&resp, &["equals", "is", "was", "are", "were"])
        {
            factors.push(ConfidenceFactor {
                factor: "Response provides direct factual answer".to_string(),
                impact: 3,
            });
            score += 3.0;
        }

        let score = score.clamp(0.0, 100.0);

        ConfidenceReport {
            score,
            level: ConfidenceLevel::from_score(score),
            factors,
        }
    }
}
