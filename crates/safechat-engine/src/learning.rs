//! Transparency breakdown attached to triage results
//!
//! When transparency is enabled, every triage result carries an explanation
//! of which guardrails fired, how the confidence score was built, and what
//! the user should keep in mind. Wording here is user-facing.

use safechat_classifiers::confidence::{ConfidenceFactor, ConfidenceReport};
use safechat_classifiers::pii::PiiScan;
use safechat_core::Category;
use serde::{Deserialize, Serialize};

use crate::context::ContextAnalysis;

/// User-facing explanation of a triage outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningAnalysis {
    pub risk_category: String,
    pub triggered_guardrails: Vec<String>,
    pub confidence_breakdown: Vec<ConfidenceFactor>,
    pub safety_tips: Vec<String>,
    pub human_review_reason: Option<String>,
    pub context: ContextAnalysis,
}

impl LearningAnalysis {
    pub fn build(
        category: Category,
        pii: &PiiScan,
        report: &ConfidenceReport,
        context: &ContextAnalysis,
    ) -> Self {
        let mut guardrails = Vec::new();
        let mut tips = Vec::new();
        let mut review_reason = None;

        if category != Category::Safe {
            let guardrail = match category {
                Category::Crisis => "crisis_intervention_detection".to_string(),
                other => format!("{}_advice_detection", other),
            };
            guardrails.push(guardrail);
        }

        if !pii.is_clean() {
            guardrails.push("pii_detection".to_string());
            tips.push("Personal information was automatically redacted for your privacy".to_string());
        }

        if report.score < 50.0 {
            guardrails.push("low_confidence_auto_flag".to_string());
        }

        match category {
            Category::Medical => {
                tips.push("AI cannot diagnose medical conditions".to_string());
                tips.push("Consult a healthcare professional for medical advice".to_string());
                review_reason = Some("Medical queries require professional oversight".to_string());
            }
            Category::Financial => {
                tips.push("AI cannot access your financial situation".to_string());
                tips.push(
                    "Financial decisions should be made with professional guidance".to_string(),
                );
                review_reason =
                    Some("Specific financial advice requires human oversight".to_string());
            }
            Category::Legal => {
                tips.push("AI cannot provide legal representation".to_string());
                tips.push(
                    "Legal matters require consultation with a qualified attorney".to_string(),
                );
                review_reason = Some("Legal queries require professional legal review".to_string());
            }
            Category::Crisis => {
                tips.push(
                    "If you're in crisis, please contact emergency services or a crisis hotline"
                        .to_string(),
                );
                review_reason =
                    Some("Crisis content requires immediate human intervention".to_string());
            }
            Category::Safe => {
                if report.score >= 80.0 {
                    tips.push(
                        "This response has high confidence based on verifiable facts".to_string(),
                    );
                } else if report.score >= 50.0 {
                    tips.push(
                        "This response has moderate confidence - verify important information"
                            .to_string(),
                    );
                } else {
                    tips.push(
                        "This response has low confidence - exercise caution and verify information"
                            .to_string(),
                    );
                }
            }
        }

        if tips.is_empty() {
            tips.push(
                "AI responses are based on training data and may not reflect current information"
                    .to_string(),
            );
        }

        Self {
            risk_category: category.as_str().to_string(),
            triggered_guardrails: guardrails,
            confidence_breakdown: report.factors.clone(),
            safety_tips: tips,
            human_review_reason: review_reason,
            context: context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safechat_core::ConfidenceLevel;

    fn report(score: f32) -> ConfidenceReport {
        ConfidenceReport {
            score,
            level: ConfidenceLevel::from_score(score),
            factors: vec![ConfidenceFactor {
                factor: "test factor".to_string(),
                impact: -10,
            }],
        }
    }

    fn clean_scan() -> PiiScan {
        PiiScan {
            kinds: Vec::new(),
            redacted: "text".to_string(),
        }
    }

    #[test]
    fn test_medical_guardrails_and_tips() {
        let analysis = LearningAnalysis::build(
            Category::Medical,
            &clean_scan(),
            &report(60.0),
            &ContextAnalysis::default(),
        );

        assert_eq!(
            analysis.triggered_guardrails,
            vec!["medical_advice_detection"]
        );
        assert_eq!(
            analysis.human_review_reason.as_deref(),
            Some("Medical queries require professional oversight")
        );
        assert!(analysis
            .safety_tips
            .contains(&"AI cannot diagnose medical conditions".to_string()));
    }

    #[test]
    fn test_crisis_guardrail_name() {
        let analysis = LearningAnalysis::build(
            Category::Crisis,
            &clean_scan(),
            &report(15.0),
            &ContextAnalysis::default(),
        );

        assert!(analysis
            .triggered_guardrails
            .contains(&"crisis_intervention_detection".to_string()));
        assert!(analysis
            .triggered_guardrails
            .contains(&"low_confidence_auto_flag".to_string()));
    }

    #[test]
    fn test_pii_adds_guardrail_and_tip() {
        let scan = PiiScan {
            kinds: vec![safechat_core::PiiKind::Email],
            redacted: "[REDACTED]".to_string(),
        };
        let analysis = LearningAnalysis::build(
            Category::Safe,
            &scan,
            &report(90.0),
            &ContextAnalysis::default(),
        );

        assert!(analysis
            .triggered_guardrails
            .contains(&"pii_detection".to_string()));
        assert!(analysis
            .safety_tips
            .iter()
            .any(|t| t.contains("automatically redacted")));
    }

    #[test]
    fn test_safe_high_confidence_tip() {
        let analysis = LearningAnalysis::build(
            Category::Safe,
            &clean_scan(),
            &report(100.0),
            &ContextAnalysis::default(),
        );

        assert!(analysis.triggered_guardrails.is_empty());
        assert!(analysis.human_review_reason.is_none());
        assert!(analysis.safety_tips[0].contains("high confidence"));
    }

    #[test]
    fn test_breakdown_carries_factors() {
        let analysis = LearningAnalysis::build(
            Category::Safe,
            &clean_scan(),
            &report(60.0),
            &ContextAnalysis::default(),
        );

        assert_eq!(analysis.confidence_breakdown.len(), 1);
        assert_eq!(analysis.confidence_breakdown[0].impact, -10);
    }
}
