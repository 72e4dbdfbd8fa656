//! Authoritative keyword tables for the triage pipeline.
//!
//! These tables are the single source of truth for category, toxicity, and
//! topic lexicons. Consumers must take classification results from the
//! engine rather than re-deriving them from copies of these lists.
//!
//! Compiled defaults can be overridden from YAML for deployments that need
//! tuned lexicons.

use safechat_core::{Category, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Keyword tables consumed by the classifiers, priority calculator, and
/// context tracker. Matching is case-insensitive substring containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    /// Category lexicons
    pub medical: Vec<String>,
    pub financial: Vec<String>,
    pub legal: Vec<String>,
    pub crisis: Vec<String>,

    /// Toxic language indicators (priority signal, not a category)
    pub toxicity: Vec<String>,

    /// Topic lexicons for priority assignment
    pub controversial: Vec<String>,
    pub political: Vec<String>,
    pub religious: Vec<String>,

    /// Phrasings that turn a legal query into an illegal-activity inquiry
    pub illegal_intent: Vec<String>,

    /// High-risk financial phrasings
    pub high_risk_financial: Vec<String>,

    /// Medical symptom severity tiers for escalation tracking
    pub severity_low: Vec<String>,
    pub severity_medium: Vec<String>,
    pub severity_high: Vec<String>,

    /// Explicit guardrail-override phrasings (filter bypass markers)
    pub override_phrases: Vec<String>,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            medical: strings(&[
                "pain", "hurt", "fever", "doctor", "medicine", "sick", "headache",
            ]),
            financial: strings(&["invest", "money", "bitcoin", "stock", "credit card", "loan"]),
            legal: strings(&["lawyer", "legal", "sue", "contract", "illegal"]),
            crisis: strings(&[
                "suicide",
                "suicidal",
                "depressed",
                "kill myself",
                "end my life",
                "hopeless",
                "i want to die",
                "want to die",
                "don't want to live",
                "better off dead",
                "going to kill",
                "end it all",
                "no reason to live",
                "hurt myself",
                "self harm",
                "cutting myself",
                "want to end",
                "not worth living",
            ]),
            toxicity: strings(&[
                "hate", "kill you", "destroy", "attack", "violence", "threat", "harm you",
            ]),
            controversial: strings(&[
                "holocaust", "genocide", "war crimes", "atrocity", "massacre",
            ]),
            political: strings(&[
                "president",
                "election",
                "political party",
                "voting",
                "campaign",
                "politician",
            ]),
            religious: strings(&[
                "god", "religion", "faith", "prayer", "church", "temple", "mosque", "bible",
                "quran",
            ]),
            illegal_intent: strings(&[
                "how to", "help me", "can you help", "instructions", "guide", "tutorial",
            ]),
            high_risk_financial: strings(&[
                "invest all",
                "borrow money",
                "take loan",
                "credit card debt",
                "gambling",
            ]),
            severity_low: strings(&["hurt", "ache", "pain", "sore", "uncomfortable"]),
            severity_medium: strings(&[
                "severe", "sharp", "intense", "persistent", "worsening",
            ]),
            severity_high: strings(&[
                "chest",
                "chest pain",
                "difficulty breathing",
                "can't breathe",
                "breathing",
                "emergency",
                "urgent",
                "heart",
                "stroke",
            ]),
            override_phrases: strings(&[
                "ignore the rules",
                "ignore your rules",
                "ignore previous instructions",
                "ignore your instructions",
                "disregard the rules",
                "bypass the filter",
                "bypass your filter",
                "pretend you have no rules",
                "jailbreak",
            ]),
        }
    }
}

impl KeywordTables {
    /// Load tables from a YAML string. Missing fields fall back to the
    /// compiled defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("failed to parse keyword tables: {}", e)))
    }

    /// Load tables from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Lexicon for a sensitive category. `Safe` has no lexicon.
    pub fn category_terms(&self, category: Category) -> &[String] {
        match category {
            Category::Medical => &self.medical,
            Category::Financial => &self.financial,
            Category::Legal => &self.legal,
            Category::Crisis => &self.crisis,
            Category::Safe => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_nonempty() {
        let tables = KeywordTables::default();
        for category in [
            Category::Medical,
            Category::Financial,
            Category::Legal,
            Category::Crisis,
        ] {
            assert!(!tables.category_terms(category).is_empty());
        }
        assert!(!tables.toxicity.is_empty());
    }

    #[test]
    fn test_yaml_override_keeps_defaults() {
        let yaml = r#"
medical:
  - migraine
  - nausea
"#;
        let tables = KeywordTables::from_yaml(yaml).unwrap();
        assert_eq!(tables.medical, vec!["migraine", "nausea"]);
        // Untouched tables keep compiled defaults
        assert!(tables.crisis.contains(&"i want to die".to_string()));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = KeywordTables::from_yaml("medical: 42").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
