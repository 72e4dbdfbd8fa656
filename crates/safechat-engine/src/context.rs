//! Per-conversation context tracking and multi-turn risk analysis
//!
//! The tracker is the only stateful, order-sensitive component in the
//! pipeline. Each conversation owns a bounded FIFO history; analysis of a
//! new turn and the append of that turn happen atomically under the
//! conversation's own lock, so triage on one conversation never blocks
//! another.
//!
//! Contexts live for the process lifetime; the single-process model makes
//! unbounded conversation counts an acceptable tradeoff for this engine.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use safechat_classifiers::{ContentClassifier, KeywordTables};
use safechat_core::Category;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Maximum turns tracked per conversation (FIFO eviction beyond this)
pub const CONTEXT_CAPACITY: usize = 10;

/// How many prior turns are surfaced for transparency
const PREVIOUS_QUERY_LIMIT: usize = 3;

/// Persistent-topic rule: same non-safe category in at least
/// `PERSISTENCE_THRESHOLD` of the last `PERSISTENCE_WINDOW` turns
const PERSISTENCE_WINDOW: usize = 5;
const PERSISTENCE_THRESHOLD: usize = 3;

/// Recency decay applied per turn of age in the cumulative risk score
const RISK_DECAY: f32 = 0.75;

/// One tracked conversation turn
#[derive(Debug, Clone)]
pub struct TrackedTurn {
    pub text: String,
    pub category: Category,
    pub keyword_hits: usize,
    pub timestamp: DateTime<Utc>,
}

/// Bounded per-conversation history
#[derive(Debug, Default)]
struct ConversationContext {
    turns: VecDeque<TrackedTurn>,
}

impl ConversationContext {
    fn push(&mut self, turn: TrackedTurn) {
        while self.turns.len() >= CONTEXT_CAPACITY {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);

        if self.turns.len() > CONTEXT_CAPACITY {
            // Internal bug class; must never happen
            tracing::error!(len = self.turns.len(), "conversation context exceeded capacity");
        }
    }
}

/// A prior turn surfaced for transparency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousQuery {
    pub text: String,
    pub category: Category,
}

/// Snapshot of the multi-turn risk analysis for one new turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextAnalysis {
    /// The conversation moved to a materially more severe topic, or keeps
    /// hammering the same topic with rising keyword density
    pub risk_escalation: bool,

    /// Obfuscation markers layered over residual risky intent
    pub filter_bypass_attempt: bool,

    /// Same non-safe category in >= 3 of the last 5 turns
    pub persistent_sensitive_topic: bool,

    /// Recency-weighted risk over the tracked history (0.0-1.0)
    pub cumulative_risk_score: f32,

    /// Human-readable notes about what the analysis saw
    pub context_flags: Vec<String>,

    /// Up to the last 3 prior user turns, oldest first
    pub previous_queries: Vec<PreviousQuery>,
}

/// Medical symptom severity tiers used for escalation detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SymptomTier {
    None,
    Low,
    Medium,
    High,
}

/// Tracks bounded history per conversation and analyzes each new turn
/// against it.
pub struct ContextTracker {
    conversations: RwLock<HashMap<String, Arc<Mutex<ConversationContext>>>>,
    classifier: Arc<ContentClassifier>,
    tables: Arc<KeywordTables>,
}

impl ContextTracker {
    pub fn new(classifier: Arc<ContentClassifier>, tables: Arc<KeywordTables>) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            classifier,
            tables,
        }
    }

    /// Analyze the new turn against the conversation's history, then append
    /// it. Analysis and append are atomic per conversation.
    pub fn observe(
        &self,
        conversation_id: &str,
        text: &str,
        category: Category,
        keyword_hits: usize,
    ) -> ContextAnalysis {
        let context = self.context_for(conversation_id);
        let mut context = context.lock();

        let analysis = self.analyze(&context, text, category, keyword_hits);

        context.push(TrackedTurn {
            text: text.to_string(),
            category,
            keyword_hits,
            timestamp: Utc::now(),
        });

        analysis
    }

    /// Snapshot of a conversation's tracked turns, oldest first
    pub fn history(&self, conversation_id: &str) -> Vec<TrackedTurn> {
        let map = self.conversations.read();
        match map.get(conversation_id) {
            Some(context) => context.lock().turns.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    fn context_for(&self, conversation_id: &str) -> Arc<Mutex<ConversationContext>> {
        if let Some(context) = self.conversations.read().get(conversation_id) {
            return context.clone();
        }

        let mut map = self.conversations.write();
        map.entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationContext::default())))
            .clone()
    }

    fn analyze(
        &self,
        context: &ConversationContext,
        text: &str,
        category: Category,
        keyword_hits: usize,
    ) -> ContextAnalysis {
        let mut analysis = ContextAnalysis {
            cumulative_risk_score: self.cumulative_risk(context, category),
            ..Default::default()
        };

        let turns = &context.turns;
        let start = turns.len().saturating_sub(PREVIOUS_QUERY_LIMIT);
        analysis.previous_queries = turns
            .iter()
            .skip(start)
            .map(|t| PreviousQuery {
                text: t.text.clone(),
                category: t.category,
            })
            .collect();

        self.check_escalation(turns, text, category, keyword_hits, &mut analysis);
        self.check_bypass(turns, text, category, &mut analysis);
        self.check_persistence(turns, category, &mut analysis);

        analysis
    }

    fn check_escalation(
        &self,
        turns: &VecDeque<TrackedTurn>,
        text: &str,
        category: Category,
        keyword_hits: usize,
        analysis: &mut ContextAnalysis,
    ) {
        if let Some(last) = turns.back() {
            let jump = category.severity() as i8 - last.category.severity() as i8;
            let material = jump >= 2 || (jump >= 1 && last.category.is_sensitive());
            if material && category.is_sensitive() {
                analysis.risk_escalation = true;
                analysis
                    .context_flags
                    .push("Conversation shifted to a more severe topic".to_string());
            }

            if category.is_sensitive()
                && last.category == category
                && keyword_hits > last.keyword_hits
            {
                analysis.risk_escalation = true;
                analysis.context_flags.push(format!(
                    "Repeated {} queries with rising keyword density",
                    category
                ));
            }
        }

        // Symptom-tier escalation runs on raw wording so that a follow-up
        // like "my chest feels tight" escalates even when it carries no
        // category keyword of its own.
        let relevant = turns.iter().any(|t| {
            t.category == Category::Medical || self.symptom_tier(&t.text) > SymptomTier::None
        });
        if relevant {
            let prev_tier = turns
                .iter()
                .map(|t| self.symptom_tier(&t.text))
                .max()
                .unwrap_or(SymptomTier::None)
                .max(SymptomTier::Low);
            let new_tier = self.symptom_tier(text);

            if new_tier > prev_tier && new_tier >= SymptomTier::Medium {
                analysis.risk_escalation = true;
                analysis
                    .context_flags
                    .push("Medical risk escalation detected in conversation".to_string());
            }
        }
    }

    fn symptom_tier(&self, text: &str) -> SymptomTier {
        let lower = text.to_lowercase();
        let has = |terms: &[String]| terms.iter().any(|t| lower.contains(t.as_str()));

        if has(&self.tables.severity_high) {
            SymptomTier::High
        } else if has(&self.tables.severity_medium) {
            SymptomTier::Medium
        } else if has(&self.tables.severity_low) {
            SymptomTier::Low
        } else {
            SymptomTier::None
        }
    }

    fn check_bypass(
        &self,
        turns: &VecDeque<TrackedTurn>,
        text: &str,
        category: Category,
        analysis: &mut ContextAnalysis,
    ) {
        let lower = text.to_lowercase();

        let override_marker = self
            .tables
            .override_phrases
            .iter()
            .any(|p| lower.contains(p.as_str()));

        // De-obfuscate and re-classify: evasion only counts when the
        // underlying risky intent is still detectable
        let normalized = normalize_obfuscation(&lower);
        let hidden = if normalized != lower {
            self.classifier.match_category(&normalized).category
        } else {
            Category::Safe
        };

        let recent_sensitive = turns
            .iter()
            .rev()
            .take(PERSISTENCE_WINDOW)
            .any(|t| t.category.is_sensitive());

        let bypass = (override_marker
            && (category.is_sensitive() || hidden.is_sensitive() || recent_sensitive))
            || (hidden.is_sensitive() && !category.is_sensitive());

        if bypass {
            analysis.filter_bypass_attempt = true;
            analysis
                .context_flags
                .push("Possible filter bypass attempt".to_string());
        }
    }

    fn check_persistence(
        &self,
        turns: &VecDeque<TrackedTurn>,
        category: Category,
        analysis: &mut ContextAnalysis,
    ) {
        if !category.is_sensitive() {
            return;
        }

        // Window covers the current turn plus the last four tracked ones
        let same = turns
            .iter()
            .rev()
            .take(PERSISTENCE_WINDOW - 1)
            .filter(|t| t.category == category)
            .count()
            + 1;

        if same >= PERSISTENCE_THRESHOLD {
            analysis.persistent_sensitive_topic = true;
            analysis
                .context_flags
                .push(format!("Multiple {} queries in conversation", category));
        }
    }

    fn cumulative_risk(&self, context: &ConversationContext, category: Category) -> f32 {
        let mut weighted = 0.0_f32;
        let mut total = 0.0_f32;
        let mut weight = 1.0_f32;

        let categories =
            std::iter::once(category).chain(context.turns.iter().rev().map(|t| t.category));
        for cat in categories {
            weighted += weight * risk_weight(cat);
            total += weight;
            weight *= RISK_DECAY;
        }

        if total > 0.0 {
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn risk_weight(category: Category) -> f32 {
    match category {
        Category::Crisis => 1.0,
        Category::Medical => 0.6,
        Category::Legal => 0.5,
        Category::Financial => 0.4,
        Category::Safe => 0.0,
    }
}

/// Undo common evasion tricks: leetspeak substitutions and spaced-out
/// letters ("s u i c i d e" becomes "suicide").
fn normalize_obfuscation(text: &str) -> String {
    let leet: String = text
        .chars()
        .map(|c| match c {
            '0' => 'o',
            '1' => 'i',
            '3' => 'e',
            '4' => 'a',
            '5' => 's',
            '7' => 't',
            '$' => 's',
            '@' => 'a',
            '!' => 'i',
            _ => c,
        })
        .collect();

    let mut words: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for token in leet.split_whitespace() {
        let single = token.chars().count() == 1
            && token.chars().next().is_some_and(|c| c.is_alphanumeric());
        if single {
            run.push(token);
        } else {
            flush_run(&mut words, &mut run);
            words.push(token.to_string());
        }
    }
    flush_run(&mut words, &mut run);

    words.join(" ")
}

fn flush_run(words: &mut Vec<String>, run: &mut Vec<&str>) {
    // Three or more consecutive single letters are treated as one spaced-out
    // word; shorter runs are left as-is ("a", "I")
    if run.len() >= 3 {
        words.push(run.concat());
    } else {
        words.extend(run.iter().map(|s| s.to_string()));
    }
    run.clear();
}
