//! PII detection and redaction

use regex::Regex;
use safechat_core::{Error, PiiKind, Result};

/// Placeholder substituted for every matched PII span
pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";

/// Result of a PII scan: detected kinds plus a redacted copy of the text
#[derive(Debug, Clone)]
pub struct PiiScan {
    /// Detected PII kinds, in detection order, no duplicates (empty if none)
    pub kinds: Vec<PiiKind>,

    /// Copy of the input with every matched span replaced
    pub redacted: String,
}

impl PiiScan {
    /// True when no PII was found
    pub fn is_clean(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Structural PII detector/redactor.
///
/// Detection is pattern based and deterministic. Redaction is idempotent:
/// the placeholder contains no digits or `@`, so no pattern can match
/// inside already-redacted text.
pub struct PiiDetector {
    credit_card: Vec<Regex>,
    ssn: Regex,
    phone: Vec<Regex>,
    phone_context: Regex,
    phone_bare: Regex,
    email: Regex,
    address: Regex,
}

impl PiiDetector {
    /// Create a new PII detector
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::classifier(format!("failed to compile PII regex: {}", e)))
        };

        Ok(Self {
            credit_card: vec![
                // 4111-1111-1111-1111, 4111 1111 1111 1111, 4111111111111111
                compile(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b")?,
                // Amex grouping: 3782-822463-10005
                compile(r"\b\d{4}[-\s]?\d{6}[-\s]?\d{5}\b")?,
            ],
            ssn: compile(r"\b\d{3}-\d{2}-\d{4}\b")?,
            phone: vec![
                compile(r"\(\d{3}\)\s*\d{3}-\d{4}")?,
                compile(r"\b\d{3}-\d{3}-\d{4}\b")?,
                compile(r"\b\d{3}\.\d{3}\.\d{4}\b")?,
                compile(r"\+\d{1,3}\s*\d{3}\s*\d{3}\s*\d{4}\b")?,
                compile(r"\b\d{3}\s+\d{3}\s+\d{4}\b")?,
                // Seven-digit local format
                compile(r"\b\d{3}-\d{4}\b")?,
            ],
            // Bare ten-digit runs are only treated as phone numbers in a
            // telephony context, to avoid eating timestamps and ids
            phone_context: compile(
                r"(?i)\b(?:phone|call|text|contact|number|tel|mobile)\s*[:\-]?\s*\d{10}\b",
            )?,
            phone_bare: compile(r"\b\d{10}\b")?,
            email: compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
            address: compile(
                r"(?i)\b\d+\s+[A-Za-z\s]+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Lane|Ln|Boulevard|Blvd|Way|Circle|Cir)\b",
            )?,
        })
    }

    /// Scan text for PII and produce a redacted copy.
    ///
    /// Absence of matches is a normal outcome; this never fails. Credit
    /// cards are redacted before phone numbers so grouped card digits are
    /// not consumed as phone formats.
    pub fn scan(&self, text: &str) -> PiiScan {
        let mut redacted = text.to_string();
        let mut kinds = Vec::new();

        for re in &self.credit_card {
            if self.redact_card_matches(re, &mut redacted) {
                push_unique(&mut kinds, PiiKind::CreditCard);
            }
        }

        if self.ssn.is_match(&redacted) {
            redacted = self
                .ssn
                .replace_all(&redacted, REDACTION_PLACEHOLDER)
                .into_owned();
            push_unique(&mut kinds, PiiKind::Ssn);
        }

        if self.phone_context.is_match(&redacted) {
            redacted = self
                .phone_bare
                .replace_all(&redacted, REDACTION_PLACEHOLDER)
                .into_owned();
            push_unique(&mut kinds, PiiKind::Phone);
        }
        for re in &self.phone {
            if re.is_match(&redacted) {
                redacted = re.replace_all(&redacted, REDACTION_PLACEHOLDER).into_owned();
                push_unique(&mut kinds, PiiKind::Phone);
            }
        }

        if self.email.is_match(&redacted) {
            redacted = self
                .email
                .replace_all(&redacted, REDACTION_PLACEHOLDER)
                .into_owned();
            push_unique(&mut kinds, PiiKind::Email);
        }

        if self.address.is_match(&redacted) {
            redacted = self
                .address
                .replace_all(&redacted, REDACTION_PLACEHOLDER)
                .into_owned();
            push_unique(&mut kinds, PiiKind::Address);
        }

        PiiScan { kinds, redacted }
    }

    /// Redact card-like matches whose digit count is plausible for a card
    /// number (13-19). Returns true if anything was redacted.
    fn redact_card_matches(&self, re: &Regex, text: &mut String) -> bool {
        let spans: Vec<(usize, usize)> = re
            .find_iter(text)
            .filter(|m| {
                let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
                (13..=19).contains(&digits)
            })
            .map(|m| (m.start(), m.end()))
            .collect();

        // Replace right-to-left so earlier spans stay valid
        for &(start, end) in spans.iter().rev() {
            text.replace_range(start..end, REDACTION_PLACEHOLDER);
        }

        !spans.is_empty()
    }
}

fn push_unique(kinds: &mut Vec<PiiKind>, kind: PiiKind) {
    if !kinds.contains(&kind) {
        kinds.push(kind);
    }
}
