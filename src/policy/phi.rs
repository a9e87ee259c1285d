//! PHI detection and redaction.
//!
//! Five independent detectors (SSN, card number, email, phone, date); a
//! single text may trigger several. Detection never mutates the input.
//! Redaction is applied before persistence and logging only — never
//! before classification, which must see the raw text.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder for fully redacted spans.
const REDACTED: &str = "[REDACTED]";

/// Kinds of PHI the guard recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiType {
    Ssn,
    CreditCard,
    Email,
    Phone,
    Date,
}

impl PhiType {
    /// Short label for logging and the interaction audit record.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
        }
    }
}

/// One detected PHI span.
#[derive(Debug, Clone)]
pub struct PhiDetection {
    pub phi_type: PhiType,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// How much of a detected span survives redaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionMode {
    /// SSN/phone keep their last 4 digits, email keeps its first
    /// local-part character and domain. Everything else is replaced.
    MaskPartial,
    /// Every detected span becomes a fixed placeholder.
    FullRedact,
}

/// PHI detector/redactor with patterns compiled once at construction.
pub struct PhiGuard {
    detectors: Vec<(PhiType, Regex)>,
}

impl PhiGuard {
    pub fn new() -> Self {
        let detectors = vec![
            (PhiType::Ssn, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
            (
                PhiType::CreditCard,
                Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap(),
            ),
            (
                PhiType::Email,
                Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            ),
            (
                PhiType::Phone,
                Regex::new(r"\b1?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap(),
            ),
            (
                PhiType::Date,
                Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap(),
            ),
        ];
        Self { detectors }
    }

    /// Find every PHI span in the text. Detectors run independently, so
    /// overlapping spans of different types can both be reported.
    pub fn detect(&self, text: &str) -> Vec<PhiDetection> {
        let mut found = Vec::new();
        for (phi_type, regex) in &self.detectors {
            for m in regex.find_iter(text) {
                found.push(PhiDetection {
                    phi_type: *phi_type,
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                });
            }
        }
        found.sort_by_key(|d| (d.start, d.end));
        found
    }

    /// Distinct PHI types present in the text, for the audit record.
    pub fn detected_types(&self, text: &str) -> Vec<PhiType> {
        let mut types: Vec<PhiType> = Vec::new();
        for d in self.detect(text) {
            if !types.contains(&d.phi_type) {
                types.push(d.phi_type);
            }
        }
        types
    }

    /// Return a copy of the text with detected spans replaced.
    pub fn redact(&self, text: &str, mode: RedactionMode) -> String {
        let detections = self.detect(text);
        let mut out = text.to_string();
        // Start of the leftmost replacement made so far; spans reaching
        // into it overlap an already-replaced region and are skipped.
        let mut limit = usize::MAX;
        // Replace back-to-front so earlier spans keep their offsets.
        for d in detections.iter().rev() {
            if d.end > limit {
                continue;
            }
            let replacement = match mode {
                RedactionMode::FullRedact => REDACTED.to_string(),
                RedactionMode::MaskPartial => mask(d),
            };
            out.replace_range(d.start..d.end, &replacement);
            limit = d.start;
        }
        out
    }
}

impl Default for PhiGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial mask for a single detection.
fn mask(d: &PhiDetection) -> String {
    match d.phi_type {
        PhiType::Ssn => {
            let last4 = &d.text[d.text.len().saturating_sub(4)..];
            format!("***-**-{last4}")
        }
        PhiType::Phone => {
            let digits: String = d.text.chars().filter(|c| c.is_ascii_digit()).collect();
            let last4 = &digits[digits.len().saturating_sub(4)..];
            format!("***-***-{last4}")
        }
        PhiType::Email => match d.text.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().unwrap_or('*');
                format!("{first}***@{domain}")
            }
            None => REDACTED.to_string(),
        },
        PhiType::CreditCard | PhiType::Date => REDACTED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ssn() {
        let guard = PhiGuard::new();
        let found = guard.detect("my ssn is 123-45-6789 thanks");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phi_type, PhiType::Ssn);
        assert_eq!(found[0].text, "123-45-6789");
    }

    #[test]
    fn detects_card_number() {
        let guard = PhiGuard::new();
        let found = guard.detect("card 4111 1111 1111 1111 on file");
        assert!(found.iter().any(|d| d.phi_type == PhiType::CreditCard));
    }

    #[test]
    fn detects_email_and_phone() {
        let guard = PhiGuard::new();
        let found = guard.detect("reach me at maria@example.com or 702-555-1234");
        let types: Vec<PhiType> = found.iter().map(|d| d.phi_type).collect();
        assert!(types.contains(&PhiType::Email));
        assert!(types.contains(&PhiType::Phone));
    }

    #[test]
    fn detects_slash_date() {
        let guard = PhiGuard::new();
        let found = guard.detect("born 3/14/1952");
        assert_eq!(found[0].phi_type, PhiType::Date);
    }

    #[test]
    fn multiple_types_in_one_text() {
        let guard = PhiGuard::new();
        let types = guard.detected_types("ssn 123-45-6789, dob 1/2/1950, bob@x.org");
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn detect_does_not_mutate() {
        let guard = PhiGuard::new();
        let text = "ssn 123-45-6789";
        let _ = guard.detect(text);
        assert_eq!(text, "ssn 123-45-6789");
    }

    #[test]
    fn mask_partial_keeps_ssn_last_four() {
        let guard = PhiGuard::new();
        let out = guard.redact("ssn 123-45-6789", RedactionMode::MaskPartial);
        assert_eq!(out, "ssn ***-**-6789");
    }

    #[test]
    fn mask_partial_keeps_phone_last_four() {
        let guard = PhiGuard::new();
        let out = guard.redact("call 702.555.1234", RedactionMode::MaskPartial);
        assert_eq!(out, "call ***-***-1234");
    }

    #[test]
    fn mask_partial_keeps_email_first_char_and_domain() {
        let guard = PhiGuard::new();
        let out = guard.redact("email maria@example.com", RedactionMode::MaskPartial);
        assert_eq!(out, "email m***@example.com");
    }

    #[test]
    fn full_redact_removes_every_pattern() {
        let guard = PhiGuard::new();
        let text = "ssn 123-45-6789, card 4111-1111-1111-1111, maria@example.com, \
                    702-555-1234, dob 3/14/1952";
        let out = guard.redact(text, RedactionMode::FullRedact);
        assert!(guard.detect(&out).is_empty(), "still detectable: {out}");
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn clean_text_passes_through_unchanged() {
        let guard = PhiGuard::new();
        let text = "my name is Maria Lopez and I live in Henderson";
        assert_eq!(guard.redact(text, RedactionMode::FullRedact), text);
        assert!(guard.detect(text).is_empty());
    }

    #[test]
    fn empty_input_is_safe() {
        let guard = PhiGuard::new();
        assert!(guard.detect("").is_empty());
        assert_eq!(guard.redact("", RedactionMode::FullRedact), "");
    }
}
