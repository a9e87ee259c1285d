//! Pattern-based profile field extraction.
//!
//! A declarative list of (regex, setter) rules runs over every inbound
//! message. Rules are independent and non-exclusive; the result is the
//! union of whatever matched. This is deliberately not NER — keyword and
//! shape patterns only.

use regex::{Captures, Regex};
use tracing::debug;

use crate::profile::ProfileFragment;

/// A single extraction rule: a compiled pattern plus the field setter
/// applied to its first match.
struct ExtractionRule {
    name: &'static str,
    regex: Regex,
    apply: fn(&mut ProfileFragment, &Captures),
}

/// Free-text field extractor. Patterns compile once at construction;
/// `extract` is pure and never fails on malformed input.
pub struct FieldExtractor {
    rules: Vec<ExtractionRule>,
}

impl FieldExtractor {
    pub fn new() -> Self {
        // Name extraction is listed first: it consumes the whole matched
        // clause, so it wins any overlap with later rules.
        let rules = vec![
            // An explicit "my name is" prefix is a strong enough signal
            // to accept lowercase names; the casual "I'm ..." form still
            // requires capitalized tokens so "I'm interested in care"
            // never becomes a name.
            ExtractionRule {
                name: "name",
                regex: Regex::new(
                    r"(?i)\bmy name is\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})",
                )
                .unwrap(),
                apply: set_name,
            },
            ExtractionRule {
                name: "name_casual",
                regex: Regex::new(
                    r"\b(?i:i'?m|i am)\s+([A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){0,2})",
                )
                .unwrap(),
                apply: set_name,
            },
            ExtractionRule {
                name: "age",
                regex: Regex::new(r"(?i)\b(?:i'm|i am)\s+(\d{1,3})\s+years?\s+old").unwrap(),
                apply: set_age,
            },
            ExtractionRule {
                name: "age_short",
                regex: Regex::new(r"(?i)\b(\d{1,3})\s*yo\b").unwrap(),
                apply: set_age,
            },
            ExtractionRule {
                name: "street_address",
                regex: Regex::new(
                    r"(?i)\b(\d+\s+(?:[a-z][a-z'.\-]*\s+)*(?:street|st|avenue|ave|road|rd|drive|dr|lane|ln|way|boulevard|blvd))\b",
                )
                .unwrap(),
                apply: set_street,
            },
            ExtractionRule {
                name: "phone",
                regex: Regex::new(r"\b(\d{3}[-.]?\d{3}[-.]?\d{4})\b").unwrap(),
                apply: set_phone,
            },
            ExtractionRule {
                name: "zip",
                regex: Regex::new(r"\b(\d{5})\b").unwrap(),
                apply: set_zip,
            },
            ExtractionRule {
                name: "medicaid_id",
                regex: Regex::new(r"(?i)\bmedicaid\s*(?:id|number|#)?\s*:?\s*([a-z0-9]+)").unwrap(),
                apply: set_medicaid,
            },
        ];
        Self { rules }
    }

    /// Run every rule over the message and union the results. Absent
    /// fields mean "not found in this message", never "cleared".
    pub fn extract(&self, message: &str) -> ProfileFragment {
        let mut fragment = ProfileFragment::default();
        for rule in &self.rules {
            if let Some(caps) = rule.regex.captures(message) {
                (rule.apply)(&mut fragment, &caps);
                debug!(rule = rule.name, "Extraction rule matched");
            }
        }
        fragment
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Field setters ───────────────────────────────────────────────────

/// Words that end a name capture when they trail it ("maria lopez and ...").
const NAME_STOPWORDS: &[&str] = &["and", "but", "i", "a", "the", "my"];

fn set_name(fragment: &mut ProfileFragment, caps: &Captures) {
    if fragment.first_name.is_some() {
        return;
    }
    let full = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let tokens: Vec<&str> = full
        .split_whitespace()
        .take_while(|t| !NAME_STOPWORDS.contains(&t.to_lowercase().as_str()))
        .collect();
    match tokens.as_slice() {
        [] => {}
        [first] => fragment.first_name = Some((*first).to_string()),
        [first, rest @ .., last] => {
            fragment.first_name = Some((*first).to_string());
            fragment.last_name = Some((*last).to_string());
            if !rest.is_empty() {
                fragment.middle_name = Some(rest.join(" "));
            }
        }
    }
}

fn set_age(fragment: &mut ProfileFragment, caps: &Captures) {
    if fragment.age.is_some() {
        return;
    }
    fragment.age = caps.get(1).and_then(|m| m.as_str().parse().ok());
}

fn set_street(fragment: &mut ProfileFragment, caps: &Captures) {
    fragment.street_address = caps.get(1).map(|m| m.as_str().trim().to_string());
}

fn set_phone(fragment: &mut ProfileFragment, caps: &Captures) {
    let digits: String = caps
        .get(1)
        .map(|m| m.as_str().chars().filter(|c| c.is_ascii_digit()).collect())
        .unwrap_or_default();
    fragment.phone = Some(digits);
}

fn set_zip(fragment: &mut ProfileFragment, caps: &Captures) {
    fragment.zip_code = caps.get(1).map(|m| m.as_str().to_string());
}

fn set_medicaid(fragment: &mut ProfileFragment, caps: &Captures) {
    fragment.medicaid_id = caps.get(1).map(|m| m.as_str().to_uppercase());
}
