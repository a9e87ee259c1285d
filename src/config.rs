//! Configuration types.
//!
//! Policy keyword lists, tier response text, and field weights are data,
//! not code: loaded once at startup (JSON file or defaults) and treated
//! as immutable for the process lifetime.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Content-policy configuration: four ordered phrase sets plus the canned
/// response for each tier. An empty list simply never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Phrases that indicate a medical or safety emergency.
    pub emergency_keywords: Vec<String>,
    /// Phrases that are never answered (legal/clinical advice, abuse).
    pub strict_blocks: Vec<String>,
    /// Off-topic phrases that get a brief redirect.
    pub soft_blocks: Vec<String>,
    /// In-domain phrases: messages containing one are processed normally.
    pub allowed_domain_phrases: Vec<String>,
    /// Canned response text per tier.
    pub responses: TierResponses,
}

/// Response text for each classification tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierResponses {
    pub emergency: String,
    pub strict_block: String,
    pub soft_block: String,
    pub unknown: String,
}

impl Default for TierResponses {
    fn default() -> Self {
        Self {
            emergency: "If this is a medical emergency, please hang up and dial 911 \
                        or go to the nearest emergency room right away."
                .to_string(),
            strict_block: "I'm sorry, I can't help with that. A care coordinator will \
                           follow up with you directly."
                .to_string(),
            soft_block: "I can only help with home-care enrollment questions. \
                         Is there anything about your care application I can help with?"
                .to_string(),
            unknown: "I didn't quite catch that. I can help you enroll in home-care \
                      services — could you tell me a bit about what you need?"
                .to_string(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            emergency_keywords: strings(&[
                "911",
                "can't breathe",
                "cannot breathe",
                "chest pain",
                "heart attack",
                "stroke",
                "unconscious",
                "overdose",
                "suicide",
                "bleeding badly",
                "fell and can't get up",
            ]),
            strict_blocks: strings(&[
                "lawsuit",
                "sue you",
                "legal advice",
                "prescribe",
                "diagnose me",
                "buy drugs",
            ]),
            soft_blocks: strings(&[
                "weather",
                "sports",
                "lottery",
                "joke",
                "bitcoin",
                "politics",
            ]),
            allowed_domain_phrases: strings(&[
                "name",
                "address",
                "zip",
                "phone",
                "email",
                "medicaid",
                "medicare",
                "insurance",
                "caregiver",
                "care",
                "nurse",
                "aide",
                "enroll",
                "apply",
                "application",
                "appointment",
                "visit",
                "emergency contact",
                "doctor",
                "physician",
                "medication",
                "condition",
                "allerg",
                "help",
                "hello",
                "hi",
                "update",
                "verify",
                "birth",
                "age",
                "years old",
            ]),
            responses: TierResponses::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Points awarded per field tier when computing completion percentage.
///
/// Tier membership is fixed (see `profile::model`); the point values are
/// tunable without redeploying logic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    /// Name (first+last), phone, zip.
    pub required: u32,
    /// DOB, street address, city, state, emergency contact name/phone.
    pub important: u32,
    /// Everything else that is scored.
    pub optional: u32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            required: 40,
            important: 30,
            optional: 10,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub policy: Policy,
    pub weights: FieldWeights,
}

impl IntakeConfig {
    /// Load configuration from a JSON file. Missing keys fall back to
    /// defaults; a missing file is an error (callers decide whether to
    /// fall back to `IntakeConfig::default()`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_all_tiers() {
        let policy = Policy::default();
        assert!(policy.emergency_keywords.contains(&"911".to_string()));
        assert!(!policy.strict_blocks.is_empty());
        assert!(!policy.soft_blocks.is_empty());
        assert!(!policy.allowed_domain_phrases.is_empty());
    }

    #[test]
    fn default_weights_match_scoring_tiers() {
        let w = FieldWeights::default();
        assert_eq!(w.required, 40);
        assert_eq!(w.important, 30);
        assert_eq!(w.optional, 10);
    }

    #[test]
    fn config_parses_partial_json() {
        let cfg: IntakeConfig = serde_json::from_str(
            r#"{"policy": {"emergency_keywords": ["code blue"]}, "weights": {"required": 50}}"#,
        )
        .unwrap();
        assert_eq!(cfg.policy.emergency_keywords, vec!["code blue"]);
        // Untouched keys keep their defaults
        assert!(!cfg.policy.soft_blocks.is_empty());
        assert_eq!(cfg.weights.required, 50);
        assert_eq!(cfg.weights.important, 30);
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let err = IntakeConfig::load(Path::new("/nonexistent/intake.json"));
        assert!(err.is_err());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = IntakeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: IntakeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.policy.emergency_keywords,
            cfg.policy.emergency_keywords
        );
    }
}
