//! Tiered content-policy classifier.
//!
//! Runs before anything else touches a message to short-circuit the
//! obvious cases:
//! - Emergency phrases → immediate 911 redirect
//! - Strictly blocked topics (legal/clinical advice) → hard block
//! - Off-topic chatter → brief redirect
//! - In-domain phrases → process normally
//!
//! Matching is case-insensitive substring containment over four ordered
//! phrase sets; the first matching tier wins and lower tiers are never
//! evaluated. A message matching no tier is `Unknown`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Policy;

/// Classification tier a message landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Emergency,
    Blocked,
    SoftBlock,
    Allowed,
    Unknown,
}

/// What the pipeline should do with the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAction {
    ImmediateRedirect,
    StrictBlock,
    BriefRedirect,
    Process,
}

/// Handling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Result of classifying one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: MessageCategory,
    pub action: MessageAction,
    pub priority: Priority,
    /// The phrase that triggered the tier, if any.
    pub matched: Option<String>,
}

impl Classification {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self.category {
            MessageCategory::Emergency => "emergency",
            MessageCategory::Blocked => "blocked",
            MessageCategory::SoftBlock => "soft_block",
            MessageCategory::Allowed => "allowed",
            MessageCategory::Unknown => "unknown",
        }
    }
}

/// One precedence level: a phrase set and its fixed outcome.
struct Tier<'a> {
    phrases: &'a [String],
    category: MessageCategory,
    action: MessageAction,
    priority: Priority,
}

/// Tiered keyword classifier. Pure and deterministic: safe to call
/// concurrently and repeatedly; never fails, even on an empty policy.
pub struct PolicyClassifier;

impl PolicyClassifier {
    /// Classify a message against the given policy.
    ///
    /// Tiers are evaluated in strict precedence order (emergency →
    /// strict block → soft block → allowed); the first phrase hit wins.
    pub fn classify(message: &str, policy: &Policy) -> Classification {
        let text = message.to_lowercase();

        let tiers = [
            Tier {
                phrases: &policy.emergency_keywords,
                category: MessageCategory::Emergency,
                action: MessageAction::ImmediateRedirect,
                priority: Priority::Critical,
            },
            Tier {
                phrases: &policy.strict_blocks,
                category: MessageCategory::Blocked,
                action: MessageAction::StrictBlock,
                priority: Priority::High,
            },
            Tier {
                phrases: &policy.soft_blocks,
                category: MessageCategory::SoftBlock,
                action: MessageAction::BriefRedirect,
                priority: Priority::Medium,
            },
            Tier {
                phrases: &policy.allowed_domain_phrases,
                category: MessageCategory::Allowed,
                action: MessageAction::Process,
                priority: Priority::Low,
            },
        ];

        for tier in &tiers {
            if let Some(hit) = first_hit(&text, tier.phrases) {
                debug!(
                    category = ?tier.category,
                    phrase = %hit,
                    "Message matched policy tier"
                );
                return Classification {
                    category: tier.category,
                    action: tier.action,
                    priority: tier.priority,
                    matched: Some(hit.to_string()),
                };
            }
        }

        Classification {
            category: MessageCategory::Unknown,
            action: MessageAction::BriefRedirect,
            priority: Priority::Low,
            matched: None,
        }
    }
}

/// First phrase in the set contained in the (already lowercased) text.
fn first_hit<'a>(text: &str, phrases: &'a [String]) -> Option<&'a str> {
    phrases
        .iter()
        .map(String::as_str)
        .find(|p| !p.is_empty() && text.contains(&p.to_lowercase()))
}
