//! Shared types for the intake pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::ConversationStage;
use crate::error::PipelineError;
use crate::policy::{MessageAction, MessageCategory, PhiType};
use crate::profile::{Profile, ProfileFragment};

// ── Inbound / outbound contracts ────────────────────────────────────

/// Inbound message from the SMS/chat transport collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundSms {
    /// Sender phone number — the unique key for profile matching.
    pub phone_number: String,
    /// Raw message text.
    pub text: String,
    /// Transport-native message ID.
    pub message_id: String,
}

/// What the transport should do with the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyAction {
    Block,
    Redirect,
    Process,
}

/// Outbound reply produced for the transport collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundReply {
    pub reply_text: String,
    pub action: ReplyAction,
    /// True only for emergency classifications.
    pub escalate: bool,
}

// ── Interaction audit record ────────────────────────────────────────

/// One inbound message plus everything derived from it. Immutable once
/// created; the store keeps an append-only log per profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub phone_number: String,
    pub raw_text: String,
    /// Raw text with PHI masked — the only form that is ever logged.
    pub redacted_text: String,
    pub phi_types: Vec<PhiType>,
    pub category: MessageCategory,
    pub action: MessageAction,
    pub fragment: ProfileFragment,
    /// Stage at time of receipt.
    pub stage: ConversationStage,
    pub questions: Vec<String>,
    pub received_at: DateTime<Utc>,
}

// ── Pipeline result ─────────────────────────────────────────────────

/// Result of processing one message through the full pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedMessage {
    pub reply: OutboundReply,
    /// Updated profile — `None` when the policy short-circuited.
    pub profile: Option<Profile>,
    pub next_questions: Vec<String>,
    /// True only when the profile and interaction were written. False for
    /// policy short-circuits (nothing to write) and persistence failures.
    pub persisted: bool,
    pub processed_at: DateTime<Utc>,
}

// ── Reply generator ─────────────────────────────────────────────────

/// Opaque text-completion collaborator that phrases the reply. The
/// pipeline falls back to a static template when it fails, so a turn
/// never fails on reply generation alone.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &Profile,
        stage: ConversationStage,
        questions: &[String],
    ) -> Result<String, PipelineError>;
}

/// Default generator: deterministic templates, no external calls.
pub struct TemplateReplyGenerator;

#[async_trait]
impl ReplyGenerator for TemplateReplyGenerator {
    async fn generate(
        &self,
        profile: &Profile,
        _stage: ConversationStage,
        questions: &[String],
    ) -> Result<String, PipelineError> {
        let question = questions
            .first()
            .cloned()
            .unwrap_or_else(|| "How can I help with your care application?".to_string());
        let reply = match &profile.first_name {
            Some(name) if profile.interaction_count <= 1 => {
                format!("Thanks, {name}! {question}")
            }
            _ => question,
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldWeights;

    #[tokio::test]
    async fn template_generator_greets_on_first_interaction() {
        let mut profile = Profile::new("7025551234".into());
        profile.merge(
            &ProfileFragment {
                first_name: Some("Maria".into()),
                ..Default::default()
            },
            &FieldWeights::default(),
        );
        let reply = TemplateReplyGenerator
            .generate(
                &profile,
                ConversationStage::Intake,
                &["What is your last name?".to_string()],
            )
            .await
            .unwrap();
        assert!(reply.starts_with("Thanks, Maria!"));
        assert!(reply.contains("last name"));
    }

    #[tokio::test]
    async fn template_generator_without_questions_still_replies() {
        let profile = Profile::new("7025551234".into());
        let reply = TemplateReplyGenerator
            .generate(&profile, ConversationStage::General, &[])
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }

    #[test]
    fn reply_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ReplyAction::Redirect).unwrap(),
            serde_json::json!("redirect")
        );
    }

    #[test]
    fn interaction_roundtrips_through_json() {
        let interaction = Interaction {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            phone_number: "7025551234".into(),
            raw_text: "my ssn is 123-45-6789".into(),
            redacted_text: "my ssn is ***-**-6789".into(),
            phi_types: vec![PhiType::Ssn],
            category: MessageCategory::Allowed,
            action: MessageAction::Process,
            fragment: ProfileFragment::default(),
            stage: ConversationStage::General,
            questions: vec!["What is your first name?".into()],
            received_at: Utc::now(),
        };
        let json = serde_json::to_string(&interaction).unwrap();
        let back: Interaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phone_number, interaction.phone_number);
        assert_eq!(back.phi_types, interaction.phi_types);
    }
}
