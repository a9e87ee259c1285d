//! Intake processor — orchestrates one inbound message end to end.
//!
//! Sequencing per message: classify → short-circuit on policy actions →
//! PHI redaction (audit only) → field extraction → per-phone lock →
//! load/merge/score → stage + next questions → persist exactly once →
//! reply. Persistence failure is logged and reported on the result,
//! never by discarding the already-computed reply.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::IntakeConfig;
use crate::conversation::ConversationStateMachine;
use crate::error::PipelineError;
use crate::extract::FieldExtractor;
use crate::pipeline::types::{
    InboundSms, Interaction, OutboundReply, ProcessedMessage, ReplyAction, ReplyGenerator,
    TemplateReplyGenerator,
};
use crate::policy::{
    Classification, MessageAction, MessageCategory, PhiGuard, PolicyClassifier, RedactionMode,
};
use crate::profile::Profile;
use crate::store::Database;

/// Orchestrates the intake pipeline. The pure stages are stateless; the
/// processor owns the compiled patterns, the store handle, and a keyed
/// lock that serializes merges for the same phone number.
pub struct IntakeProcessor {
    config: IntakeConfig,
    guard: PhiGuard,
    extractor: FieldExtractor,
    store: Arc<dyn Database>,
    generator: Arc<dyn ReplyGenerator>,
    phone_locks: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IntakeProcessor {
    pub fn new(
        config: IntakeConfig,
        store: Arc<dyn Database>,
        generator: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            config,
            guard: PhiGuard::new(),
            extractor: FieldExtractor::new(),
            store,
            generator,
            phone_locks: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Processor with the deterministic template reply generator.
    pub fn with_template_replies(config: IntakeConfig, store: Arc<dyn Database>) -> Self {
        Self::new(config, store, Arc::new(TemplateReplyGenerator))
    }

    /// Process a single inbound message through the full pipeline.
    pub async fn process(&self, message: InboundSms) -> Result<ProcessedMessage, PipelineError> {
        if message.phone_number.trim().is_empty() {
            return Err(PipelineError::InvalidMessage(
                "missing phone number".to_string(),
            ));
        }

        info!(
            id = %message.message_id,
            phone = %last4(&message.phone_number),
            "Processing inbound message"
        );

        // Classification sees the raw text: emergency phrases must be
        // caught even when they co-occur with PHI.
        let classification = PolicyClassifier::classify(&message.text, &self.config.policy);

        if classification.action != MessageAction::Process {
            debug!(
                id = %message.message_id,
                category = classification.label(),
                "Policy short-circuit — skipping extraction and merge"
            );
            // Nothing was written, so the persisted flag is false.
            return Ok(ProcessedMessage {
                reply: self.policy_reply(&classification),
                profile: None,
                next_questions: Vec::new(),
                persisted: false,
                processed_at: Utc::now(),
            });
        }

        // PHI guard feeds the audit record only; it never blocks.
        let phi_types = self.guard.detected_types(&message.text);
        let redacted_text = self.guard.redact(&message.text, RedactionMode::MaskPartial);
        let fragment = self.extractor.extract(&message.text);

        // Merges for the same phone are non-commutative (last write
        // wins), so they are serialized; different phones run freely.
        let lock = self.lock_for(&message.phone_number).await;
        let _guard = lock.lock().await;

        let mut profile = self
            .store
            .get_profile_by_phone(&message.phone_number)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Profile lookup failed, starting fresh");
                None
            })
            .unwrap_or_else(|| Profile::new(message.phone_number.clone()));

        profile.merge(&fragment, &self.config.weights);

        let stage = ConversationStateMachine::next_stage(&message.text, &fragment);
        let next_questions = ConversationStateMachine::next_questions(&profile, stage);

        let reply_text = match self
            .generator
            .generate(&profile, stage, &next_questions)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Reply generation failed, using static fallback");
                next_questions
                    .first()
                    .cloned()
                    .unwrap_or_else(|| self.config.policy.responses.unknown.clone())
            }
        };

        let interaction = Interaction {
            id: Uuid::new_v4(),
            profile_id: profile.id,
            phone_number: message.phone_number.clone(),
            raw_text: message.text.clone(),
            redacted_text: redacted_text.clone(),
            phi_types,
            category: classification.category,
            action: classification.action,
            fragment,
            stage,
            questions: next_questions.clone(),
            received_at: Utc::now(),
        };

        let persisted = self.persist(&profile, &interaction).await;

        info!(
            id = %message.message_id,
            stage = stage.label(),
            completion = profile.completion_pct,
            text = %redacted_text,
            "Message processed"
        );

        Ok(ProcessedMessage {
            reply: OutboundReply {
                reply_text,
                action: ReplyAction::Process,
                escalate: false,
            },
            profile: Some(profile),
            next_questions,
            persisted,
            processed_at: Utc::now(),
        })
    }

    /// Process a batch of messages. Failures on individual messages are
    /// logged but don't fail the batch.
    pub async fn process_batch(&self, messages: Vec<InboundSms>) -> Vec<ProcessedMessage> {
        let count = messages.len();
        let mut results = Vec::with_capacity(count);
        for message in messages {
            match self.process(message).await {
                Ok(processed) => results.push(processed),
                Err(e) => {
                    error!(error = %e, "Failed to process message in batch");
                }
            }
        }
        info!(processed = results.len(), total = count, "Batch complete");
        results
    }

    /// Canned reply for a short-circuiting classification.
    fn policy_reply(&self, classification: &Classification) -> OutboundReply {
        let responses = &self.config.policy.responses;
        match classification.category {
            MessageCategory::Emergency => OutboundReply {
                reply_text: responses.emergency.clone(),
                action: ReplyAction::Redirect,
                escalate: true,
            },
            MessageCategory::Blocked => OutboundReply {
                reply_text: responses.strict_block.clone(),
                action: ReplyAction::Block,
                escalate: false,
            },
            MessageCategory::SoftBlock => OutboundReply {
                reply_text: responses.soft_block.clone(),
                action: ReplyAction::Redirect,
                escalate: false,
            },
            _ => OutboundReply {
                reply_text: responses.unknown.clone(),
                action: ReplyAction::Redirect,
                escalate: false,
            },
        }
    }

    /// Best-effort persistence. Returns false on failure; the computed
    /// reply is kept either way.
    async fn persist(&self, profile: &Profile, interaction: &Interaction) -> bool {
        if let Err(e) = self.store.upsert_profile(profile).await {
            error!(error = %e, "Failed to persist profile");
            return false;
        }
        if let Err(e) = self.store.append_interaction(interaction).await {
            error!(error = %e, "Failed to append interaction");
            return false;
        }
        true
    }

    async fn lock_for(&self, phone: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.phone_locks.lock().await;
        // An entry only the map still references has no holder and can be
        // recreated on demand; evict it so the map is bounded by in-flight
        // messages, not by distinct phone numbers seen.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Last four digits for logs — never the full number.
fn last4(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(4);
    format!("***{}", digits[start..].iter().collect::<String>())
}
