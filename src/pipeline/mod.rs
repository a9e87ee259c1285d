//! Intake message pipeline.
//!
//! Every inbound SMS/chat message flows through:
//! 1. `PolicyClassifier` — may short-circuit with a canned policy reply
//! 2. `PhiGuard` — redaction for the audit record only, never blocking
//! 3. `FieldExtractor` — pattern-based profile fragment
//! 4. `Profile::merge` + scoring, under a per-phone lock
//! 5. `ConversationStateMachine` — stage and next question
//! 6. persistence of the profile and the interaction, exactly once

pub mod processor;
pub mod types;

pub use processor::IntakeProcessor;
pub use types::{
    InboundSms, Interaction, OutboundReply, ProcessedMessage, ReplyAction, ReplyGenerator,
    TemplateReplyGenerator,
};
