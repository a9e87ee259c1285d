//! Care Intake — conversational intake core for home-care clients.
//!
//! Inbound SMS/chat messages flow through:
//! 1. `policy::PolicyClassifier` — tiered content policy (may short-circuit)
//! 2. `policy::PhiGuard` — PHI detection/redaction for audit logging
//! 3. `extract::FieldExtractor` — pattern-based profile field extraction
//! 4. `profile` — merge, completion scoring, verification status
//! 5. `conversation` — stateless stage selection and next questions
//! 6. `pipeline::IntakeProcessor` — orchestration and persistence

pub mod config;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod policy;
pub mod profile;
pub mod store;
