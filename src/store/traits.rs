//! `Database` trait — the abstract persistence collaborator.
//!
//! Any key-value or relational store can sit behind this. Profiles are
//! upserted by phone number; interactions are append-only and keyed by
//! profile. Profiles are never hard-deleted (audit/compliance).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::pipeline::types::Interaction;
use crate::profile::Profile;

/// Backend-agnostic persistence for profiles and interactions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert or update a profile, keyed by its phone number.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), DatabaseError>;

    /// Look up a profile by phone number.
    async fn get_profile_by_phone(&self, phone: &str) -> Result<Option<Profile>, DatabaseError>;

    /// Append one interaction to a profile's log.
    async fn append_interaction(&self, interaction: &Interaction) -> Result<(), DatabaseError>;

    /// Most recent interactions for a profile, newest first.
    async fn list_interactions(
        &self,
        profile_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>, DatabaseError>;
}
