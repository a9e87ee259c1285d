//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Entity bodies are stored
//! as JSON in a `data` column next to the columns used for lookups and
//! indexing, so schema churn on the entities doesn't need migrations.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::pipeline::types::Interaction;
use crate::profile::Profile;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }
}

fn row_to_profile(row: &libsql::Row) -> Result<Profile, DatabaseError> {
    let data: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn row_to_interaction(row: &libsql::Row) -> Result<Interaction, DatabaseError> {
    let data: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run(&self.conn).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(profile)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO profiles
                    (id, phone_number, data, completion_pct, verification, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(phone_number) DO UPDATE SET
                    data = excluded.data,
                    completion_pct = excluded.completion_pct,
                    verification = excluded.verification,
                    updated_at = excluded.updated_at",
                params![
                    profile.id.to_string(),
                    profile.phone_number.clone(),
                    data,
                    profile.completion_pct as i64,
                    profile.verification.label(),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_profile: {e}")))?;
        debug!(phone = %profile.phone_number, completion = profile.completion_pct, "Profile upserted");
        Ok(())
    }

    async fn get_profile_by_phone(&self, phone: &str) -> Result<Option<Profile>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT data FROM profiles WHERE phone_number = ?1",
                params![phone],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile_by_phone: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            Some(row) => Ok(Some(row_to_profile(&row)?)),
            None => Ok(None),
        }
    }

    async fn append_interaction(&self, interaction: &Interaction) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(interaction)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO interactions
                    (id, profile_id, phone_number, raw_text, redacted_text, data, stage,
                     received_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    interaction.id.to_string(),
                    interaction.profile_id.to_string(),
                    interaction.phone_number.clone(),
                    interaction.raw_text.clone(),
                    interaction.redacted_text.clone(),
                    data,
                    interaction.stage.label(),
                    interaction.received_at.to_rfc3339(),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_interaction: {e}")))?;
        Ok(())
    }

    async fn list_interactions(
        &self,
        profile_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Interaction>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT data FROM interactions
                 WHERE profile_id = ?1
                 ORDER BY received_at DESC
                 LIMIT ?2",
                params![profile_id.to_string(), limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_interactions: {e}")))?;

        let mut interactions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            interactions.push(row_to_interaction(&row)?);
        }
        Ok(interactions)
    }
}
