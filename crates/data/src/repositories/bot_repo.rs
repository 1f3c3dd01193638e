//! Bot configuration repository.

use anyhow::Result;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::models::BotRecord;

const BOT_COLUMNS: &str =
    "bot_id, config_json, enabled, completed_cycles_count, created_at, updated_at";

/// Repository for bot rows.
#[derive(Debug, Clone)]
pub struct BotRepository {
    pool: PgPool,
}

impl BotRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a bot's stored configuration.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, bot_id: &str, config_json: &JsonValue, enabled: bool) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO bots (bot_id, config_json, enabled)
            VALUES ($1, $2, $3)
            ON CONFLICT (bot_id) DO UPDATE SET
                config_json = excluded.config_json,
                enabled = excluded.enabled,
                updated_at = now()
            ",
        )
        .bind(bot_id)
        .bind(config_json)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a bot by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, bot_id: &str) -> Result<Option<BotRecord>> {
        let record = sqlx::query_as::<_, BotRecord>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE bot_id = $1"
        ))
        .bind(bot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists all bots, oldest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<BotRecord>> {
        let records = sqlx::query_as::<_, BotRecord>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists only enabled bots (for restore on startup).
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn enabled(&self) -> Result<Vec<BotRecord>> {
        let records = sqlx::query_as::<_, BotRecord>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE enabled = TRUE ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Enables or disables a bot. Disabled bots are skipped by cycle
    /// automation and not restored on startup.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn set_enabled(&self, bot_id: &str, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE bots SET enabled = $2, updated_at = now() WHERE bot_id = $1")
            .bind(bot_id)
            .bind(enabled)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deletes a bot. Its cycles and run state go with it via cascade.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn delete(&self, bot_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM bots WHERE bot_id = $1")
            .bind(bot_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
