use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A bot row: stored configuration plus the finalized-cycle counter.
///
/// `completed_cycles_count` is maintained in the same transaction as every
/// cycle insert, so it always equals the number of `completed_cycles` rows
/// owned by the bot.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BotRecord {
    /// Bot identifier.
    pub bot_id: String,
    /// Serialized bot configuration.
    pub config_json: JsonValue,
    /// Whether the bot is restored and eligible for cycle automation.
    pub enabled: bool,
    /// Count of finalized cycles.
    pub completed_cycles_count: i64,
    /// When the bot was first configured.
    pub created_at: DateTime<Utc>,
    /// Last configuration or counter update.
    pub updated_at: DateTime<Utc>,
}
