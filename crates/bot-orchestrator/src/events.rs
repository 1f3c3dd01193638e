use crate::commands::BotState;
use chrono::{DateTime, Utc};
use gem_arena_core::Outcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BotEvent {
    /// One planned game resolved. Observability only; nothing is persisted
    /// as a cycle record until the whole cycle completes.
    GameResolved {
        bot_id: String,
        cycle_number: i64,
        /// 1-based position within the cycle.
        game_index: u32,
        outcome: Outcome,
        amount: Decimal,
        running_pnl: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A cycle finalized and its record was persisted.
    CycleCompleted {
        bot_id: String,
        cycle_number: i64,
        total_games: u32,
        net_profit: Decimal,
        roi_active: f64,
        timestamp: DateTime<Utc>,
    },

    /// Bot lifecycle transition.
    StateChanged {
        bot_id: String,
        state: BotState,
        timestamp: DateTime<Utc>,
    },

    /// Error occurred.
    Error {
        bot_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// Latest bot status published on the watch channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatusSnapshot {
    pub bot_id: String,
    pub state: BotState,

    /// Cycle currently in flight, if any.
    pub cycle_number: Option<i64>,
    /// Games resolved in the in-flight cycle.
    pub resolved_count: u32,
    /// Games per cycle, from the bot's configuration.
    pub cycle_games: u32,
    /// Running profit and loss of the in-flight cycle.
    pub running_pnl: Decimal,
    /// Cycles finalized so far.
    pub completed_cycles: i64,

    pub last_heartbeat: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,

    /// Recent events (last 10).
    pub recent_events: Vec<BotEvent>,

    pub error: Option<String>,
}

impl BotStatusSnapshot {
    /// Initial snapshot for a freshly spawned, stopped bot.
    #[must_use]
    pub fn initial(bot_id: impl Into<String>, cycle_games: u32) -> Self {
        Self {
            bot_id: bot_id.into(),
            state: BotState::Stopped,
            cycle_number: None,
            resolved_count: 0,
            cycle_games,
            running_pnl: Decimal::ZERO,
            completed_cycles: 0,
            last_heartbeat: Utc::now(),
            started_at: None,
            recent_events: Vec::new(),
            error: None,
        }
    }
}
