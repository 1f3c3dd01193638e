use gem_arena_core::BotCycleConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum BotCommand {
    Start,
    Stop,
    Pause,
    Resume,
    UpdateConfig(Box<BotConfig>),
    GetStatus(oneshot::Sender<BotStatus>),
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub bot_id: String,
    pub enabled: bool,

    /// Cycle shape: bet bounds, game count, outcome counts, stake split.
    pub cycle: BotCycleConfig,

    /// Pause between games in a running cycle. Tuning, not contract.
    #[serde(default = "default_game_interval_secs")]
    pub game_interval_secs: u64,

    /// Planner seed. Defaults to a hash of the bot id so plans are
    /// reproducible across restarts without extra configuration.
    #[serde(default)]
    pub planner_seed: Option<u64>,
}

const fn default_game_interval_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    pub bot_id: String,
    pub state: BotState,
    /// Cycle currently in flight, if any.
    pub cycle_number: Option<i64>,
    /// Games resolved in the in-flight cycle.
    pub resolved_count: u32,
    /// Cycles finalized since the bot was configured.
    pub completed_cycles: i64,
    pub last_heartbeat: chrono::DateTime<chrono::Utc>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotState {
    Stopped,
    Running,
    Paused,
    Error,
}
