use async_trait::async_trait;

use crate::cycle::{CompletedCycle, CycleRunState, Outcome, PlannedBet};
use crate::error::Result;

/// Resolves planned bets against the underlying game mechanism.
///
/// For bot-controlled games the outcome is predetermined and the resolver
/// returns the bet's intended outcome; the executor never assumes this.
#[async_trait]
pub trait GameResolver: Send + Sync {
    /// Resolves one bet to an actual outcome.
    ///
    /// # Errors
    /// Returns `CycleError::Resolution` when no outcome can be determined;
    /// the caller leaves the cycle in its current partial state and retries.
    async fn resolve(&self, bot_id: &str, bet: &PlannedBet) -> Result<Outcome>;
}

/// Durable store backing cycle finalization and resumable run state.
///
/// `insert_completed` must be guarded by a storage-level uniqueness
/// constraint on `(bot_id, cycle_number)`; a second insert for the same pair
/// fails with `CycleError::DuplicateCycle` regardless of interleaving.
#[async_trait]
pub trait CycleStore: Send + Sync {
    /// Persists a finalized cycle exactly once.
    ///
    /// # Errors
    /// Returns `CycleError::DuplicateCycle` if the `(bot_id, cycle_number)`
    /// pair is already recorded, or `CycleError::Persistence` when the store
    /// is unavailable.
    async fn insert_completed(&self, cycle: &CompletedCycle) -> Result<()>;

    /// Snapshots the in-progress run state for restart recovery.
    ///
    /// # Errors
    /// Returns `CycleError::Persistence` when the store is unavailable.
    async fn save_run_state(&self, state: &CycleRunState) -> Result<()>;

    /// Loads the persisted run state for a bot, if a cycle is in progress.
    ///
    /// # Errors
    /// Returns `CycleError::Persistence` when the store is unavailable.
    async fn load_run_state(&self, bot_id: &str) -> Result<Option<CycleRunState>>;

    /// Removes the run state once its cycle has finalized.
    ///
    /// # Errors
    /// Returns `CycleError::Persistence` when the store is unavailable.
    async fn clear_run_state(&self, bot_id: &str) -> Result<()>;

    /// Number of finalized cycles recorded for a bot.
    ///
    /// # Errors
    /// Returns `CycleError::Persistence` when the store is unavailable.
    async fn completed_cycles_count(&self, bot_id: &str) -> Result<i64>;
}
