//! PostgreSQL implementation of the durable cycle store.

use async_trait::async_trait;
use gem_arena_core::{CompletedCycle, CycleError, CycleRunState, CycleStore};
use sqlx::PgPool;

use crate::repositories::{CycleRepository, RunStateRepository};

/// [`CycleStore`] backed by the `completed_cycles` and `cycle_run_state`
/// tables.
#[derive(Debug, Clone)]
pub struct PgCycleStore {
    cycles: CycleRepository,
    run_states: RunStateRepository,
}

impl PgCycleStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            cycles: CycleRepository::new(pool.clone()),
            run_states: RunStateRepository::new(pool),
        }
    }
}

#[async_trait]
impl CycleStore for PgCycleStore {
    async fn insert_completed(&self, cycle: &CompletedCycle) -> Result<(), CycleError> {
        self.cycles.insert_completed(cycle).await
    }

    async fn save_run_state(&self, state: &CycleRunState) -> Result<(), CycleError> {
        self.run_states
            .upsert(state)
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))
    }

    async fn load_run_state(&self, bot_id: &str) -> Result<Option<CycleRunState>, CycleError> {
        self.run_states
            .load(bot_id)
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))
    }

    async fn clear_run_state(&self, bot_id: &str) -> Result<(), CycleError> {
        self.run_states
            .clear(bot_id)
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))
    }

    async fn completed_cycles_count(&self, bot_id: &str) -> Result<i64, CycleError> {
        self.cycles
            .count_for_bot(bot_id)
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))
    }
}
