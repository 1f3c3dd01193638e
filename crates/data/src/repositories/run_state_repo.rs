//! Run state repository.
//!
//! Snapshots in-progress cycles so a restarted bot resumes at its last
//! resolved game instead of replanning. One row per bot; the row is removed
//! when the cycle finalizes.

use anyhow::Result;
use gem_arena_core::CycleRunState;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Repository for resumable cycle run state.
#[derive(Debug, Clone)]
pub struct RunStateRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct RunStateRow {
    bot_id: String,
    cycle_number: i64,
    resolved_count: i32,
    wins_resolved: i32,
    losses_resolved: i32,
    draws_resolved: i32,
    running_pnl: Decimal,
    total_winnings: Decimal,
    total_losses: Decimal,
    total_draw_stake: Decimal,
}

impl From<RunStateRow> for CycleRunState {
    fn from(row: RunStateRow) -> Self {
        Self {
            bot_id: row.bot_id,
            cycle_number: row.cycle_number,
            resolved_count: row.resolved_count.unsigned_abs(),
            wins_resolved: row.wins_resolved.unsigned_abs(),
            losses_resolved: row.losses_resolved.unsigned_abs(),
            draws_resolved: row.draws_resolved.unsigned_abs(),
            running_pnl: row.running_pnl,
            total_winnings: row.total_winnings,
            total_losses: row.total_losses,
            total_draw_stake: row.total_draw_stake,
        }
    }
}

impl RunStateRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces the run state snapshot for a bot.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, state: &CycleRunState) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cycle_run_state
                (bot_id, cycle_number, resolved_count, wins_resolved,
                 losses_resolved, draws_resolved, running_pnl, total_winnings,
                 total_losses, total_draw_stake, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ON CONFLICT (bot_id) DO UPDATE SET
                cycle_number = excluded.cycle_number,
                resolved_count = excluded.resolved_count,
                wins_resolved = excluded.wins_resolved,
                losses_resolved = excluded.losses_resolved,
                draws_resolved = excluded.draws_resolved,
                running_pnl = excluded.running_pnl,
                total_winnings = excluded.total_winnings,
                total_losses = excluded.total_losses,
                total_draw_stake = excluded.total_draw_stake,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&state.bot_id)
        .bind(state.cycle_number)
        .bind(state.resolved_count as i32)
        .bind(state.wins_resolved as i32)
        .bind(state.losses_resolved as i32)
        .bind(state.draws_resolved as i32)
        .bind(state.running_pnl)
        .bind(state.total_winnings)
        .bind(state.total_losses)
        .bind(state.total_draw_stake)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads the run state snapshot for a bot, if one exists.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn load(&self, bot_id: &str) -> Result<Option<CycleRunState>> {
        let row = sqlx::query_as::<_, RunStateRow>(
            r"
            SELECT bot_id, cycle_number, resolved_count, wins_resolved,
                   losses_resolved, draws_resolved, running_pnl, total_winnings,
                   total_losses, total_draw_stake
            FROM cycle_run_state
            WHERE bot_id = $1
            ",
        )
        .bind(bot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CycleRunState::from))
    }

    /// Removes the run state snapshot for a bot.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn clear(&self, bot_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM cycle_run_state WHERE bot_id = $1")
            .bind(bot_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
