//! Completed cycle repository.
//!
//! Owns the `completed_cycles` table and the bot cycle counter. The unique
//! `unique_bot_cycle` index on `(bot_id, cycle_number)` is the idempotency
//! guarantee for finalization; there is deliberately no application-level
//! existence check in front of it.

use anyhow::Result;
use chrono::{DateTime, Utc};
use gem_arena_core::{CompletedCycle, CycleError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::CompletedCycleRecord;

const CYCLE_COLUMNS: &str = "id, bot_id, cycle_number, total_games, wins, losses, draws, \
     total_bet_amount, total_winnings, total_losses, net_profit, active_pool, \
     roi_active, completed_at";

/// Repository for finalized cycle rows.
#[derive(Debug, Clone)]
pub struct CycleRepository {
    pool: PgPool,
}

impl CycleRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a finalized cycle and bumps the bot's cycle counter in the
    /// same transaction.
    ///
    /// # Errors
    /// Returns `CycleError::DuplicateCycle` if a row for this
    /// `(bot_id, cycle_number)` already exists, or `CycleError::Persistence`
    /// for any other database failure.
    pub async fn insert_completed(
        &self,
        cycle: &CompletedCycle,
    ) -> std::result::Result<(), CycleError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))?;

        let insert = sqlx::query(
            r"
            INSERT INTO completed_cycles
                (bot_id, cycle_number, total_games, wins, losses, draws,
                 total_bet_amount, total_winnings, total_losses, net_profit,
                 active_pool, roi_active, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ",
        )
        .bind(&cycle.bot_id)
        .bind(cycle.cycle_number)
        .bind(cycle.total_games as i32)
        .bind(cycle.wins as i32)
        .bind(cycle.losses as i32)
        .bind(cycle.draws as i32)
        .bind(cycle.total_bet_amount)
        .bind(cycle.total_winnings)
        .bind(cycle.total_losses)
        .bind(cycle.net_profit)
        .bind(cycle.active_pool)
        .bind(cycle.roi_active)
        .bind(cycle.completed_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            return Err(if is_unique_violation(&e) {
                CycleError::duplicate_cycle(&cycle.bot_id, cycle.cycle_number)
            } else {
                CycleError::persistence(e.to_string())
            });
        }

        sqlx::query(
            r"
            UPDATE bots
            SET completed_cycles_count = completed_cycles_count + 1,
                updated_at = now()
            WHERE bot_id = $1
            ",
        )
        .bind(&cycle.bot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| CycleError::persistence(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| CycleError::persistence(e.to_string()))?;

        Ok(())
    }

    /// Number of finalized cycles for a bot.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn count_for_bot(&self, bot_id: &str) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM completed_cycles WHERE bot_id = $1")
                .bind(bot_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Fetches one page of a bot's cycles ordered by `cycle_number` ascending.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn fetch_page(
        &self,
        bot_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CompletedCycleRecord>> {
        let records = sqlx::query_as::<_, CompletedCycleRecord>(&format!(
            r"
            SELECT {CYCLE_COLUMNS}
            FROM completed_cycles
            WHERE bot_id = $1
            ORDER BY cycle_number ASC
            OFFSET $2 LIMIT $3
            "
        ))
        .bind(bot_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Fetches one page of a bot's cycles, most recently completed first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn fetch_recent_page(
        &self,
        bot_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CompletedCycleRecord>> {
        let records = sqlx::query_as::<_, CompletedCycleRecord>(&format!(
            r"
            SELECT {CYCLE_COLUMNS}
            FROM completed_cycles
            WHERE bot_id = $1
            ORDER BY completed_at DESC
            OFFSET $2 LIMIT $3
            "
        ))
        .bind(bot_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Fetches every cycle for a bot, ordered by cycle number.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn fetch_all_for_bot(&self, bot_id: &str) -> Result<Vec<CompletedCycleRecord>> {
        let records = sqlx::query_as::<_, CompletedCycleRecord>(&format!(
            r"
            SELECT {CYCLE_COLUMNS}
            FROM completed_cycles
            WHERE bot_id = $1
            ORDER BY cycle_number ASC
            "
        ))
        .bind(bot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Sums `net_profit` over finalized cycles, for one bot or all bots.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn total_profit(&self, bot_id: Option<&str>) -> Result<Decimal> {
        let row: (Decimal,) = match bot_id {
            Some(bot_id) => {
                sqlx::query_as(
                    "SELECT COALESCE(SUM(net_profit), 0) FROM completed_cycles WHERE bot_id = $1",
                )
                .bind(bot_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COALESCE(SUM(net_profit), 0) FROM completed_cycles")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(row.0)
    }

    /// Aggregate revenue figures, optionally restricted to cycles completed
    /// at or after `since`.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn revenue_stats(&self, since: Option<DateTime<Utc>>) -> Result<RevenueStats> {
        let row: (
            i64,
            i64,
            Option<Decimal>,
            Option<Decimal>,
            Option<Decimal>,
            Option<Decimal>,
        ) = sqlx::query_as(
            r"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE net_profit > 0),
                SUM(total_bet_amount),
                SUM(total_winnings),
                SUM(total_losses),
                SUM(net_profit)
            FROM completed_cycles
            WHERE $1::timestamptz IS NULL OR completed_at >= $1
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueStats {
            total_cycles: row.0,
            profitable_cycles: row.1,
            total_bet_amount: row.2.unwrap_or(Decimal::ZERO),
            total_winnings: row.3.unwrap_or(Decimal::ZERO),
            total_losses: row.4.unwrap_or(Decimal::ZERO),
            net_profit: row.5.unwrap_or(Decimal::ZERO),
        })
    }

    /// Admin purge: deletes a bot's finalized cycles and resets its counter.
    ///
    /// # Errors
    /// Returns an error if the database transaction fails.
    pub async fn purge_bot(&self, bot_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM completed_cycles WHERE bot_id = $1")
            .bind(bot_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            "UPDATE bots SET completed_cycles_count = 0, updated_at = now() WHERE bot_id = $1",
        )
        .bind(bot_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(deleted)
    }

    /// Compares each bot's recorded counter against the actual row count and
    /// returns the bots whose two figures disagree.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn count_mismatches(&self) -> Result<Vec<CycleCountMismatch>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r"
            SELECT b.bot_id, b.completed_cycles_count, COUNT(c.id)
            FROM bots b
            LEFT JOIN completed_cycles c ON c.bot_id = b.bot_id
            GROUP BY b.bot_id, b.completed_cycles_count
            HAVING b.completed_cycles_count <> COUNT(c.id)
            ORDER BY b.bot_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(bot_id, recorded, actual)| CycleCountMismatch {
                bot_id,
                recorded,
                actual,
            })
            .collect())
    }
}

/// Aggregate revenue figures over finalized cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueStats {
    /// Cycles counted.
    pub total_cycles: i64,
    /// Cycles with `net_profit > 0`.
    pub profitable_cycles: i64,
    /// Sum of all stakes.
    pub total_bet_amount: Decimal,
    /// Sum of winning stakes.
    pub total_winnings: Decimal,
    /// Sum of losing stakes.
    pub total_losses: Decimal,
    /// Sum of `net_profit`.
    pub net_profit: Decimal,
}

/// A bot whose cycle counter disagrees with its row count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleCountMismatch {
    /// Bot identifier.
    pub bot_id: String,
    /// Value of `bots.completed_cycles_count`.
    pub recorded: i64,
    /// Actual `completed_cycles` row count.
    pub actual: i64,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_cloneable() {
        // handlers and the store share one repository over the same pool
        assert!(std::mem::size_of::<CycleRepository>() > 0);
    }

    #[test]
    fn mismatch_serializes_for_the_admin_endpoint() {
        let mismatch = CycleCountMismatch {
            bot_id: "bot-3".to_string(),
            recorded: 5,
            actual: 4,
        };
        let json = serde_json::to_string(&mismatch).expect("serialization failed");
        assert!(json.contains("bot-3"));
        assert!(json.contains('5'));
        assert!(json.contains('4'));
    }
}
