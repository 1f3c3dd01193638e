//! Finalized cycle rows.

use chrono::{DateTime, Utc};
use gem_arena_core::CompletedCycle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A finalized cycle as stored in `completed_cycles`.
///
/// Never mutated after insert; `(bot_id, cycle_number)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompletedCycleRecord {
    /// Storage-assigned row id.
    pub id: i64,
    /// Bot that owns this cycle.
    pub bot_id: String,
    /// Ascending cycle number, unique per bot.
    pub cycle_number: i64,
    /// Games in the cycle.
    pub total_games: i32,
    /// Resolved wins.
    pub wins: i32,
    /// Resolved losses.
    pub losses: i32,
    /// Resolved draws.
    pub draws: i32,
    /// Sum of all stakes, draws included.
    pub total_bet_amount: Decimal,
    /// Sum of stakes on wins.
    pub total_winnings: Decimal,
    /// Sum of stakes on losses.
    pub total_losses: Decimal,
    /// `total_winnings - total_losses`.
    pub net_profit: Decimal,
    /// `total_winnings + total_losses`.
    pub active_pool: Decimal,
    /// `net_profit / active_pool * 100`, 0 for all-draw cycles.
    pub roi_active: f64,
    /// When the cycle finalized.
    pub completed_at: DateTime<Utc>,
}

impl CompletedCycleRecord {
    /// Returns true if the cycle closed with a positive net profit.
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }
}

impl From<CompletedCycleRecord> for CompletedCycle {
    fn from(record: CompletedCycleRecord) -> Self {
        Self {
            bot_id: record.bot_id,
            cycle_number: record.cycle_number,
            total_games: record.total_games.unsigned_abs(),
            wins: record.wins.unsigned_abs(),
            losses: record.losses.unsigned_abs(),
            draws: record.draws.unsigned_abs(),
            total_bet_amount: record.total_bet_amount,
            total_winnings: record.total_winnings,
            total_losses: record.total_losses,
            net_profit: record.net_profit,
            active_pool: record.active_pool,
            roi_active: record.roi_active,
            completed_at: record.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_record() -> CompletedCycleRecord {
        CompletedCycleRecord {
            id: 1,
            bot_id: "bot-1".to_string(),
            cycle_number: 3,
            total_games: 16,
            wins: 7,
            losses: 6,
            draws: 3,
            total_bet_amount: dec!(809),
            total_winnings: dec!(356),
            total_losses: dec!(291),
            net_profit: dec!(65),
            active_pool: dec!(647),
            roi_active: 10.05,
            completed_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn profitable_when_net_profit_positive() {
        assert!(sample_record().is_profitable());

        let mut losing = sample_record();
        losing.net_profit = dec!(-10);
        assert!(!losing.is_profitable());

        let mut flat = sample_record();
        flat.net_profit = Decimal::ZERO;
        assert!(!flat.is_profitable());
    }

    #[test]
    fn converts_to_domain_cycle() {
        let cycle: CompletedCycle = sample_record().into();
        assert_eq!(cycle.bot_id, "bot-1");
        assert_eq!(cycle.total_games, 16);
        assert_eq!(cycle.wins + cycle.losses + cycle.draws, cycle.total_games);
        assert_eq!(cycle.net_profit, cycle.total_winnings - cycle.total_losses);
        assert_eq!(cycle.active_pool, cycle.total_winnings + cycle.total_losses);
    }
}
