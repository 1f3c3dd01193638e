//! Domain types for bot cycles: configuration, planned bets, run state,
//! and settlement totals.
//!
//! A cycle is one complete batch of `cycle_games` bets for a bot, with a
//! fixed win/loss/draw count and a percentage-derived stake split. In-progress
//! cycles exist only as [`CycleRunState`]; finalized cycles become
//! [`CompletedCycle`] records and are never mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{CycleError, Result};

/// Tolerance when checking that the percentage triple sums to 100.
pub const PCT_SUM_EPSILON: f64 = 0.1;

/// Outcome of a single game within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The bot won the bet amount.
    Win,
    /// The bot lost the bet amount.
    Loss,
    /// Stake returned, no profit or loss.
    Draw,
}

impl Outcome {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "win" => Some(Self::Win),
            "loss" => Some(Self::Loss),
            "draw" => Some(Self::Draw),
            _ => None,
        }
    }
}

/// Immutable per-bot cycle configuration.
///
/// Set when a bot is configured and changed only by admin update. The count
/// triple must sum to `cycle_games` and the percentage triple to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotCycleConfig {
    /// Lower bound for every individual bet amount (whole gems).
    pub min_bet: Decimal,
    /// Upper bound for every individual bet amount (whole gems).
    pub max_bet: Decimal,
    /// Total games per cycle.
    pub cycle_games: u32,
    /// Number of games planned to win.
    pub wins_count: u32,
    /// Number of games planned to lose.
    pub losses_count: u32,
    /// Number of games planned to draw.
    pub draws_count: u32,
    /// Share of the total stake allocated to wins.
    pub wins_pct: f64,
    /// Share of the total stake allocated to losses.
    pub losses_pct: f64,
    /// Share of the total stake allocated to draws.
    pub draws_pct: f64,
}

impl BotCycleConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    /// Returns `CycleError::Configuration` if any invariant fails; see
    /// [`BotCycleConfig::validate`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_bet: Decimal,
        max_bet: Decimal,
        cycle_games: u32,
        wins_count: u32,
        losses_count: u32,
        draws_count: u32,
        wins_pct: f64,
        losses_pct: f64,
        draws_pct: f64,
    ) -> Result<Self> {
        let config = Self {
            min_bet,
            max_bet,
            cycle_games,
            wins_count,
            losses_count,
            draws_count,
            wins_pct,
            losses_pct,
            draws_pct,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration invariants.
    ///
    /// Checked here: positive game count, count triple sums to `cycle_games`,
    /// percentage triple sums to 100 within [`PCT_SUM_EPSILON`], non-negative
    /// percentages, positive whole-gem bet bounds with `min_bet <= max_bet`.
    /// Whether a bucket's allocated sub-total is realizable inside the bet
    /// range depends on the total stake and is checked by the planner.
    ///
    /// # Errors
    /// Returns `CycleError::Configuration` naming the failed invariant.
    pub fn validate(&self) -> Result<()> {
        if self.cycle_games == 0 {
            return Err(CycleError::configuration("cycle_games must be positive"));
        }

        let counts = self.wins_count + self.losses_count + self.draws_count;
        if counts != self.cycle_games {
            return Err(CycleError::configuration(format!(
                "outcome counts sum to {counts}, expected cycle_games {}",
                self.cycle_games
            )));
        }

        if self.wins_pct < 0.0 || self.losses_pct < 0.0 || self.draws_pct < 0.0 {
            return Err(CycleError::configuration(
                "outcome percentages must be non-negative",
            ));
        }

        let pct_sum = self.wins_pct + self.losses_pct + self.draws_pct;
        if (pct_sum - 100.0).abs() > PCT_SUM_EPSILON {
            return Err(CycleError::configuration(format!(
                "outcome percentages sum to {pct_sum}, expected 100"
            )));
        }

        if self.min_bet <= Decimal::ZERO {
            return Err(CycleError::configuration("min_bet must be positive"));
        }

        if self.min_bet > self.max_bet {
            return Err(CycleError::configuration(format!(
                "min_bet {} is above max_bet {}",
                self.min_bet, self.max_bet
            )));
        }

        if !self.min_bet.is_integer() || !self.max_bet.is_integer() {
            return Err(CycleError::configuration(
                "bet bounds must be whole gem amounts",
            ));
        }

        Ok(())
    }
}

/// One planned entry in a cycle. Immutable after planning; consumed
/// one-by-one by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBet {
    /// Stake for this game, within `[min_bet, max_bet]`.
    pub amount: Decimal,
    /// Outcome this bet is planned to produce.
    pub intended_outcome: Outcome,
}

/// Mutable per-bot, per-cycle counters.
///
/// Created when a cycle starts, updated after each game resolves, and
/// superseded by a [`CompletedCycle`] once every planned game has resolved.
/// An in-progress cycle is represented by this state alone; it is never
/// materialized as a terminal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRunState {
    /// Bot that owns this cycle.
    pub bot_id: String,
    /// Ascending cycle number, unique per bot.
    pub cycle_number: i64,
    /// Games resolved so far.
    pub resolved_count: u32,
    /// Wins resolved so far.
    pub wins_resolved: u32,
    /// Losses resolved so far.
    pub losses_resolved: u32,
    /// Draws resolved so far.
    pub draws_resolved: u32,
    /// Running profit and loss.
    pub running_pnl: Decimal,
    /// Sum of stakes on resolved wins.
    pub total_winnings: Decimal,
    /// Sum of stakes on resolved losses.
    pub total_losses: Decimal,
    /// Sum of stakes on resolved draws.
    pub total_draw_stake: Decimal,
}

impl CycleRunState {
    /// Creates a fresh run state at the start of a cycle.
    #[must_use]
    pub fn new(bot_id: impl Into<String>, cycle_number: i64) -> Self {
        Self {
            bot_id: bot_id.into(),
            cycle_number,
            resolved_count: 0,
            wins_resolved: 0,
            losses_resolved: 0,
            draws_resolved: 0,
            running_pnl: Decimal::ZERO,
            total_winnings: Decimal::ZERO,
            total_losses: Decimal::ZERO,
            total_draw_stake: Decimal::ZERO,
        }
    }

    /// Records one resolved game.
    pub fn record(&mut self, outcome: Outcome, amount: Decimal) {
        match outcome {
            Outcome::Win => {
                self.running_pnl += amount;
                self.total_winnings += amount;
                self.wins_resolved += 1;
            }
            Outcome::Loss => {
                self.running_pnl -= amount;
                self.total_losses += amount;
                self.losses_resolved += 1;
            }
            Outcome::Draw => {
                self.total_draw_stake += amount;
                self.draws_resolved += 1;
            }
        }
        self.resolved_count += 1;
    }

    /// Returns true once every planned game has resolved.
    #[must_use]
    pub fn is_complete(&self, cycle_games: u32) -> bool {
        self.resolved_count >= cycle_games
    }

    /// Settlement totals for the games resolved so far.
    #[must_use]
    pub fn totals(&self) -> CycleTotals {
        let net_profit = self.total_winnings - self.total_losses;
        // draws carry no win/loss risk and are excluded from the pool
        let active_pool = self.total_winnings + self.total_losses;
        let roi_active = if active_pool > Decimal::ZERO {
            (net_profit / active_pool * dec!(100)).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        CycleTotals {
            total_games: self.resolved_count,
            wins: self.wins_resolved,
            losses: self.losses_resolved,
            draws: self.draws_resolved,
            total_bet_amount: self.total_winnings + self.total_losses + self.total_draw_stake,
            total_winnings: self.total_winnings,
            total_losses: self.total_losses,
            net_profit,
            active_pool,
            roi_active,
        }
    }
}

/// Settlement totals computed from resolved games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleTotals {
    /// Games counted into these totals.
    pub total_games: u32,
    /// Resolved wins.
    pub wins: u32,
    /// Resolved losses.
    pub losses: u32,
    /// Resolved draws.
    pub draws: u32,
    /// Sum of all stakes, draws included.
    pub total_bet_amount: Decimal,
    /// Sum of stakes on wins.
    pub total_winnings: Decimal,
    /// Sum of stakes on losses.
    pub total_losses: Decimal,
    /// `total_winnings - total_losses`.
    pub net_profit: Decimal,
    /// `total_winnings + total_losses`; the risk-bearing stake.
    pub active_pool: Decimal,
    /// `net_profit / active_pool * 100`, or 0 when the pool is empty.
    pub roi_active: f64,
}

/// The durable record of a finished cycle.
///
/// Exactly one exists per `(bot_id, cycle_number)`; created by the finalizer
/// once all planned games resolve, never mutated, and deleted only by
/// explicit admin purge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedCycle {
    /// Bot that owns this cycle.
    pub bot_id: String,
    /// Ascending cycle number, unique per bot.
    pub cycle_number: i64,
    /// Games in the cycle.
    pub total_games: u32,
    /// Resolved wins.
    pub wins: u32,
    /// Resolved losses.
    pub losses: u32,
    /// Resolved draws.
    pub draws: u32,
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
    /// `net_profit / active_pool * 100`, or 0 for an all-draw cycle.
    pub roi_active: f64,
    /// When the cycle finalized.
    pub completed_at: DateTime<Utc>,
}

impl CompletedCycle {
    /// Builds the durable record from settlement totals.
    #[must_use]
    pub fn from_totals(
        bot_id: impl Into<String>,
        cycle_number: i64,
        totals: &CycleTotals,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bot_id: bot_id.into(),
            cycle_number,
            total_games: totals.total_games,
            wins: totals.wins,
            losses: totals.losses,
            draws: totals.draws,
            total_bet_amount: totals.total_bet_amount,
            total_winnings: totals.total_winnings,
            total_losses: totals.total_losses,
            net_profit: totals.net_profit,
            active_pool: totals.active_pool,
            roi_active: totals.roi_active,
            completed_at,
        }
    }

    /// Returns true if the cycle closed with a positive net profit.
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }
}
