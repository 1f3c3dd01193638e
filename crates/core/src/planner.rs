//! Cycle planning: percentage bucket allocation and per-game bet amounts.
//!
//! The planner converts a [`BotCycleConfig`] into an exact, reproducible set
//! of per-game bet amounts. The total stake is split across the win/loss/draw
//! buckets with half-up rounding plus a largest-remainder correction, then
//! each bucket is filled with seeded pseudo-random amounts whose sum hits the
//! bucket sub-total exactly. Plans are deterministic for a given seed and
//! cycle number, so a resumed cycle replays the identical bet sequence.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::cycle::{BotCycleConfig, Outcome, PlannedBet};
use crate::error::{CycleError, Result};

/// Rounds a non-negative value to the nearest whole unit, ties away from zero.
#[must_use]
pub fn half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Plans cycles for one bot. Cheap to construct; holds only the bot's seed.
#[derive(Debug, Clone, Copy)]
pub struct CyclePlanner {
    seed: u64,
}

impl CyclePlanner {
    /// Creates a planner with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The default total stake basis: `(min_bet + max_bet) / 2 * cycle_games`,
    /// rounded half-up to whole gems.
    #[must_use]
    pub fn target_total(config: &BotCycleConfig) -> Decimal {
        let exact = (config.min_bet + config.max_bet) * Decimal::from(config.cycle_games) / dec!(2);
        Decimal::from(half_up(exact.to_f64().unwrap_or(0.0)))
    }

    /// Plans a cycle against the default total stake basis.
    ///
    /// # Errors
    /// Returns `CycleError::Configuration` if the config is invalid or a
    /// bucket's sub-total cannot be realized inside the bet range.
    pub fn plan_cycle(&self, config: &BotCycleConfig, cycle_number: i64) -> Result<Vec<PlannedBet>> {
        self.plan_cycle_with_total(config, cycle_number, Self::target_total(config))
    }

    /// Plans a cycle against an explicit reference total.
    ///
    /// Guarantees on success: exactly `cycle_games` bets, amounts summing to
    /// `total` exactly, every amount inside `[min_bet, max_bet]`, and
    /// per-outcome bet counts matching the configured counts.
    ///
    /// # Errors
    /// Returns `CycleError::Configuration` if the config is invalid, the
    /// total is not a whole gem amount, or a bucket's sub-total cannot be
    /// realized as `count` amounts inside `[min_bet, max_bet]`.
    pub fn plan_cycle_with_total(
        &self,
        config: &BotCycleConfig,
        cycle_number: i64,
        total: Decimal,
    ) -> Result<Vec<PlannedBet>> {
        config.validate()?;

        if !total.is_integer() {
            return Err(CycleError::configuration(format!(
                "total stake {total} is not a whole gem amount"
            )));
        }
        let total_units = total
            .to_i64()
            .ok_or_else(|| CycleError::configuration(format!("total stake {total} out of range")))?;
        if total_units <= 0 {
            return Err(CycleError::configuration(format!(
                "total stake {total} must be positive"
            )));
        }

        // validate() guarantees integral bounds
        let min = config.min_bet.to_i64().unwrap_or(1);
        let max = config.max_bet.to_i64().unwrap_or(min);

        let mut rng = self.rng_for(cycle_number);
        let [wins_sum, losses_sum, draws_sum] = allocate_buckets(total_units, config);
        tracing::debug!(
            "cycle {cycle_number}: {total_units} gems split {wins_sum}/{losses_sum}/{draws_sum}"
        );

        let mut bets = Vec::with_capacity(config.cycle_games as usize);
        for (intended_outcome, count, bucket_sum) in [
            (Outcome::Win, config.wins_count, wins_sum),
            (Outcome::Loss, config.losses_count, losses_sum),
            (Outcome::Draw, config.draws_count, draws_sum),
        ] {
            for amount in fill_bucket(&mut rng, count, bucket_sum, min, max)? {
                bets.push(PlannedBet {
                    amount: Decimal::from(amount),
                    intended_outcome,
                });
            }
        }

        // interleave outcomes instead of playing each bucket back to back
        bets.shuffle(&mut rng);

        Ok(bets)
    }

    fn rng_for(&self, cycle_number: i64) -> ChaCha8Rng {
        let stream = (cycle_number as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        ChaCha8Rng::seed_from_u64(self.seed ^ stream)
    }
}

/// Splits the total stake across the win/loss/draw buckets.
///
/// Each bucket gets `total * pct / 100` rounded half-up; any residual left by
/// rounding is absorbed by the largest bucket so the triple sums to `total`
/// exactly.
fn allocate_buckets(total: i64, config: &BotCycleConfig) -> [i64; 3] {
    let total_f = total as f64;
    let mut sums = [
        half_up(total_f * config.wins_pct / 100.0),
        half_up(total_f * config.losses_pct / 100.0),
        half_up(total_f * config.draws_pct / 100.0),
    ];

    let residual = total - sums.iter().sum::<i64>();
    if residual != 0 {
        let largest = (0..sums.len()).max_by_key(|&i| sums[i]).unwrap_or(0);
        sums[largest] += residual;
    }

    sums
}

/// Generates `count` amounts in `[min, max]` summing to `target` exactly.
///
/// Amounts are drawn across the low/mid/high thirds of the range for variety,
/// then the residual is absorbed starting from the last amount and walking
/// backwards, never leaving the range.
fn fill_bucket(
    rng: &mut ChaCha8Rng,
    count: u32,
    target: i64,
    min: i64,
    max: i64,
) -> Result<Vec<i64>> {
    if count == 0 {
        if target != 0 {
            return Err(CycleError::configuration(format!(
                "bucket allocated {target} gems but has no games"
            )));
        }
        return Ok(Vec::new());
    }

    let count_i = i64::from(count);
    if target < count_i * min || target > count_i * max {
        return Err(CycleError::configuration(format!(
            "bucket target {target} not realizable as {count} bets in [{min}, {max}]"
        )));
    }

    let span = max - min + 1;
    let third = (span / 3).max(1);
    let mut amounts: Vec<i64> = (0..count)
        .map(|i| {
            let lo = (min + i64::from(i % 3) * third).min(max);
            let hi = (lo + third - 1).min(max);
            rng.gen_range(lo..=hi)
        })
        .collect();

    let mut residual = target - amounts.iter().sum::<i64>();
    for amount in amounts.iter_mut().rev() {
        if residual == 0 {
            break;
        }
        let delta = if residual > 0 {
            residual.min(max - *amount)
        } else {
            residual.max(min - *amount)
        };
        *amount += delta;
        residual -= delta;
    }
    debug_assert_eq!(residual, 0, "bucket residual must be fully absorbed");

    Ok(amounts)
}
