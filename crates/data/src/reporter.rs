//! Aggregate and historical views over finalized cycles.
//!
//! Everything reported here reconciles exactly with the `completed_cycles`
//! rows: history pages are plain row reads, totals are SQL aggregates that
//! must agree with a naive sum over the same rows, and in-progress cycles
//! never appear because they are never stored as rows in the first place.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::CompletedCycleRecord;
use crate::repositories::{CycleRepository, RevenueStats};

/// Default page when the caller's value is unusable.
pub const DEFAULT_PAGE: i64 = 1;
/// Default page size when the caller's value is unusable.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound on the page size; larger requests fall back to the default.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Ordering for the cycle history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HistoryOrder {
    /// Cycle number ascending: the bot's ledger in playing order.
    #[default]
    CycleAsc,
    /// Most recently completed first: the dashboard view.
    CompletedDesc,
}

impl HistoryOrder {
    /// Parses from a query-string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cycle" | "cycle_asc" => Some(Self::CycleAsc),
            "recent" | "completed_desc" => Some(Self::CompletedDesc),
            _ => None,
        }
    }
}

/// Pagination envelope returned with every history page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub items_per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Builds a consistent envelope for a clamped `(page, limit)` pair.
    #[must_use]
    pub fn new(total_count: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };

        Self {
            total_count,
            current_page: page,
            total_pages,
            items_per_page: limit,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Clamps caller-supplied paging values to usable ones.
///
/// Values that are missing, non-positive, or (for `limit`) above
/// [`MAX_PAGE_SIZE`] fall back to the defaults rather than erroring.
#[must_use]
pub fn clamp_page_limit(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = match page {
        Some(p) if p > 0 => p,
        _ => DEFAULT_PAGE,
    };
    let limit = match limit {
        Some(l) if l > 0 && l <= MAX_PAGE_SIZE => l,
        _ => DEFAULT_PAGE_SIZE,
    };
    (page, limit)
}

/// One page of a bot's cycle history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedCycles {
    pub items: Vec<CompletedCycleRecord>,
    pub pagination: Pagination,
}

/// Aggregate revenue view over finalized cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_cycles: i64,
    pub profitable_cycles: i64,
    /// `profitable_cycles / total_cycles * 100`, 0 with no cycles.
    pub profitability_rate: f64,
    pub total_bet_amount: Decimal,
    pub total_winnings: Decimal,
    pub total_losses: Decimal,
    pub net_profit: Decimal,
}

impl RevenueSummary {
    /// Derives the summary from raw aggregate figures.
    #[must_use]
    pub fn from_stats(stats: &RevenueStats) -> Self {
        let profitability_rate = if stats.total_cycles > 0 {
            stats.profitable_cycles as f64 / stats.total_cycles as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_cycles: stats.total_cycles,
            profitable_cycles: stats.profitable_cycles,
            profitability_rate,
            total_bet_amount: stats.total_bet_amount,
            total_winnings: stats.total_winnings,
            total_losses: stats.total_losses,
            net_profit: stats.net_profit,
        }
    }

    /// Formats a summary for logging.
    #[must_use]
    pub fn format_summary(&self) -> String {
        format!(
            "Revenue Summary:\n\
             - Cycles: {} (profitable: {}, rate: {:.1}%)\n\
             - Total staked: {}\n\
             - Winnings: {} | Losses: {}\n\
             - Net profit: {}",
            self.total_cycles,
            self.profitable_cycles,
            self.profitability_rate,
            self.total_bet_amount,
            self.total_winnings,
            self.total_losses,
            self.net_profit,
        )
    }
}

/// Result of computing a bot's total profit two independent ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitReconciliation {
    /// SQL aggregate over the rows.
    pub aggregated: Decimal,
    /// Naive sum over the fetched rows.
    pub summed: Decimal,
}

impl ProfitReconciliation {
    /// True when the two figures agree exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.aggregated == self.summed
    }
}

/// Read-side facade over finalized cycles.
#[derive(Debug, Clone)]
pub struct CycleReporter {
    cycles: CycleRepository,
}

impl CycleReporter {
    /// Creates a reporter over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            cycles: CycleRepository::new(pool),
        }
    }

    /// Returns one page of a bot's cycle history.
    ///
    /// Unusable `page`/`limit` values are clamped to defaults.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn cycles_history(
        &self,
        bot_id: &str,
        page: Option<i64>,
        limit: Option<i64>,
        order: HistoryOrder,
    ) -> Result<PaginatedCycles> {
        let (page, limit) = clamp_page_limit(page, limit);
        let total_count = self.cycles.count_for_bot(bot_id).await?;
        let offset = (page - 1) * limit;

        let items = match order {
            HistoryOrder::CycleAsc => self.cycles.fetch_page(bot_id, offset, limit).await?,
            HistoryOrder::CompletedDesc => {
                self.cycles.fetch_recent_page(bot_id, offset, limit).await?
            }
        };

        Ok(PaginatedCycles {
            items,
            pagination: Pagination::new(total_count, page, limit),
        })
    }

    /// Total net profit for one bot, or across all bots when `bot_id` is
    /// `None`.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn total_profit(&self, bot_id: Option<&str>) -> Result<Decimal> {
        self.cycles.total_profit(bot_id).await
    }

    /// Computes a bot's total profit both by SQL aggregation and by summing
    /// the fetched rows. The two must agree exactly.
    ///
    /// # Errors
    /// Returns an error if a database query fails.
    pub async fn reconcile_profit(&self, bot_id: &str) -> Result<ProfitReconciliation> {
        let aggregated = self.cycles.total_profit(Some(bot_id)).await?;
        let summed = self
            .cycles
            .fetch_all_for_bot(bot_id)
            .await?
            .iter()
            .map(|c| c.net_profit)
            .sum();

        Ok(ProfitReconciliation { aggregated, summed })
    }

    /// Aggregate revenue view, optionally restricted to cycles completed at
    /// or after `since`.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn revenue_summary(&self, since: Option<DateTime<Utc>>) -> Result<RevenueSummary> {
        let stats = self.cycles.revenue_stats(since).await?;
        Ok(RevenueSummary::from_stats(&stats))
    }

    /// Average ROI across a bot's cycles, weighted by active pool.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn average_roi(&self, bot_id: &str) -> Result<f64> {
        let rows = self.cycles.fetch_all_for_bot(bot_id).await?;
        let pool: Decimal = rows.iter().map(|c| c.active_pool).sum();
        if pool <= Decimal::ZERO {
            return Ok(0.0);
        }
        let profit: Decimal = rows.iter().map(|c| c.net_profit).sum();
        Ok((profit / pool * Decimal::from(100)).to_f64().unwrap_or(0.0))
    }
}
