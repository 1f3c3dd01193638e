//! Outcome resolution for bot-controlled games.

use async_trait::async_trait;
use gem_arena_core::error::Result;
use gem_arena_core::{GameResolver, Outcome, PlannedBet};

/// Resolver for bot-controlled games: the outcome is predetermined by the
/// plan, so each bet resolves to its intended outcome.
///
/// Live player-vs-player games go through the game service's own resolution
/// path and never reach this resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedResolver;

impl ScriptedResolver {
    /// Creates a new scripted resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GameResolver for ScriptedResolver {
    async fn resolve(&self, _bot_id: &str, bet: &PlannedBet) -> Result<Outcome> {
        Ok(bet.intended_outcome)
    }
}
