//! Error types for the cycle engine.
//!
//! Provides typed errors for configuration validation, duplicate finalization,
//! bet resolution, and persistence failures.

use thiserror::Error;

/// Errors that can occur while planning, executing, or finalizing a cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Invalid bot cycle configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A completed cycle already exists for this `(bot_id, cycle_number)` pair.
    #[error("duplicate cycle: bot {bot_id} cycle {cycle_number} is already finalized")]
    DuplicateCycle {
        /// Bot that owns the cycle.
        bot_id: String,
        /// Cycle number that was finalized twice.
        cycle_number: i64,
    },

    /// The game resolver could not determine an outcome for a bet.
    #[error("resolution failure: {0}")]
    Resolution(String),

    /// The durable store is unavailable or rejected an operation.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl CycleError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a duplicate cycle error.
    pub fn duplicate_cycle(bot_id: impl Into<String>, cycle_number: i64) -> Self {
        Self::DuplicateCycle {
            bot_id: bot_id.into(),
            cycle_number,
        }
    }

    /// Creates a resolution failure.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Creates a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Returns true for a duplicate finalization attempt.
    ///
    /// Duplicates are recovered locally: the cycle is already recorded, so the
    /// caller treats the attempt as a no-op rather than a failure.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateCycle { .. })
    }

    /// Returns true if the operation should be retried on a later pass.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::Persistence(_))
    }
}

/// Result type alias for cycle engine operations.
pub type Result<T> = std::result::Result<T, CycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = CycleError::configuration("percentages sum to 99");
        assert!(err.to_string().contains("configuration"));
        assert!(err.to_string().contains("percentages sum to 99"));
    }

    #[test]
    fn duplicate_cycle_error_display() {
        let err = CycleError::duplicate_cycle("bot-7", 42);
        assert!(err.to_string().contains("bot-7"));
        assert!(err.to_string().contains("42"));
        assert!(err.is_duplicate());
    }

    #[test]
    fn duplicate_is_not_transient() {
        let err = CycleError::duplicate_cycle("bot-1", 1);
        assert!(!err.is_transient());
    }

    #[test]
    fn resolution_and_persistence_are_transient() {
        assert!(CycleError::resolution("resolver offline").is_transient());
        assert!(CycleError::persistence("connection reset").is_transient());
    }

    #[test]
    fn configuration_is_not_transient() {
        let err = CycleError::configuration("min_bet above max_bet");
        assert!(!err.is_transient());
        assert!(!err.is_duplicate());
    }
}
