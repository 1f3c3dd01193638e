use crate::bot_actor::BotActor;
use crate::bot_handle::BotHandle;
use crate::commands::BotConfig;
use crate::events::BotStatusSnapshot;
use anyhow::{Context, Result};
use gem_arena_data::BotRepository;
use gem_arena_core::{CycleStore, GameResolver};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

pub struct BotRegistry {
    bots: Arc<RwLock<HashMap<String, BotHandle>>>,
    db: Option<BotRepository>,
    store: Arc<dyn CycleStore>,
    resolver: Arc<dyn GameResolver>,
}

impl BotRegistry {
    /// Creates a bot registry without bot-config persistence. Cycle records
    /// still go through `store`.
    ///
    /// # Returns
    /// A new `BotRegistry` instance with an empty bot collection.
    #[must_use]
    pub fn new(store: Arc<dyn CycleStore>, resolver: Arc<dyn GameResolver>) -> Self {
        Self {
            bots: Arc::new(RwLock::new(HashMap::new())),
            db: None,
            store,
            resolver,
        }
    }

    /// Creates a bot registry that also persists bot configurations, so
    /// enabled bots can be restored after a restart.
    ///
    /// # Returns
    /// A new `BotRegistry` instance with persistence enabled.
    #[must_use]
    pub fn with_database(
        db: BotRepository,
        store: Arc<dyn CycleStore>,
        resolver: Arc<dyn GameResolver>,
    ) -> Self {
        Self {
            bots: Arc::new(RwLock::new(HashMap::new())),
            db: Some(db),
            store,
            resolver,
        }
    }

    /// Spawns a new bot with the given configuration.
    ///
    /// The configuration is validated before anything is persisted or
    /// spawned. If persistence is enabled, the config is saved to the
    /// database. The bot starts in the stopped state.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, persistence fails,
    /// or the bot cannot be spawned.
    pub async fn spawn_bot(&self, config: BotConfig) -> Result<BotHandle> {
        config
            .cycle
            .validate()
            .context("bot cycle configuration rejected")?;

        if let Some(ref db) = self.db {
            let config_json = serde_json::to_value(&config)?;
            db.upsert(&config.bot_id, &config_json, config.enabled)
                .await?;
            tracing::info!("Persisted bot {} configuration to database", config.bot_id);
        }

        let (tx, rx) = mpsc::channel(32);
        let (event_tx, _event_rx) = broadcast::channel(1000);
        let (status_tx, status_rx) = watch::channel(BotStatusSnapshot::initial(
            &config.bot_id,
            config.cycle.cycle_games,
        ));

        let handle = BotHandle::new(tx, event_tx.clone(), status_rx);

        let bot_id = config.bot_id.clone();
        let actor = BotActor::new(
            config,
            rx,
            event_tx,
            status_tx,
            Arc::clone(&self.store),
            Arc::clone(&self.resolver),
        );
        let bot_id_for_task = bot_id.clone();
        tokio::spawn(async move {
            if let Err(e) = actor.run().await {
                tracing::error!("Bot {} error: {}", bot_id_for_task, e);
            }
        });

        self.bots.write().await.insert(bot_id, handle.clone());

        Ok(handle)
    }

    /// Gets a handle to the bot with the given ID.
    ///
    /// # Returns
    /// `Some(BotHandle)` if the bot exists, `None` otherwise.
    #[must_use]
    pub async fn get_bot(&self, bot_id: &str) -> Option<BotHandle> {
        self.bots.read().await.get(bot_id).cloned()
    }

    /// Removes and shuts down the bot with the given ID.
    ///
    /// If persistence is enabled, the bot row is deleted; its cycle history
    /// and run state go with it.
    ///
    /// # Errors
    /// Returns an error if the bot shutdown or database deletion fails.
    pub async fn remove_bot(&self, bot_id: &str) -> Result<()> {
        let value = self.bots.write().await.remove(bot_id);
        if let Some(handle) = value {
            handle.shutdown().await?;
        }

        if let Some(ref db) = self.db {
            db.delete(bot_id).await?;
            tracing::info!("Deleted bot {} from database", bot_id);
        }

        Ok(())
    }

    /// Lists all bot IDs currently registered.
    ///
    /// # Returns
    /// A vector of bot IDs.
    #[must_use]
    pub async fn list_bots(&self) -> Vec<String> {
        self.bots.read().await.keys().cloned().collect()
    }

    /// Shuts down all bots in the registry.
    ///
    /// # Errors
    /// Returns an error if any bot shutdown fails.
    pub async fn shutdown_all(&self) -> Result<()> {
        let handles: Vec<_> = self.bots.read().await.values().cloned().collect();
        for handle in handles {
            handle.shutdown().await?;
        }
        Ok(())
    }

    /// Restores bots from the database and spawns them.
    ///
    /// Only restores bots marked `enabled = true`. Does NOT auto-start
    /// bots - they remain in the stopped state.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn restore_from_db(&self) -> Result<Vec<String>> {
        let Some(ref db) = self.db else {
            tracing::warn!("No database configured, skipping restore");
            return Ok(Vec::new());
        };

        let records = db.enabled().await?;
        let mut restored = Vec::new();

        for record in records {
            let bot_id = record.bot_id.clone();
            let config: BotConfig = match serde_json::from_value(record.config_json) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("Bot {} has an unreadable stored config: {}", bot_id, e);
                    continue;
                }
            };
            match self.spawn_bot(config).await {
                Ok(_) => {
                    tracing::info!("Restored bot {}", bot_id);
                    restored.push(bot_id);
                }
                Err(e) => {
                    tracing::error!("Failed to restore bot {}: {}", bot_id, e);
                }
            }
        }

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ScriptedResolver;
    use async_trait::async_trait;
    use gem_arena_core::error::Result as CoreResult;
    use gem_arena_core::{CompletedCycle, CycleRunState};

    struct NullStore;

    #[async_trait]
    impl CycleStore for NullStore {
        async fn insert_completed(&self, _cycle: &CompletedCycle) -> CoreResult<()> {
            Ok(())
        }

        async fn save_run_state(&self, _state: &CycleRunState) -> CoreResult<()> {
            Ok(())
        }

        async fn load_run_state(&self, _bot_id: &str) -> CoreResult<Option<CycleRunState>> {
            Ok(None)
        }

        async fn clear_run_state(&self, _bot_id: &str) -> CoreResult<()> {
            Ok(())
        }

        async fn completed_cycles_count(&self, _bot_id: &str) -> CoreResult<i64> {
            Ok(0)
        }
    }

    fn test_registry() -> BotRegistry {
        BotRegistry::new(Arc::new(NullStore), Arc::new(ScriptedResolver::new()))
    }

    #[test]
    fn registry_without_database_has_no_db() {
        let registry = test_registry();
        assert!(registry.db.is_none());
    }

    #[tokio::test]
    async fn registry_list_bots_empty_initially() {
        let registry = test_registry();
        let bots = registry.list_bots().await;
        assert!(bots.is_empty());
    }

    #[tokio::test]
    async fn restore_without_database_is_a_noop() {
        let registry = test_registry();
        let restored = registry.restore_from_db().await.expect("restore succeeds");
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn spawn_rejects_invalid_cycle_config() {
        use gem_arena_core::BotCycleConfig;
        use rust_decimal_macros::dec;

        let registry = test_registry();
        let config = crate::commands::BotConfig {
            bot_id: "broken".to_string(),
            enabled: true,
            cycle: BotCycleConfig {
                min_bet: dec!(10),
                max_bet: dec!(5),
                cycle_games: 4,
                wins_count: 2,
                losses_count: 1,
                draws_count: 1,
                wins_pct: 50.0,
                losses_pct: 30.0,
                draws_pct: 20.0,
            },
            game_interval_secs: 0,
            planner_seed: None,
        };

        let result = registry.spawn_bot(config).await;
        assert!(result.is_err());
        assert!(registry.list_bots().await.is_empty());
    }
}
