use std::sync::Arc;

use anyhow::{Context, Result};
use gem_arena_bot_orchestrator::{BotRegistry, ScriptedResolver};
use gem_arena_core::ConfigLoader;
use gem_arena_data::{
    connect_pool, BotRepository, CycleReporter, CycleRepository, PgCycleStore,
};
use gem_arena_web_api::{ApiServer, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::load().context("failed to load configuration")?;

    let pool = connect_pool(&config.database.url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;

    let store = Arc::new(PgCycleStore::new(pool.clone()));
    let resolver = Arc::new(ScriptedResolver::new());
    let registry = Arc::new(BotRegistry::with_database(
        BotRepository::new(pool.clone()),
        store,
        resolver,
    ));

    let restored = registry
        .restore_from_db()
        .await
        .context("failed to restore bots")?;
    tracing::info!("Restored {} bots from database", restored.len());

    let state = AppState {
        registry,
        reporter: CycleReporter::new(pool.clone()),
        cycles: CycleRepository::new(pool),
        default_game_interval_secs: config.automation.game_interval_secs,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    ApiServer::new(state).serve(&addr).await
}
