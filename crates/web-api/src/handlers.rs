use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use gem_arena_bot_orchestrator::{BotConfig, BotRegistry, BotStatus};
use gem_arena_core::BotCycleConfig;
use gem_arena_data::{
    CycleCountMismatch, CycleReporter, CycleRepository, HistoryOrder, PaginatedCycles,
    RevenueSummary,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BotRegistry>,
    pub reporter: CycleReporter,
    pub cycles: CycleRepository,
    /// Default pause between games for bots created without an explicit one.
    pub default_game_interval_secs: u64,
}

#[derive(Serialize)]
pub struct BotListResponse {
    pub bots: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateBotRequest {
    pub bot_id: String,
    pub min_bet: Decimal,
    pub max_bet: Decimal,
    pub cycle_games: u32,
    pub wins_count: u32,
    pub losses_count: u32,
    pub draws_count: u32,
    pub wins_pct: f64,
    pub losses_pct: f64,
    pub draws_pct: f64,
    pub game_interval_secs: Option<u64>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct RevenueParams {
    pub since: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

/// Lists all registered bots.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the registry cannot be
/// accessed.
pub async fn list_bots(State(state): State<AppState>) -> Result<Json<BotListResponse>, StatusCode> {
    let bots = state.registry.list_bots().await;
    Ok(Json(BotListResponse { bots }))
}

/// Creates a new bot with the specified cycle configuration.
///
/// # Errors
/// Returns `StatusCode::BAD_REQUEST` for an invalid cycle configuration, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if bot creation fails.
pub async fn create_bot(
    State(state): State<AppState>,
    Json(req): Json<CreateBotRequest>,
) -> Result<StatusCode, StatusCode> {
    let cycle = BotCycleConfig::new(
        req.min_bet,
        req.max_bet,
        req.cycle_games,
        req.wins_count,
        req.losses_count,
        req.draws_count,
        req.wins_pct,
        req.losses_pct,
        req.draws_pct,
    )
    .map_err(|e| {
        tracing::warn!("Rejected bot {}: {}", req.bot_id, e);
        StatusCode::BAD_REQUEST
    })?;

    let config = BotConfig {
        bot_id: req.bot_id,
        enabled: true,
        cycle,
        game_interval_secs: req
            .game_interval_secs
            .unwrap_or(state.default_game_interval_secs),
        planner_seed: None,
    };

    state
        .registry
        .spawn_bot(config)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::CREATED)
}

/// Gets the status of a specific bot.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the bot doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if status retrieval fails.
pub async fn get_bot_status(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<Json<BotStatus>, StatusCode> {
    let handle = state
        .registry
        .get_bot(&bot_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let status = handle
        .get_status()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(status))
}

/// Starts a bot's cycle automation.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the bot doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the start command fails.
pub async fn start_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let handle = state
        .registry
        .get_bot(&bot_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    handle
        .start()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::OK)
}

/// Stops a bot.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the bot doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the stop command fails.
pub async fn stop_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let handle = state
        .registry
        .get_bot(&bot_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    handle
        .stop()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::OK)
}

/// Pauses a bot.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the bot doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the pause command fails.
pub async fn pause_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let handle = state
        .registry
        .get_bot(&bot_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    handle
        .pause()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::OK)
}

/// Resumes a paused bot.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if the bot doesn't exist, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the resume command fails.
pub async fn resume_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let handle = state
        .registry
        .get_bot(&bot_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    handle
        .resume()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::OK)
}

/// Deletes a bot, its cycle history, and its run state.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if bot deletion fails.
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state
        .registry
        .remove_bot(&bot_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns one page of a bot's finalized cycles.
///
/// Unusable `page`/`limit` values fall back to defaults instead of erroring.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the query fails.
pub async fn get_cycle_history(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<PaginatedCycles>, StatusCode> {
    let order = params
        .order
        .as_deref()
        .and_then(HistoryOrder::parse)
        .unwrap_or_default();

    let page = state
        .reporter
        .cycles_history(&bot_id, params.page, params.limit, order)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(page))
}

/// Returns the aggregate revenue summary.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the query fails.
pub async fn get_revenue_summary(
    State(state): State<AppState>,
    Query(params): Query<RevenueParams>,
) -> Result<Json<RevenueSummary>, StatusCode> {
    let summary = state
        .reporter
        .revenue_summary(params.since)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(summary))
}

/// Admin purge of a bot's finalized cycles.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the purge fails.
pub async fn purge_cycles(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<Json<PurgeResponse>, StatusCode> {
    let deleted = state
        .cycles
        .purge_bot(&bot_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(PurgeResponse { deleted }))
}

/// Admin view of bots whose cycle counter disagrees with their row count.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the query fails.
pub async fn reconcile_counts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CycleCountMismatch>>, StatusCode> {
    let mismatches = state
        .cycles
        .count_mismatches()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(mismatches))
}
