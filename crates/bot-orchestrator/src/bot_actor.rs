use crate::commands::{BotCommand, BotConfig, BotState, BotStatus};
use crate::events::{BotEvent, BotStatusSnapshot};
use anyhow::{Context, Result};
use chrono::Utc;
use gem_arena_core::{
    CompletedCycle, CyclePlanner, CycleRunState, CycleStore, GameResolver, PlannedBet,
};
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// The cycle a bot is currently playing: its deterministic plan plus the
/// counters accumulated so far. Exists only in memory and as a run-state
/// snapshot; never as a terminal record.
struct ActiveCycle {
    run_state: CycleRunState,
    plan: Vec<PlannedBet>,
}

/// Why the cycle loop returned control to the command loop.
enum CycleLoopExit {
    Stopped,
    Paused,
    Shutdown,
}

pub struct BotActor {
    config: BotConfig,
    state: BotState,
    rx: mpsc::Receiver<BotCommand>,

    // Event streaming
    event_tx: broadcast::Sender<BotEvent>,
    status_tx: watch::Sender<BotStatusSnapshot>,
    recent_events: VecDeque<BotEvent>,

    // Collaborators
    store: Arc<dyn CycleStore>,
    resolver: Arc<dyn GameResolver>,
    planner: CyclePlanner,

    current: Option<ActiveCycle>,
    completed_cycles: i64,
    started_at: Option<chrono::DateTime<Utc>>,
}

/// Derives a stable planner seed from the bot id.
fn seed_for(bot_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    bot_id.hash(&mut hasher);
    hasher.finish()
}

impl BotActor {
    /// Creates a new bot actor with the given configuration and command
    /// receiver.
    ///
    /// # Returns
    /// A new `BotActor` instance in the stopped state.
    #[must_use]
    pub fn new(
        config: BotConfig,
        rx: mpsc::Receiver<BotCommand>,
        event_tx: broadcast::Sender<BotEvent>,
        status_tx: watch::Sender<BotStatusSnapshot>,
        store: Arc<dyn CycleStore>,
        resolver: Arc<dyn GameResolver>,
    ) -> Self {
        let seed = config.planner_seed.unwrap_or_else(|| seed_for(&config.bot_id));
        Self {
            config,
            state: BotState::Stopped,
            rx,
            event_tx,
            status_tx,
            recent_events: VecDeque::with_capacity(10),
            store,
            resolver,
            planner: CyclePlanner::new(seed),
            current: None,
            completed_cycles: 0,
            started_at: None,
        }
    }

    /// Loads the finalized cycle count and any persisted run state so the
    /// bot resumes its in-flight cycle instead of replanning.
    async fn prepare(&mut self) -> Result<()> {
        self.completed_cycles = self
            .store
            .completed_cycles_count(&self.config.bot_id)
            .await
            .context("failed to load completed cycle count")?;

        if self.current.is_none() {
            if let Some(run_state) = self
                .store
                .load_run_state(&self.config.bot_id)
                .await
                .context("failed to load run state")?
            {
                tracing::info!(
                    "Bot {} resuming cycle {} at game {} of {}",
                    self.config.bot_id,
                    run_state.cycle_number,
                    run_state.resolved_count,
                    self.config.cycle.cycle_games
                );
                // plans are reproducible, so the resumed cycle replays the
                // exact bet sequence it started with
                let plan = self
                    .planner
                    .plan_cycle(&self.config.cycle, run_state.cycle_number)
                    .context("failed to replan resumed cycle")?;
                self.current = Some(ActiveCycle { run_state, plan });
            }
        }

        Ok(())
    }

    /// Starts the next cycle: plan the bets and open a fresh run state.
    async fn begin_cycle(&mut self) -> Result<()> {
        let cycle_number = self.completed_cycles + 1;
        let plan = self
            .planner
            .plan_cycle(&self.config.cycle, cycle_number)
            .context("cycle planning failed")?;

        let total: Decimal = plan.iter().map(|b| b.amount).sum();
        tracing::info!(
            "Bot {} planned cycle {}: {} games, {} gems total stake",
            self.config.bot_id,
            cycle_number,
            plan.len(),
            total
        );

        let run_state = CycleRunState::new(&self.config.bot_id, cycle_number);
        if let Err(e) = self.store.save_run_state(&run_state).await {
            tracing::warn!(
                "Bot {} failed to snapshot fresh run state: {e}",
                self.config.bot_id
            );
        }

        self.current = Some(ActiveCycle { run_state, plan });
        Ok(())
    }

    /// Advances the in-flight cycle by one unit of work: resolve the next
    /// planned bet, or finalize when every game has resolved.
    ///
    /// Returns true when the cycle finalized on this step.
    async fn step(&mut self) -> Result<bool> {
        let Some(active) = &self.current else {
            return Ok(false);
        };

        if active.run_state.is_complete(self.config.cycle.cycle_games) {
            return self.finalize_current().await;
        }

        let idx = active.run_state.resolved_count as usize;
        let cycle_number = active.run_state.cycle_number;
        let Some(bet) = active.plan.get(idx).cloned() else {
            anyhow::bail!(
                "bot {} run state is ahead of its {}-game plan",
                self.config.bot_id,
                active.plan.len()
            );
        };

        let outcome = match self.resolver.resolve(&self.config.bot_id, &bet).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // the cycle stays in its partial state; this bet is retried
                // on the next pass and never given a fabricated outcome
                tracing::warn!(
                    "Bot {} could not resolve game {} of cycle {}: {e}",
                    self.config.bot_id,
                    idx + 1,
                    cycle_number
                );
                return Ok(false);
            }
        };

        let snapshot = if let Some(active) = self.current.as_mut() {
            active.run_state.record(outcome, bet.amount);
            active.run_state.clone()
        } else {
            return Ok(false);
        };

        // snapshot failures degrade restart recovery, not correctness; the
        // in-memory state stays authoritative
        if let Err(e) = self.store.save_run_state(&snapshot).await {
            tracing::warn!(
                "Bot {} failed to snapshot run state: {e}",
                self.config.bot_id
            );
        }

        tracing::debug!(
            "Bot {} cycle {} game {}/{}: {} for {} gems (pnl {})",
            self.config.bot_id,
            cycle_number,
            snapshot.resolved_count,
            self.config.cycle.cycle_games,
            outcome.as_str(),
            bet.amount,
            snapshot.running_pnl
        );
        self.add_event(BotEvent::GameResolved {
            bot_id: self.config.bot_id.clone(),
            cycle_number,
            game_index: snapshot.resolved_count,
            outcome,
            amount: bet.amount,
            running_pnl: snapshot.running_pnl,
            timestamp: Utc::now(),
        });

        Ok(false)
    }

    /// Finalizes the completed cycle: persist exactly one record, clear the
    /// run state, and advance to the next cycle number.
    async fn finalize_current(&mut self) -> Result<bool> {
        let Some(active) = &self.current else {
            return Ok(false);
        };
        let totals = active.run_state.totals();
        let cycle_number = active.run_state.cycle_number;
        let completed =
            CompletedCycle::from_totals(&self.config.bot_id, cycle_number, &totals, Utc::now());

        let mut resync_count = false;
        match self.store.insert_completed(&completed).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                // restart replay: the record already exists and is the source
                // of truth, so the insert is a no-op rather than a failure
                tracing::warn!(
                    "Bot {} cycle {} already finalized, skipping insert",
                    self.config.bot_id,
                    cycle_number
                );
                resync_count = true;
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    "Bot {} cycle {} finalization deferred: {e}",
                    self.config.bot_id,
                    cycle_number
                );
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.store.clear_run_state(&self.config.bot_id).await {
            tracing::warn!(
                "Bot {} failed to clear run state after finalize: {e}",
                self.config.bot_id
            );
        }

        if resync_count {
            self.completed_cycles = self
                .store
                .completed_cycles_count(&self.config.bot_id)
                .await
                .context("failed to resync completed cycle count")?;
        } else {
            self.completed_cycles += 1;
        }
        self.current = None;

        tracing::info!(
            "Bot {} completed cycle {}: {} games, net profit {}, roi {:.2}%",
            self.config.bot_id,
            cycle_number,
            totals.total_games,
            totals.net_profit,
            totals.roi_active
        );
        self.add_event(BotEvent::CycleCompleted {
            bot_id: self.config.bot_id.clone(),
            cycle_number,
            total_games: totals.total_games,
            net_profit: totals.net_profit,
            roi_active: totals.roi_active,
            timestamp: Utc::now(),
        });

        Ok(true)
    }

    /// Runs cycles until told otherwise: each pass resolves one game or
    /// finalizes the completed cycle, then checks for commands.
    async fn cycle_loop(&mut self) -> Result<CycleLoopExit> {
        loop {
            if self.current.is_none() {
                self.begin_cycle().await?;
            }

            self.step().await?;
            self.publish_status();

            tokio::time::sleep(Duration::from_secs(self.config.game_interval_secs)).await;

            // Check for control commands (non-blocking)
            if let Ok(cmd) = self.rx.try_recv() {
                match cmd {
                    BotCommand::Stop => {
                        self.set_state(BotState::Stopped);
                        return Ok(CycleLoopExit::Stopped);
                    }
                    BotCommand::Pause => {
                        self.set_state(BotState::Paused);
                        return Ok(CycleLoopExit::Paused);
                    }
                    BotCommand::Shutdown => return Ok(CycleLoopExit::Shutdown),
                    BotCommand::GetStatus(tx) => {
                        let _ = tx.send(self.status());
                    }
                    BotCommand::UpdateConfig(new_config) => self.apply_config(*new_config),
                    cmd => {
                        tracing::warn!(
                            "Bot {} ignoring command while running: {cmd:?}",
                            self.config.bot_id
                        );
                    }
                }
            }
        }
    }

    fn apply_config(&mut self, new_config: BotConfig) {
        if let Err(e) = new_config.cycle.validate() {
            tracing::warn!(
                "Bot {} rejected config update: {e}",
                self.config.bot_id
            );
            return;
        }
        if self.current.is_some() {
            tracing::info!(
                "Bot {} config updated; the in-flight cycle keeps its plan",
                self.config.bot_id
            );
        } else {
            tracing::info!("Bot {} config updated", self.config.bot_id);
        }
        let seed = new_config
            .planner_seed
            .unwrap_or_else(|| seed_for(&new_config.bot_id));
        self.planner = CyclePlanner::new(seed);
        self.config = new_config;
    }

    fn status(&self) -> BotStatus {
        BotStatus {
            bot_id: self.config.bot_id.clone(),
            state: self.state.clone(),
            cycle_number: self.current.as_ref().map(|c| c.run_state.cycle_number),
            resolved_count: self
                .current
                .as_ref()
                .map_or(0, |c| c.run_state.resolved_count),
            completed_cycles: self.completed_cycles,
            last_heartbeat: Utc::now(),
            error: self.last_error(),
        }
    }

    fn last_error(&self) -> Option<String> {
        if !matches!(self.state, BotState::Error) {
            return None;
        }
        self.recent_events.iter().rev().find_map(|e| {
            if let BotEvent::Error { message, .. } = e {
                Some(message.clone())
            } else {
                None
            }
        })
    }

    fn set_state(&mut self, state: BotState) {
        if self.state != state {
            tracing::info!(
                "Bot {} state: {:?} -> {:?}",
                self.config.bot_id,
                self.state,
                state
            );
            self.state = state.clone();
            self.add_event(BotEvent::StateChanged {
                bot_id: self.config.bot_id.clone(),
                state,
                timestamp: Utc::now(),
            });
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        let snapshot = BotStatusSnapshot {
            bot_id: self.config.bot_id.clone(),
            state: self.state.clone(),
            cycle_number: self.current.as_ref().map(|c| c.run_state.cycle_number),
            resolved_count: self
                .current
                .as_ref()
                .map_or(0, |c| c.run_state.resolved_count),
            cycle_games: self.config.cycle.cycle_games,
            running_pnl: self
                .current
                .as_ref()
                .map_or(Decimal::ZERO, |c| c.run_state.running_pnl),
            completed_cycles: self.completed_cycles,
            last_heartbeat: Utc::now(),
            started_at: self.started_at,
            recent_events: self.recent_events.iter().cloned().collect(),
            error: self.last_error(),
        };

        // Broadcast updated status (ignore if no receivers)
        let _ = self.status_tx.send(snapshot);
    }

    fn emit_error(&mut self, message: String) {
        self.add_event(BotEvent::Error {
            bot_id: self.config.bot_id.clone(),
            message,
            timestamp: Utc::now(),
        });
    }

    /// Adds an event to recent events and broadcasts it.
    fn add_event(&mut self, event: BotEvent) {
        if self.recent_events.len() >= 10 {
            self.recent_events.pop_front();
        }
        self.recent_events.push_back(event.clone());

        // Broadcast to subscribers (ignore if no receivers)
        let _ = self.event_tx.send(event);
    }

    /// Runs the bot actor's main event loop, processing commands from the
    /// channel.
    ///
    /// # Errors
    /// Returns an error if command processing fails.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!("Bot {} starting", self.config.bot_id);

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                BotCommand::Start => {
                    if matches!(self.state, BotState::Running | BotState::Paused) {
                        tracing::warn!(
                            "Bot {} in invalid state for start (state: {:?}), ignoring command",
                            self.config.bot_id,
                            self.state
                        );
                        continue;
                    }

                    if let Err(e) = self.prepare().await {
                        tracing::error!("Failed to prepare bot {}: {}", self.config.bot_id, e);
                        self.emit_error(format!("Preparation failed: {e}"));
                        self.set_state(BotState::Error);
                        continue;
                    }

                    self.started_at = Some(Utc::now());
                    self.set_state(BotState::Running);

                    match self.cycle_loop().await {
                        Ok(CycleLoopExit::Shutdown) => break,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(
                                "Bot {} cycle loop error: {}",
                                self.config.bot_id,
                                e
                            );
                            self.emit_error(format!("Cycle loop error: {e}"));
                            self.set_state(BotState::Error);
                        }
                    }
                }
                BotCommand::Stop => {
                    if matches!(self.state, BotState::Stopped | BotState::Error) {
                        tracing::warn!(
                            "Bot {} already stopped, ignoring stop command",
                            self.config.bot_id
                        );
                        continue;
                    }
                    self.set_state(BotState::Stopped);
                }
                BotCommand::Pause => {
                    if !matches!(self.state, BotState::Running) {
                        tracing::warn!(
                            "Bot {} not running (state: {:?}), cannot pause",
                            self.config.bot_id,
                            self.state
                        );
                        continue;
                    }
                    self.set_state(BotState::Paused);
                }
                BotCommand::Resume => {
                    if !matches!(self.state, BotState::Paused) {
                        tracing::warn!(
                            "Bot {} not paused (state: {:?}), cannot resume",
                            self.config.bot_id,
                            self.state
                        );
                        continue;
                    }
                    self.set_state(BotState::Running);

                    match self.cycle_loop().await {
                        Ok(CycleLoopExit::Shutdown) => break,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(
                                "Bot {} cycle loop error after resume: {}",
                                self.config.bot_id,
                                e
                            );
                            self.emit_error(format!("Cycle loop error: {e}"));
                            self.set_state(BotState::Error);
                        }
                    }
                }
                BotCommand::UpdateConfig(new_config) => self.apply_config(*new_config),
                BotCommand::GetStatus(tx) => {
                    let _ = tx.send(self.status());
                }
                BotCommand::Shutdown => {
                    tracing::info!("Bot {} shutting down", self.config.bot_id);
                    break;
                }
            }
        }

        tracing::info!("Bot {} stopped", self.config.bot_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ScriptedResolver;
    use async_trait::async_trait;
    use gem_arena_core::error::Result as CoreResult;
    use gem_arena_core::{BotCycleConfig, CycleError, Outcome};
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    // =========================================================================
    // Test Doubles
    // =========================================================================

    #[derive(Default)]
    struct MemoryStoreInner {
        completed: BTreeMap<(String, i64), CompletedCycle>,
        run_states: HashMap<String, CycleRunState>,
        insert_attempts: u32,
    }

    #[derive(Default)]
    struct MemoryCycleStore {
        inner: Mutex<MemoryStoreInner>,
    }

    impl MemoryCycleStore {
        fn completed(&self) -> Vec<CompletedCycle> {
            self.inner.lock().unwrap().completed.values().cloned().collect()
        }

        fn insert_attempts(&self) -> u32 {
            self.inner.lock().unwrap().insert_attempts
        }

        fn has_run_state(&self, bot_id: &str) -> bool {
            self.inner.lock().unwrap().run_states.contains_key(bot_id)
        }
    }

    #[async_trait]
    impl CycleStore for MemoryCycleStore {
        async fn insert_completed(&self, cycle: &CompletedCycle) -> CoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.insert_attempts += 1;
            let key = (cycle.bot_id.clone(), cycle.cycle_number);
            if inner.completed.contains_key(&key) {
                return Err(CycleError::duplicate_cycle(&cycle.bot_id, cycle.cycle_number));
            }
            inner.completed.insert(key, cycle.clone());
            Ok(())
        }

        async fn save_run_state(&self, state: &CycleRunState) -> CoreResult<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.run_states.insert(state.bot_id.clone(), state.clone());
            Ok(())
        }

        async fn load_run_state(&self, bot_id: &str) -> CoreResult<Option<CycleRunState>> {
            Ok(self.inner.lock().unwrap().run_states.get(bot_id).cloned())
        }

        async fn clear_run_state(&self, bot_id: &str) -> CoreResult<()> {
            self.inner.lock().unwrap().run_states.remove(bot_id);
            Ok(())
        }

        async fn completed_cycles_count(&self, bot_id: &str) -> CoreResult<i64> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .completed
                .keys()
                .filter(|(id, _)| id == bot_id)
                .count() as i64)
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl GameResolver for FailingResolver {
        async fn resolve(&self, _bot_id: &str, _bet: &PlannedBet) -> CoreResult<Outcome> {
            Err(CycleError::resolution("game service unavailable"))
        }
    }

    fn test_config() -> BotConfig {
        BotConfig {
            bot_id: "test_bot".to_string(),
            enabled: true,
            cycle: BotCycleConfig::new(dec!(1), dec!(100), 16, 7, 6, 3, 44.0, 36.0, 20.0)
                .expect("test config is valid"),
            game_interval_secs: 0,
            planner_seed: Some(12345),
        }
    }

    fn test_actor(
        store: Arc<MemoryCycleStore>,
        resolver: Arc<dyn GameResolver>,
    ) -> (BotActor, mpsc::Sender<BotCommand>) {
        let config = test_config();
        let (tx, rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(100);
        let (status_tx, _) = watch::channel(BotStatusSnapshot::initial(
            &config.bot_id,
            config.cycle.cycle_games,
        ));
        let actor = BotActor::new(config, rx, event_tx, status_tx, store, resolver);
        (actor, tx)
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn new_actor_is_stopped_with_no_cycle() {
        let store = Arc::new(MemoryCycleStore::default());
        let (actor, _tx) = test_actor(store, Arc::new(ScriptedResolver));

        assert_eq!(actor.state, BotState::Stopped);
        assert!(actor.current.is_none());
        assert_eq!(actor.completed_cycles, 0);
    }

    #[test]
    fn seed_is_stable_per_bot_id() {
        assert_eq!(seed_for("bot-1"), seed_for("bot-1"));
        assert_ne!(seed_for("bot-1"), seed_for("bot-2"));
    }

    // =========================================================================
    // Cycle Execution Tests
    // =========================================================================

    #[tokio::test]
    async fn full_cycle_finalizes_exactly_once() {
        let store = Arc::new(MemoryCycleStore::default());
        let (mut actor, _tx) = test_actor(store.clone(), Arc::new(ScriptedResolver));

        actor.prepare().await.expect("prepare succeeds");
        actor.begin_cycle().await.expect("planning succeeds");

        for _ in 0..16 {
            // nothing may be persisted as a completed record mid-cycle
            assert_eq!(store.insert_attempts(), 0);
            let finished = actor.step().await.expect("step succeeds");
            assert!(!finished);
        }

        let finished = actor.step().await.expect("finalize succeeds");
        assert!(finished);
        assert_eq!(actor.completed_cycles, 1);
        assert!(actor.current.is_none());
        assert!(!store.has_run_state("test_bot"));

        let completed = store.completed();
        assert_eq!(completed.len(), 1);
        let cycle = &completed[0];
        assert_eq!(cycle.cycle_number, 1);
        assert_eq!(cycle.total_games, 16);
        assert_eq!(cycle.wins + cycle.losses + cycle.draws, 16);
        assert_eq!(cycle.net_profit, cycle.total_winnings - cycle.total_losses);
        assert_eq!(cycle.active_pool, cycle.total_winnings + cycle.total_losses);
        // default basis for 1..100 over 16 games
        assert_eq!(cycle.total_bet_amount, dec!(808));
    }

    #[tokio::test]
    async fn replayed_finalize_is_swallowed() {
        let store = Arc::new(MemoryCycleStore::default());
        let (mut actor, _tx) = test_actor(store.clone(), Arc::new(ScriptedResolver));

        actor.prepare().await.expect("prepare succeeds");
        actor.begin_cycle().await.expect("planning succeeds");
        for _ in 0..17 {
            actor.step().await.expect("step succeeds");
        }
        assert_eq!(store.completed().len(), 1);

        // crash-after-insert replay: the same complete run state finalizes again
        let mut run_state = CycleRunState::new("test_bot", 1);
        for _ in 0..16 {
            run_state.record(Outcome::Draw, dec!(1));
        }
        actor.current = Some(ActiveCycle {
            run_state,
            plan: Vec::new(),
        });
        let finished = actor.finalize_current().await.expect("replay is a no-op");
        assert!(finished);

        // still exactly one record, and the counter resynced from the store
        assert_eq!(store.completed().len(), 1);
        assert_eq!(actor.completed_cycles, 1);
    }

    #[tokio::test]
    async fn resolver_failure_leaves_partial_state() {
        let store = Arc::new(MemoryCycleStore::default());
        let (mut actor, _tx) = test_actor(store.clone(), Arc::new(FailingResolver));

        actor.prepare().await.expect("prepare succeeds");
        actor.begin_cycle().await.expect("planning succeeds");

        for _ in 0..5 {
            let finished = actor.step().await.expect("failed resolution is not fatal");
            assert!(!finished);
        }

        let active = actor.current.as_ref().expect("cycle still in flight");
        assert_eq!(active.run_state.resolved_count, 0);
        assert_eq!(store.completed().len(), 0);
    }

    #[tokio::test]
    async fn restart_resumes_persisted_run_state() {
        let store = Arc::new(MemoryCycleStore::default());

        // first incarnation resolves 4 games, then "crashes"
        {
            let (mut actor, _tx) = test_actor(store.clone(), Arc::new(ScriptedResolver));
            actor.prepare().await.expect("prepare succeeds");
            actor.begin_cycle().await.expect("planning succeeds");
            for _ in 0..4 {
                actor.step().await.expect("step succeeds");
            }
        }
        assert!(store.has_run_state("test_bot"));

        // second incarnation picks up at game 4 and finishes the cycle
        let (mut actor, _tx) = test_actor(store.clone(), Arc::new(ScriptedResolver));
        actor.prepare().await.expect("prepare succeeds");

        let active = actor.current.as_ref().expect("resumed cycle");
        assert_eq!(active.run_state.cycle_number, 1);
        assert_eq!(active.run_state.resolved_count, 4);
        assert_eq!(active.plan.len(), 16);

        for _ in 0..13 {
            actor.step().await.expect("step succeeds");
        }
        assert_eq!(store.completed().len(), 1);
        assert_eq!(store.completed()[0].total_games, 16);
    }

    #[tokio::test]
    async fn consecutive_cycles_use_ascending_numbers() {
        let store = Arc::new(MemoryCycleStore::default());
        let (mut actor, _tx) = test_actor(store.clone(), Arc::new(ScriptedResolver));

        actor.prepare().await.expect("prepare succeeds");
        for expected_cycle in 1..=3 {
            actor.begin_cycle().await.expect("planning succeeds");
            for _ in 0..17 {
                actor.step().await.expect("step succeeds");
            }
            assert_eq!(actor.completed_cycles, expected_cycle);
        }

        let numbers: Vec<i64> = store.completed().iter().map(|c| c.cycle_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn invalid_config_update_is_rejected() {
        let store = Arc::new(MemoryCycleStore::default());
        let (mut actor, _tx) = test_actor(store, Arc::new(ScriptedResolver));

        let mut bad = test_config();
        bad.cycle.wins_count = 99;
        actor.apply_config(bad);

        // the original, valid config is still in place
        assert_eq!(actor.config.cycle.wins_count, 7);
    }
}
