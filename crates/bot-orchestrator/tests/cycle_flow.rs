//! End-to-end cycle flow: registry -> actor -> store, over an in-memory
//! store and the scripted resolver.

use async_trait::async_trait;
use gem_arena_bot_orchestrator::{BotConfig, BotEvent, BotRegistry, ScriptedResolver};
use gem_arena_core::error::Result as CoreResult;
use gem_arena_core::{BotCycleConfig, CompletedCycle, CycleError, CycleRunState, CycleStore};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[derive(Default)]
struct MemoryStoreInner {
    completed: BTreeMap<(String, i64), CompletedCycle>,
    run_states: HashMap<String, CycleRunState>,
}

/// In-memory [`CycleStore`] enforcing the same uniqueness rule as the
/// `unique_bot_cycle` index.
#[derive(Default)]
struct MemoryCycleStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryCycleStore {
    fn completed(&self) -> Vec<CompletedCycle> {
        self.inner
            .lock()
            .unwrap()
            .completed
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CycleStore for MemoryCycleStore {
    async fn insert_completed(&self, cycle: &CompletedCycle) -> CoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
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

fn fast_config(bot_id: &str) -> BotConfig {
    BotConfig {
        bot_id: bot_id.to_string(),
        enabled: true,
        cycle: BotCycleConfig::new(dec!(1), dec!(50), 12, 5, 4, 3, 40.0, 35.0, 25.0)
            .expect("config is valid"),
        game_interval_secs: 0,
        planner_seed: Some(7),
    }
}

#[tokio::test]
async fn bot_runs_cycles_to_completion() {
    let store = Arc::new(MemoryCycleStore::default());
    let registry = BotRegistry::new(store.clone(), Arc::new(ScriptedResolver::new()));

    let handle = registry
        .spawn_bot(fast_config("alpha"))
        .await
        .expect("spawn succeeds");

    let mut events = handle.subscribe_events();
    handle.start().await.expect("start command sent");

    let completed_cycle = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(BotEvent::CycleCompleted { cycle_number, .. }) => break cycle_number,
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("event stream closed before completion"),
            }
        }
    })
    .await
    .expect("a cycle completes within the deadline");

    assert!(completed_cycle >= 1);
    handle.stop().await.expect("stop command sent");
    registry.remove_bot("alpha").await.expect("removal succeeds");

    let completed = store.completed();
    assert!(!completed.is_empty());

    for cycle in &completed {
        assert_eq!(cycle.bot_id, "alpha");
        assert_eq!(cycle.total_games, 12);
        assert_eq!(cycle.wins + cycle.losses + cycle.draws, cycle.total_games);
        assert_eq!(cycle.total_bet_amount, dec!(306));
        assert_eq!(cycle.net_profit, cycle.total_winnings - cycle.total_losses);
        assert_eq!(cycle.active_pool, cycle.total_winnings + cycle.total_losses);
    }

    // cycle numbers are gapless and unique
    let mut numbers: Vec<i64> = completed.iter().map(|c| c.cycle_number).collect();
    numbers.sort_unstable();
    let expected: Vec<i64> = (1..=numbers.len() as i64).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn counter_always_matches_recorded_rows() {
    let store = Arc::new(MemoryCycleStore::default());
    let registry = BotRegistry::new(store.clone(), Arc::new(ScriptedResolver::new()));

    let handle = registry
        .spawn_bot(fast_config("beta"))
        .await
        .expect("spawn succeeds");

    let mut events = handle.subscribe_events();
    handle.start().await.expect("start command sent");

    // wait for a few cycles, then stop
    let mut seen = 0;
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(BotEvent::CycleCompleted { .. }) => {
                    seen += 1;
                    if seen >= 3 {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("three cycles complete within the deadline");

    handle.stop().await.expect("stop command sent");
    handle.shutdown().await.expect("shutdown command sent");

    // let the actor drain its queued commands and exit before snapshotting
    tokio::time::sleep(Duration::from_millis(500)).await;

    let rows = store.completed().len() as i64;
    let counted = store
        .completed_cycles_count("beta")
        .await
        .expect("count succeeds");
    assert!(rows >= 3);
    assert_eq!(rows, counted);
}

#[tokio::test]
async fn independent_bots_do_not_share_cycles() {
    let store = Arc::new(MemoryCycleStore::default());
    let registry = BotRegistry::new(store.clone(), Arc::new(ScriptedResolver::new()));

    let first = registry
        .spawn_bot(fast_config("gamma"))
        .await
        .expect("spawn succeeds");
    let second = registry
        .spawn_bot(fast_config("delta"))
        .await
        .expect("spawn succeeds");

    let mut first_events = first.subscribe_events();
    let mut second_events = second.subscribe_events();
    first.start().await.expect("start command sent");
    second.start().await.expect("start command sent");

    for events in [&mut first_events, &mut second_events] {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match events.recv().await {
                    Ok(BotEvent::CycleCompleted { .. }) => break,
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => panic!("event stream closed"),
                }
            }
        })
        .await
        .expect("each bot completes a cycle");
    }

    registry.shutdown_all().await.expect("shutdown succeeds");

    let completed = store.completed();
    let gamma: Vec<_> = completed.iter().filter(|c| c.bot_id == "gamma").collect();
    let delta: Vec<_> = completed.iter().filter(|c| c.bot_id == "delta").collect();
    assert!(!gamma.is_empty());
    assert!(!delta.is_empty());

    // each bot numbers its own cycles from 1
    assert!(gamma.iter().any(|c| c.cycle_number == 1));
    assert!(delta.iter().any(|c| c.cycle_number == 1));
}

#[tokio::test]
async fn duplicate_insert_is_rejected_by_the_store() {
    let store = MemoryCycleStore::default();
    let mut run_state = CycleRunState::new("solo", 1);
    run_state.record(gem_arena_core::Outcome::Win, dec!(10));
    let cycle = CompletedCycle::from_totals("solo", 1, &run_state.totals(), chrono::Utc::now());

    store.insert_completed(&cycle).await.expect("first insert succeeds");
    let err = store
        .insert_completed(&cycle)
        .await
        .expect_err("second insert must fail");
    assert!(err.is_duplicate());
    assert_eq!(store.completed().len(), 1);
}
