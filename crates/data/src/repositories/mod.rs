pub mod bot_repo;
pub mod cycle_repo;
pub mod run_state_repo;

pub use bot_repo::BotRepository;
pub use cycle_repo::{CycleCountMismatch, CycleRepository, RevenueStats};
pub use run_state_repo::RunStateRepository;
