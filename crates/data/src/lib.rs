pub mod database;
pub mod models;
pub mod reporter;
pub mod repositories;
pub mod store;

pub use database::connect_pool;
pub use models::{BotRecord, CompletedCycleRecord};
pub use reporter::{
    clamp_page_limit, CycleReporter, HistoryOrder, PaginatedCycles, Pagination,
    ProfitReconciliation, RevenueSummary, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use repositories::{
    BotRepository, CycleCountMismatch, CycleRepository, RevenueStats, RunStateRepository,
};
pub use store::PgCycleStore;
