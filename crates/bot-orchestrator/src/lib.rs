pub mod bot_actor;
pub mod bot_handle;
pub mod commands;
pub mod events;
pub mod registry;
pub mod resolver;

pub use bot_actor::BotActor;
pub use bot_handle::BotHandle;
pub use commands::{BotCommand, BotConfig, BotState, BotStatus};
pub use events::{BotEvent, BotStatusSnapshot};
pub use registry::BotRegistry;
pub use resolver::ScriptedResolver;
