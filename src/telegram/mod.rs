//! Telegram bot integration: commands, dispatch, and the outbound boundary

pub mod bot;
pub mod dispatch;
pub mod handlers;
pub mod outbound;
pub mod registry;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use dispatch::{run_dispatch_loop, LoopExit};
pub use handlers::{default_registry, HandlerDeps};
pub use outbound::{BotOutbound, Outbound, ReplyRequest};
pub use registry::{CommandRegistry, CommandRegistryBuilder, HandlerError, HandlerResult};
