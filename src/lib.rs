//! Tonearm - Telegram bot with a SQLite-backed user and track store
//!
//! This library provides all the core functionality for the Tonearm bot:
//! the command registry, the update dispatch loop, and the storage layer.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, and logging setup
//! - `storage`: Database pool, migrations, and the user/track stores
//! - `telegram`: Bot integration, command handlers, and the dispatch loop

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config::Config, error::{AppError, AppResult}};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
pub use telegram::{dispatch::LoopExit, registry::CommandRegistry};
