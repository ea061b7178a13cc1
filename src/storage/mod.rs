//! Database pool, migrations, and the user/track stores

pub mod db;
pub mod migrations;
pub mod tracks;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
