//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{
    memory_pool, message, non_message_update, test_deps, update, RecordingOutbound,
};
