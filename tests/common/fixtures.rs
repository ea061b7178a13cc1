//! Test fixtures: Telegram objects built from JSON, an in-memory database,
//! and a recording outbound double.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use r2d2_sqlite::SqliteConnectionManager;
use teloxide::types::{Message, Update, UpdateKind};

use tonearm::storage::db::DbPool;
use tonearm::storage::migrations::run_migrations;
use tonearm::telegram::{HandlerDeps, Outbound, ReplyRequest};

/// Telegram message JSON as the Bot API delivers it
fn message_json(user_id: i64, chat_id: i64, message_id: i32, text: &str) -> serde_json::Value {
    serde_json::json!({
        "message_id": message_id,
        "date": 1700000000,
        "chat": {
            "id": chat_id,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
            "last_name": "User",
            "username": "testuser",
            "language_code": "en"
        },
        "text": text
    })
}

// Telegram types carry custom deserializers that only behave through the
// string path, so fixtures must not go through `serde_json::from_value`.

pub fn message(user_id: i64, chat_id: i64, message_id: i32, text: &str) -> Message {
    let value = message_json(user_id, chat_id, message_id, text);
    serde_json::from_str(&value.to_string()).expect("valid message JSON")
}

/// An update wrapping a regular message
pub fn update(update_id: u32, user_id: i64, chat_id: i64, message_id: i32, text: &str) -> Update {
    let value = serde_json::json!({
        "update_id": update_id,
        "message": message_json(user_id, chat_id, message_id, text),
    });
    let update: Update = serde_json::from_str(&value.to_string()).expect("valid update JSON");
    // A malformed fixture decodes as UpdateKind::Error, which the loop
    // skips; every test on it would then pass without exercising anything
    assert!(
        matches!(update.kind, UpdateKind::Message(_)),
        "fixture did not decode as a message update: {:?}",
        update.kind
    );
    update
}

/// An update with no message body (an edit), which the loop must skip
pub fn non_message_update(update_id: u32) -> Update {
    let mut body = message_json(1, 1, 1, "edited");
    body["edit_date"] = serde_json::json!(1700000001);
    let value = serde_json::json!({
        "update_id": update_id,
        "edited_message": body,
    });
    let update: Update = serde_json::from_str(&value.to_string()).expect("valid update JSON");
    assert!(
        matches!(update.kind, UpdateKind::EditedMessage(_)),
        "fixture did not decode as an edited-message update: {:?}",
        update.kind
    );
    update
}

/// Outbound double that records every reply instead of sending it.
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<ReplyRequest>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ReplyRequest> {
        self.sent.lock().expect("outbound lock").clone()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn send_reply(&self, reply: ReplyRequest) -> Result<(), teloxide::RequestError> {
        self.sent.lock().expect("outbound lock").push(reply);
        Ok(())
    }
}

/// A migrated single-connection pool over an in-memory database.
///
/// `max_size(1)` keeps every caller on the same connection, which is what
/// keeps the `:memory:` database alive across calls.
pub fn memory_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("build in-memory pool");

    let mut conn = pool.get().expect("get pooled connection");
    run_migrations(&mut conn).expect("apply migrations");
    drop(conn);

    pool
}

/// Handler dependencies over an in-memory database and a recording outbound.
pub fn test_deps() -> (Arc<HandlerDeps>, Arc<RecordingOutbound>) {
    let outbound = Arc::new(RecordingOutbound::new());
    let deps = Arc::new(HandlerDeps::new(
        Arc::new(memory_pool()),
        Arc::clone(&outbound) as Arc<dyn Outbound>,
    ));
    (deps, outbound)
}
