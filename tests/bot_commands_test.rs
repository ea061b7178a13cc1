//! End-to-end command tests: updates flow through the dispatch loop into the
//! real handlers, against an in-memory database and a recording outbound.

mod common;

use std::sync::Arc;

use futures_util::stream;
use pretty_assertions::assert_eq;
use teloxide::types::MessageId;
use tokio_util::sync::CancellationToken;

use tonearm::storage::db::{count_users, get_user};
use tonearm::storage::get_connection;
use tonearm::telegram::handlers::{ECHO_PROMPT_TEXT, FALLBACK_TEXT, HELP_TEXT, WELCOME_TEXT};
use tonearm::telegram::{default_registry, run_dispatch_loop, HandlerDeps, LoopExit, ReplyRequest};

use common::{test_deps, update, RecordingOutbound};

/// Feeds the updates through a full dispatch loop and returns what came out.
async fn run_updates(
    updates: Vec<teloxide::types::Update>,
) -> (LoopExit, Vec<ReplyRequest>, Arc<HandlerDeps>) {
    let (deps, outbound): (Arc<HandlerDeps>, Arc<RecordingOutbound>) = test_deps();
    let registry = Arc::new(default_registry(Some("testbot".to_string())));

    let exit = run_dispatch_loop(
        stream::iter(updates),
        CancellationToken::new(),
        registry,
        Arc::clone(&deps),
    )
    .await;

    (exit, outbound.sent(), deps)
}

#[test]
fn fixture_updates_decode_as_real_message_updates() {
    let decoded = update(1, 42, 42, 1, "/start");
    let teloxide::types::UpdateKind::Message(msg) = decoded.kind else {
        panic!("expected a message update, got {:?}", decoded.kind);
    };
    assert_eq!(msg.text(), Some("/start"));
}

#[tokio::test]
async fn start_greets_and_records_the_user() {
    let (exit, sent, deps) = run_updates(vec![update(1, 42, 42, 1, "/start")]).await;

    assert_eq!(exit, LoopExit::StreamClosed);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, WELCOME_TEXT);
    assert_eq!(sent[0].reply_to, Some(MessageId(1)));

    let conn = get_connection(&deps.db_pool).unwrap();
    let user = get_user(&conn, 42).unwrap().expect("user row created");
    assert_eq!(user.username.as_deref(), Some("testuser"));
    assert_eq!(user.first_name.as_deref(), Some("Test"));
}

#[tokio::test]
async fn repeated_start_keeps_a_single_user_row() {
    let (exit, sent, deps) = run_updates(vec![
        update(1, 42, 42, 1, "/start"),
        update(2, 42, 42, 2, "/start"),
    ])
    .await;

    assert_eq!(exit, LoopExit::StreamClosed);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].text, WELCOME_TEXT);
    assert_eq!(sent[1].reply_to, Some(MessageId(2)));

    let conn = get_connection(&deps.db_pool).unwrap();
    assert_eq!(count_users(&conn).unwrap(), 1);
}

#[tokio::test]
async fn echo_returns_the_arguments_verbatim() {
    let (_, sent, _) = run_updates(vec![update(1, 42, 42, 1, "/echo hello world")]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "You said: hello world");
}

#[tokio::test]
async fn echo_without_arguments_asks_for_text() {
    let (_, sent, deps) = run_updates(vec![update(1, 42, 42, 1, "/echo")]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, ECHO_PROMPT_TEXT);

    // Only /start touches the user store
    let conn = get_connection(&deps.db_pool).unwrap();
    assert_eq!(count_users(&conn).unwrap(), 0);
}

#[tokio::test]
async fn help_lists_the_commands() {
    let (_, sent, _) = run_updates(vec![update(1, 42, 42, 1, "/help")]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, HELP_TEXT);
}

#[tokio::test]
async fn unknown_command_gets_the_fallback_reply() {
    let (_, sent, _) = run_updates(vec![update(1, 42, 42, 1, "/frobnicate now")]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, FALLBACK_TEXT);
}

#[tokio::test]
async fn plain_text_is_ignored_without_a_fallback_for_it() {
    let (exit, sent, _) = run_updates(vec![update(1, 42, 42, 1, "just chatting")]).await;

    assert_eq!(exit, LoopExit::StreamClosed);
    assert!(sent.is_empty());
}

#[tokio::test]
async fn command_addressed_to_another_bot_is_ignored() {
    let (_, sent, _) = run_updates(vec![update(1, 42, 42, 1, "/start@otherbot")]).await;

    assert!(sent.is_empty());
}
