//! Command handlers and their shared dependencies
//!
//! Every handler receives `HandlerDeps`, the triggering message, and the
//! argument tail. Storage failures propagate out as the handler's error;
//! the dispatch loop logs them and no reply is sent for that update.

use std::sync::Arc;

use teloxide::types::Message;

use super::outbound::{Outbound, ReplyRequest};
use super::registry::{handler, CommandRegistry, CommandRegistryBuilder, HandlerResult};
use crate::storage::db::{get_connection, get_or_create_user, DbPool, UserProfile};

pub const WELCOME_TEXT: &str =
    "Welcome to the bot! I'm here to help. Use /help to see available commands.";

pub const HELP_TEXT: &str = "Available commands:
/start - Start the bot
/help - Show this help message
/echo <text> - Echo back the provided text";

pub const ECHO_PROMPT_TEXT: &str = "Please provide text to echo after the /echo command";

pub const FALLBACK_TEXT: &str = "I don't understand that command. Try /help to see available commands.";

/// Dependencies shared by all handlers, constructed once in `main`.
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub outbound: Arc<dyn Outbound>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, outbound: Arc<dyn Outbound>) -> Self {
        Self { db_pool, outbound }
    }
}

/// Builds the production command registry.
///
/// Called once at startup; the result is immutable for the lifetime of the
/// dispatch loop.
pub fn default_registry(bot_username: Option<String>) -> CommandRegistry {
    CommandRegistryBuilder::new()
        .bot_username(bot_username)
        .register("start", handler(handle_start))
        .register("help", handler(handle_help))
        .register("echo", handler(handle_echo))
        .fallback(handler(handle_fallback))
        .build()
}

/// `/start`: greets the user and upserts their record.
///
/// The only handler that touches the user store: a message without a
/// sender (e.g. a channel post) is ignored.
pub async fn handle_start(deps: Arc<HandlerDeps>, msg: Message, _args: String) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(profile) = profile_from_telegram(from) else {
        log::warn!("Skipping sender with out-of-range id {}", from.id);
        return Ok(());
    };

    let conn = get_connection(&deps.db_pool)?;
    let user = get_or_create_user(&conn, &profile)?;

    log::info!(
        "User activity: telegram_id={} username={:?}",
        user.telegram_id,
        user.username
    );

    deps.outbound
        .send_reply(ReplyRequest::new(msg.chat.id, WELCOME_TEXT).in_reply_to(msg.id))
        .await?;
    Ok(())
}

/// `/help`: lists the available commands.
pub async fn handle_help(deps: Arc<HandlerDeps>, msg: Message, _args: String) -> HandlerResult {
    deps.outbound
        .send_reply(ReplyRequest::new(msg.chat.id, HELP_TEXT))
        .await?;
    Ok(())
}

/// `/echo <text>`: echoes the argument back; prompts when it is missing.
/// Touches no storage either way.
pub async fn handle_echo(deps: Arc<HandlerDeps>, msg: Message, args: String) -> HandlerResult {
    let text = if args.is_empty() {
        ECHO_PROMPT_TEXT.to_string()
    } else {
        format!("You said: {}", args)
    };

    deps.outbound
        .send_reply(ReplyRequest::new(msg.chat.id, text))
        .await?;
    Ok(())
}

/// Fallback for unknown commands and plain text.
pub async fn handle_fallback(deps: Arc<HandlerDeps>, msg: Message, _args: String) -> HandlerResult {
    deps.outbound
        .send_reply(ReplyRequest::new(msg.chat.id, FALLBACK_TEXT))
        .await?;
    Ok(())
}

/// `None` when the platform id does not fit the storage key; mapping such
/// a sender onto some sentinel id would merge unrelated accounts.
fn profile_from_telegram(from: &teloxide::types::User) -> Option<UserProfile> {
    let telegram_id = i64::try_from(from.id.0).ok()?;
    Some(UserProfile {
        telegram_id,
        username: from.username.clone(),
        first_name: Some(from.first_name.clone()),
        last_name: from.last_name.clone(),
        language_code: from.language_code.clone(),
    })
}
