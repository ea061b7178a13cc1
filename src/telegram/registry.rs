//! Command registry
//!
//! An immutable mapping from command keyword to handler, built once at
//! startup through the builder and then only read by the dispatch loop.
//! Because nothing mutates
//! it after `build()`, no synchronization is needed around resolution.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use teloxide::types::Message;

use super::handlers::HandlerDeps;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for handlers
pub type HandlerResult = Result<(), HandlerError>;

/// A command handler: receives the shared dependencies, the triggering
/// message, and the argument tail after the command keyword.
pub type HandlerFn =
    Arc<dyn Fn(Arc<HandlerDeps>, Message, String) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wraps an async fn (or closure) into a boxed `HandlerFn`.
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Arc<HandlerDeps>, Message, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |deps, msg, args| Box::pin(f(deps, msg, args)))
}

/// Builder for `CommandRegistry`. Registration is a one-time startup step;
/// re-registering a name silently replaces the previous handler
/// (last write wins).
#[derive(Default)]
pub struct CommandRegistryBuilder {
    commands: HashMap<String, HandlerFn>,
    fallback: Option<HandlerFn>,
    bot_username: Option<String>,
}

impl CommandRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a command keyword (without the leading `/`) with a handler.
    pub fn register(mut self, name: &str, handler: HandlerFn) -> Self {
        self.commands.insert(name.to_ascii_lowercase(), handler);
        self
    }

    /// Handler for messages that carry no recognized command.
    pub fn fallback(mut self, handler: HandlerFn) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Bot username, used to strip `/cmd@botname` suffixes. Commands
    /// explicitly addressed to another bot resolve to nothing.
    pub fn bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
            fallback: self.fallback,
            bot_username: self.bot_username,
        }
    }
}

/// Frozen command mapping. See `CommandRegistryBuilder`.
pub struct CommandRegistry {
    commands: HashMap<String, HandlerFn>,
    fallback: Option<HandlerFn>,
    bot_username: Option<String>,
}

impl CommandRegistry {
    /// Resolves a message text to a handler.
    ///
    /// A known `/command` yields its handler plus the argument tail; an
    /// unknown command or plain text falls through to the fallback handler;
    /// `None` when neither applies.
    pub fn resolve(&self, text: Option<&str>) -> Option<(&HandlerFn, String)> {
        let text = text.unwrap_or("");
        match parse_command(text, self.bot_username.as_deref()) {
            Some(Addressed::Us(name, args)) => match self.commands.get(&name) {
                Some(handler) => Some((handler, args.to_string())),
                None => self.fallback_with(text),
            },
            // A command for a different bot is not ours to answer
            Some(Addressed::OtherBot) => None,
            None => self.fallback_with(text),
        }
    }

    fn fallback_with(&self, text: &str) -> Option<(&HandlerFn, String)> {
        self.fallback.as_ref().map(|h| (h, text.to_string()))
    }

    /// Registered command names, mostly for startup logging.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

enum Addressed<'a> {
    /// Command addressed to this bot (or unaddressed): keyword + argument tail
    Us(String, &'a str),
    /// Command carrying a mention of some other bot
    OtherBot,
}

fn parse_command<'a>(text: &'a str, bot_username: Option<&str>) -> Option<Addressed<'a>> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (token, args) = match rest.split_once(char::is_whitespace) {
        Some((token, args)) => (token, args.trim()),
        None => (rest, ""),
    };
    let (name, mention) = match token.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (token, None),
    };
    if name.is_empty() {
        return None;
    }
    if let (Some(mention), Some(username)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(username) {
            return Some(Addressed::OtherBot);
        }
    }
    Some(Addressed::Us(name.to_ascii_lowercase(), args))
}
