//! Runtime configuration
//!
//! The config is built once in `main` from the process environment and
//! passed by reference into every component that needs it. No global
//! statics: components never read the environment themselves.

use std::time::Duration;

use crate::core::error::AppError;

/// Configuration for the bot process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token (BOT_TOKEN, falls back to TELOXIDE_TOKEN)
    pub bot_token: String,
    /// Custom Bot API server URL (BOT_API_URL), if any
    pub api_url: Option<url::Url>,
    /// Path to the SQLite database file (DATABASE_PATH)
    pub database_path: String,
    /// Path to the log file (LOG_FILE_PATH)
    pub log_file_path: String,
    /// Timeout for outgoing Telegram HTTP requests (REQUEST_TIMEOUT_SECS)
    pub request_timeout: Duration,
    /// Grace period between cancellation and forced exit (SHUTDOWN_GRACE_SECS)
    pub shutdown_grace: Duration,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the bot token is missing or
    /// BOT_API_URL does not parse as a URL.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let bot_token = lookup("BOT_TOKEN")
            .or_else(|| lookup("TELOXIDE_TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Config("BOT_TOKEN is not set".to_string()))?;

        let api_url = match lookup("BOT_API_URL") {
            Some(raw) if !raw.trim().is_empty() => Some(
                url::Url::parse(raw.trim())
                    .map_err(|e| AppError::Config(format!("invalid BOT_API_URL: {}", e)))?,
            ),
            _ => None,
        };

        Ok(Self {
            bot_token,
            api_url,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "database.sqlite".to_string()),
            log_file_path: lookup("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()),
            request_timeout: duration_from(lookup("REQUEST_TIMEOUT_SECS"), 30),
            shutdown_grace: duration_from(lookup("SHUTDOWN_GRACE_SECS"), 5),
        })
    }
}

fn duration_from(raw: Option<String>, default_secs: u64) -> Duration {
    let secs = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}
