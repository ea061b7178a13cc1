//! Bot instance creation and Telegram-side command setup

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::Config;

/// Bot commands advertised in the Telegram UI
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "What I can do:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show this help message")]
    Help,
    #[command(description = "echo back the provided text")]
    Echo(String),
}

/// Creates a Bot instance with the configured token, request timeout, and
/// optional custom Bot API URL.
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config.request_timeout).build()?;
    let bot = Bot::with_client(config.bot_token.clone(), client);

    let bot = match &config.api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Registers the command list with Telegram so clients show completions.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
