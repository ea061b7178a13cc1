use anyhow::{Context, Result};
use dotenvy::dotenv;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::{AsUpdateStream, Polling};
use tokio_util::sync::CancellationToken;

use tonearm::cli::{Cli, Commands};
use tonearm::core::{init_logger, Config};
use tonearm::storage::migrations::run_migrations;
use tonearm::storage::{create_pool, get_connection};
use tonearm::telegram::{
    create_bot, default_registry, run_dispatch_loop, setup_bot_commands, BotOutbound, HandlerDeps,
    LoopExit,
};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (config, logging, database,
/// bot creation); all bootstrap failures are fatal before the dispatch
/// loop starts.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::from_env().context("load configuration")?;
    init_logger(&config.log_file_path).context("initialize logger")?;

    match cli.command {
        Some(Commands::Migrate) => run_migrate(&config),
        Some(Commands::Run { drop_pending }) => run_bot(&config, drop_pending).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(&config, false).await
        }
    }
}

/// Apply migrations and exit. Used by deploy scripts to migrate without
/// starting the bot.
fn run_migrate(config: &Config) -> Result<()> {
    let pool = create_pool(&config.database_path).context("create database pool")?;
    let mut conn = get_connection(&pool).context("get database connection")?;
    run_migrations(&mut conn)?;
    log::info!("Migrations applied ({})", config.database_path);
    Ok(())
}

/// Run the Telegram bot in long-polling mode until a termination signal.
async fn run_bot(config: &Config, drop_pending: bool) -> Result<()> {
    log::info!("Starting bot...");

    // Database: pool first, then the explicit migration step
    let db_pool = Arc::new(create_pool(&config.database_path).context("create database pool")?);
    {
        let mut conn = get_connection(&db_pool).context("get database connection")?;
        run_migrations(&mut conn)?;
    }

    let bot = create_bot(config)?;
    let bot_info = bot.get_me().await.context("connect to Bot API")?;
    let bot_username = bot_info.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_info.id);

    setup_bot_commands(&bot).await.context("set bot commands")?;

    // Built once at startup, immutable afterwards
    let registry = Arc::new(default_registry(bot_username));
    let deps = Arc::new(HandlerDeps::new(
        Arc::clone(&db_pool),
        Arc::new(BotOutbound::new(bot.clone())),
    ));

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone(), config.shutdown_grace);

    let builder = Polling::builder(bot.clone());
    let mut listener = if drop_pending {
        builder.drop_pending_updates().build()
    } else {
        builder.build()
    };

    // The listener yields Result<Update, _>; listener errors are logged
    // and skipped so transient polling failures never stop the loop.
    let updates = listener.as_stream().filter_map(|next| async move {
        match next {
            Ok(update) => Some(update),
            Err(e) => {
                log::error!("Update listener error: {}", e);
                None
            }
        }
    });
    futures_util::pin_mut!(updates);

    log::info!("Ready to receive updates");
    match run_dispatch_loop(updates, cancel, registry, deps).await {
        LoopExit::Cancelled => log::info!("Shutdown complete"),
        LoopExit::StreamClosed => log::warn!("Update stream ended unexpectedly"),
    }

    Ok(())
}

/// Listens for termination signals, cancels the root token, and forces
/// exit if the main loop does not wind down within the grace period.
fn spawn_signal_listener(cancel: CancellationToken, grace: Duration) {
    tokio::spawn(async move {
        let signal_name = wait_for_signal().await;
        log::info!("Received {} signal, shutting down", signal_name);
        cancel.cancel();

        tokio::time::sleep(grace).await;
        log::warn!("Cleanup timeout exceeded, forcing shutdown");
        std::process::exit(1);
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return "interrupt";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "interrupt",
        _ = terminate.recv() => "terminate",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "interrupt"
}
