use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tonearm")]
#[command(author, version, about = "Telegram bot with a SQLite-backed user and track store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in long-polling mode
    Run {
        /// Drop updates that accumulated while the bot was offline
        #[arg(long)]
        drop_pending: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
