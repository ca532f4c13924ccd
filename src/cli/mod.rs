pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "finance-intake")]
#[command(about = "Finance intake API - invoices, bank statements and balances per user")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store even when DATABASE_URL is set")]
        memory: bool,
    },

    #[command(about = "Create the database schema and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        memory: false,
    }) {
        Commands::Serve { port, memory } => commands::serve::handle(config, port, memory).await,
        Commands::Migrate => commands::migrate::handle(config).await,
    }
}
