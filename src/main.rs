use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use price_sync::{
    commands::{list_symbols, sync_prices},
    config::{SyncConfig, DEFAULT_REQUEST_DELAY},
    context::AppContext,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "price-sync")]
#[command(about = "Refresh the Current price of every stock page in a Notion data source")]
struct Cli {
    /// Data source to sync (overrides DATABSOURCE_ID)
    #[arg(long = "data-source-id", value_name = "ID", global = true)]
    data_source_id: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest close for each page and write it back (default)
    Sync {
        /// Pause between price lookups, in milliseconds
        #[arg(long = "delay-ms", value_name = "MS")]
        delay_ms: Option<u64>,
        /// Look up prices without writing them back
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the ticker symbol resolved for each page without fetching prices
    ListSymbols,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        data_source_id,
        command,
    } = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SyncConfig::from_env()?.with_data_source_id(data_source_id);
    let app_context = AppContext::initialize(config)?;

    match command.unwrap_or(Commands::Sync {
        delay_ms: None,
        dry_run: false,
    }) {
        Commands::Sync { delay_ms, dry_run } => {
            let request_delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REQUEST_DELAY);
            let summary = sync_prices::run(
                &app_context,
                sync_prices::SyncOptions {
                    request_delay,
                    dry_run,
                },
            )
            .await?;
            if summary.failed > 0 {
                info!(
                    "{} record(s) failed; rerun to retry them",
                    summary.failed
                );
            }
        }
        Commands::ListSymbols => {
            list_symbols::run(&app_context).await?;
        }
    }

    Ok(())
}
