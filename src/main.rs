use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use payment_biometrics::models::{MerchantCategory, TransactionContext};
use payment_biometrics::security::replay::{render_report, replay_file, ReplayOptions};
use payment_biometrics::{api, config, utils};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the biometric session service
    Serve,

    /// Replay a recorded JSON-lines session and print its factors
    Replay {
        /// Capture file, one `{"at": <ms>, "type": ...}` event per line
        file: PathBuf,

        /// Simulated tick period in milliseconds
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,

        /// Transaction amount as typed
        #[arg(long, default_value = "")]
        amount: String,

        /// Merchant category, e.g. `cryptocurrency`
        #[arg(long, default_value_t = MerchantCategory::default())]
        merchant: MerchantCategory,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Configuration decides the log level, so it loads before the logger
    let config = config::load_config();
    let log_level = match &config {
        Ok(config) => config.log_level.clone(),
        Err(_) => env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
    };
    utils::logging::init_logger(&log_level);

    match cli.command {
        Command::Serve => {
            let config = config?;
            info!("Starting biometric session service...");
            api::start_api_server(config).await?;
        }
        Command::Replay {
            file,
            tick_ms,
            amount,
            merchant,
        } => {
            // Replay only needs the log level
            if let Err(e) = &config {
                warn!("Ignoring service configuration: {:#}", e);
            }
            let options = ReplayOptions {
                tick_ms,
                context: TransactionContext::from_input(&amount, merchant),
            };
            let report = replay_file(&file, &options)
                .with_context(|| format!("Replay of {} failed", file.display()))?;
            print!("{}", render_report(&report));
        }
    }

    Ok(())
}
