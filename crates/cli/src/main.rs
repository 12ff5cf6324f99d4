//! SaaSBay CLI - Session migrations and operator reports.
//!
//! # Usage
//!
//! ```bash
//! # Create the admin session table
//! saasbay-cli migrate
//!
//! # Print the dashboard summary and chart data for the last 90 days
//! saasbay-cli summary --range 90d
//!
//! # Print the effective platform settings
//! saasbay-cli settings show
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `admin.session` table
//! - `summary` - Headline counts, buckets and monthly trend
//! - `settings show` - Effective settings as YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use saasbay_core::metrics::TimeRange;

mod commands;

#[derive(Parser)]
#[command(name = "saasbay-cli")]
#[command(author, version, about = "SaaSBay admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin session table
    Migrate,
    /// Print the dashboard summary and analytics buckets
    Summary {
        /// Chart window (7d, 30d, 90d, 365d)
        #[arg(short, long, default_value = "30d")]
        range: TimeRange,
    },
    /// Inspect platform settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings as YAML
    Show,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Summary { range } => commands::summary::print(range).await?,
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show().await?,
        },
    }
    Ok(())
}
