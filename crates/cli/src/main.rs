//! Campaign Launcher CLI - create paused ad campaigns across accounts and stores.
//!
//! # Usage
//!
//! ```bash
//! # List ad accounts visible to GRAPH_ACCESS_TOKEN
//! launcher accounts
//!
//! # Show the store registry
//! launcher stores
//!
//! # Generate ad copy for a product
//! launcher copy --product LAMPARA --context "LED lamp, rechargeable"
//!
//! # Validate a request file and show what it would create
//! launcher plan launch.yaml
//!
//! # Create everything (paused); Ctrl+C cancels
//! launcher launch launch.yaml --generate-copy
//! ```
//!
//! # Commands
//!
//! - `accounts` - List ad accounts
//! - `stores` - List configured stores
//! - `copy` - Generate headline and body
//! - `plan` - Dry run: validate and count objects
//! - `launch` - Run the launch

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use campaign_launcher::LauncherConfig;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "launcher")]
#[command(author, version, about = "Create paused ad campaigns across accounts and stores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ad accounts visible to the access token
    Accounts,
    /// List configured stores
    Stores,
    /// Generate a headline and body for a product
    Copy {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Free-text product description for the copywriter
        #[arg(short, long, default_value = "")]
        context: String,
    },
    /// Validate a request file and show the objects it would create
    Plan {
        /// Path to the YAML request file
        request: PathBuf,
    },
    /// Create campaigns, ad sets, creatives and ads (all paused)
    Launch {
        /// Path to the YAML request file
        request: PathBuf,

        /// Replace headline and body with generated copy
        #[arg(long)]
        generate_copy: bool,
    },
}

#[tokio::main]
async fn main() {
    let config = match LauncherConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: LauncherConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Accounts => commands::accounts::list(&config).await?,
        Commands::Stores => commands::stores::list(&config)?,
        Commands::Copy { product, context } => {
            commands::copy::generate(&config, &product, &context).await;
        }
        Commands::Plan { request } => commands::launch::plan(&config, &request).await?,
        Commands::Launch {
            request,
            generate_copy,
        } => commands::launch::launch(&config, &request, generate_copy).await?,
    }
    Ok(())
}
