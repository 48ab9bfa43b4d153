//! CellHub CLI - run self-describing compute cells.

mod colors;
mod invoke;
mod list;
mod output;
mod remote;
mod serve;

use std::path::PathBuf;

use cellhub_core::{CellCatalog, HubConfig, ModuleLocation, Registry};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cellhub")]
#[command(about = "Discover, inspect and run compute cells")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Discovery candidate (URL or directory); repeat to try several in order
    #[arg(long = "cells", global = true)]
    cells: Vec<ModuleLocation>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Companion backend to probe
        #[arg(long)]
        companion: Option<String>,
    },

    /// Run one cell headlessly from a query string
    Invoke {
        /// Query string, e.g. "cell=fast_math&angle=45&format=json"
        query: String,
    },

    /// List discovered cells and their inputs
    List {
        /// Print the configs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Talk to the companion backend
    Remote {
        /// Backend base URL (defaults to the configured companion)
        #[arg(long)]
        url: Option<String>,

        /// API key for authenticated calls
        #[arg(long)]
        api_key: Option<String>,

        /// Secret key for authenticated calls
        #[arg(long)]
        secret_key: Option<String>,

        #[command(subcommand)]
        action: remote::RemoteAction,
    },
}

/// Load the config file and apply global overrides.
fn load_config(cli: &Cli) -> anyhow::Result<HubConfig> {
    let mut config = HubConfig::resolve(cli.config.as_deref())?;
    if !cli.cells.is_empty() {
        config.candidates = cli.cells.clone();
    }
    Ok(config)
}

/// Run discovery with the built-in catalog.
async fn discover(config: &HubConfig) -> Registry {
    Registry::discover(&config.discovery(), &CellCatalog::builtin()).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            companion,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if companion.is_some() {
                config.companion_url = companion;
            }
            serve::execute(&config).await?;
        }

        Commands::Invoke { query } => {
            invoke::execute(&config, &query).await?;
        }

        Commands::List { json } => {
            list::execute(&config, json).await?;
        }

        Commands::Remote {
            url,
            api_key,
            secret_key,
            action,
        } => {
            let url = url
                .or_else(|| config.companion_url.clone())
                .ok_or_else(|| anyhow::anyhow!("No companion URL; pass --url or set companion_url"))?;
            remote::execute(&url, api_key, secret_key, action).await?;
        }
    }

    Ok(())
}
