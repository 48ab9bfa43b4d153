//! Remote command implementation for the CellHub CLI.
//!
//! Thin wrappers over the companion backend client.

use cellhub_server::companion::{KeyId, NewApiKey};
use cellhub_server::{ApiCredentials, BatchRequest, CompanionClient};
use clap::Subcommand;

use crate::colors;

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Check that the backend is alive
    Ping,

    /// Run cells on the backend
    Exec {
        /// Cells to run, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        cells: Vec<String>,

        /// Inputs as JSON, keyed by cell id
        #[arg(long)]
        data: Option<String>,
    },

    /// Log in and print the account's key pair
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// List API keys
    Keys,

    /// Create an API key
    CreateKey {
        /// Key name
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Cells the key may run, comma separated
        #[arg(long, value_delimiter = ',')]
        allowed_cells: Vec<String>,
    },

    /// Revoke an API key
    RevokeKey {
        /// Key id
        id: String,
    },
}

/// Run a remote action.
pub async fn execute(
    url: &str,
    api_key: Option<String>,
    secret_key: Option<String>,
    action: RemoteAction,
) -> anyhow::Result<()> {
    let mut client = CompanionClient::new(url);
    if let (Some(api_key), Some(secret_key)) = (api_key, secret_key) {
        client = client.with_credentials(ApiCredentials { api_key, secret_key });
    }

    match action {
        RemoteAction::Ping => {
            let ping = client.ping().await?;
            println!(
                "{}●{} {} is {} ({} cells)",
                colors::GREEN,
                colors::RESET,
                client.base_url(),
                ping.status,
                ping.cells.len()
            );
        }

        RemoteAction::Exec { cells, data } => {
            let data = match data {
                Some(data) => serde_json::from_str(&data)
                    .map_err(|e| anyhow::anyhow!("--data is not a JSON object keyed by cell id: {}", e))?,
                None => Default::default(),
            };
            let results = client.run_batch(&BatchRequest { cells, data }).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        RemoteAction::Login { email, password } => {
            let login = client.login(&email, &password).await?;
            println!("{}Logged in as{} {}", colors::GREEN, colors::RESET, login.user.email);
            println!("  api key:    {}", login.api_key);
            println!("  secret key: {}", login.secret_key);
        }

        RemoteAction::Register { email, password } => {
            client.register(&email, &password).await?;
            println!("{}Registered{} {}; log in to get a key pair", colors::GREEN, colors::RESET, email);
        }

        RemoteAction::Keys => {
            let keys = client.list_keys().await?;
            if keys.is_empty() {
                println!("{}No API keys found{}", colors::YELLOW, colors::RESET);
            }
            for key in keys {
                let (color, state) = if key.is_active {
                    (colors::GREEN, "active")
                } else {
                    (colors::DIM, "inactive")
                };
                println!(
                    "{:>6}  {:<20} {}{}{}  created {}  last used {}",
                    key.id.to_string(),
                    key.name.as_deref().unwrap_or("Unnamed"),
                    color,
                    state,
                    colors::RESET,
                    key.created_at.as_deref().unwrap_or("-"),
                    key.last_used.as_deref().unwrap_or("never")
                );
            }
        }

        RemoteAction::CreateKey {
            name,
            description,
            allowed_cells,
        } => {
            let created = client
                .create_api_key(&NewApiKey {
                    name,
                    description,
                    allowed_cells,
                })
                .await?;
            println!("{}Created key{}", colors::GREEN, colors::RESET);
            println!("  api key:    {}", created.api_key);
            println!("  secret key: {}", created.secret_key);
        }

        RemoteAction::RevokeKey { id } => {
            let id = id.parse::<i64>().map(KeyId::Int).unwrap_or(KeyId::Text(id));
            client.revoke_key(&id).await?;
            println!("{}Revoked key{} {}", colors::GREEN, colors::RESET, id);
        }
    }

    Ok(())
}
