//! dapr-config entry point
//!
//! Loads a Dapr secret store through the sidecar and prints the resulting
//! configuration keys.

use clap::{Args, Parser, Subcommand};
use dapr_config_core::client::{DaprClientConfig, DaprHttpClient, SecretClient};
use dapr_config_core::providers::ConfigurationBuilder;
use dapr_config_core::secrets::{SecretDescriptor, SecretStoreOptions};
use dapr_config_core::settings::SecretStoreSettings;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dapr-config")]
#[command(about = "Load configuration from a Dapr secret store")]
#[command(version)]
struct Cli {
    /// Sidecar HTTP endpoint (defaults to http://127.0.0.1:$DAPR_HTTP_PORT)
    #[arg(long, env = "DAPR_HTTP_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Sidecar API token
    #[arg(long, env = "DAPR_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Secret store component name
    #[arg(short, long)]
    store: Option<String>,

    /// Secret to fetch by name (repeatable); bulk mode when omitted
    #[arg(long = "secret")]
    secrets: Vec<String>,

    /// Hierarchy delimiter used in secret names (repeatable, in priority order)
    #[arg(long = "delimiter")]
    delimiters: Vec<String>,

    /// Keep secret names exactly as stored
    #[arg(long)]
    no_normalize: bool,

    /// Settings file (JSON/TOML/YAML); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the store and list configuration keys
    Load {
        #[command(flatten)]
        store: StoreArgs,

        /// Print secret values instead of masking them
        #[arg(long)]
        show_values: bool,
    },

    /// Load the store and print a single value
    Get {
        #[command(flatten)]
        store: StoreArgs,

        /// Configuration key, e.g. database:password
        key: String,
    },
}

impl StoreArgs {
    fn into_options(self, client: Arc<dyn SecretClient>) -> anyhow::Result<SecretStoreOptions> {
        let settings = match self.config {
            Some(ref path) => SecretStoreSettings::from_file(path)?,
            None => SecretStoreSettings::default(),
        };

        let mut options = settings.into_options(client);
        if self.store.is_some() {
            options.store = self.store;
        }
        if !self.secrets.is_empty() {
            options.secret_descriptors = Some(self.secrets.into_iter().map(SecretDescriptor::new).collect());
        }
        if !self.delimiters.is_empty() {
            options.key_delimiters = Some(self.delimiters);
        }
        if self.no_normalize {
            options.normalize_key = false;
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut client_config = DaprClientConfig::from_env().with_timeout(Duration::from_secs(cli.timeout));
    if let Some(endpoint) = cli.endpoint {
        client_config.endpoint = endpoint;
    }
    if let Some(token) = cli.api_token {
        client_config = client_config.with_api_token(token);
    }
    let client: Arc<dyn SecretClient> = Arc::new(DaprHttpClient::new(client_config)?);

    match cli.command {
        Commands::Load { store, show_values } => {
            let options = store.into_options(client)?;
            let config = ConfigurationBuilder::new()
                .add_secret_store_with(|opts| *opts = options)?
                .build()
                .await?;

            for (key, value) in config.iter() {
                if show_values {
                    println!("{} = {}", key, value);
                } else {
                    println!("{} = ********", key);
                }
            }

            tracing::info!(keys = config.len(), "Configuration loaded");
        }

        Commands::Get { store, key } => {
            let options = store.into_options(client)?;
            let config = ConfigurationBuilder::new()
                .add_secret_store_with(|opts| *opts = options)?
                .build()
                .await?;

            match config.get(&key) {
                Some(value) => println!("{}", value),
                None => anyhow::bail!("key not found: {}", key),
            }
        }
    }

    Ok(())
}
