//! Dapr Config Core
//!
//! Layered application configuration backed by Dapr secret stores.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── client/           # Secret clients
//! │   ├── mod           # SecretClient trait, in-memory client
//! │   └── http          # Sidecar HTTP API client
//! ├── providers/        # Configuration sources
//! │   ├── traits        # ConfigSource trait, errors
//! │   ├── chain         # Layered configuration builder
//! │   ├── secret_store  # Secret store source
//! │   ├── env           # Environment and .env sources
//! │   └── memory        # Fixed entries
//! ├── keys              # Case-insensitive map, key normalization
//! ├── secrets           # Secret descriptors and store options
//! └── settings          # File-based store settings
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::client::DaprHttpClient;
//! use dapr_config_core::providers::ConfigurationBuilder;
//! use std::sync::Arc;
//!
//! let client = Arc::new(DaprHttpClient::from_env()?);
//! let config = ConfigurationBuilder::new()
//!     .add_secret_store("vault", client, Some(vec!["--".into()]))?
//!     .build()
//!     .await?;
//!
//! let password = config.get("database:password");
//! ```

pub mod client;
pub mod keys;
pub mod providers;
pub mod secrets;
pub mod settings;

pub use client::{DaprClientConfig, DaprHttpClient, InMemorySecretClient, SecretClient, SecretClientError};
pub use keys::{normalize_key, ConfigMap, KEY_DELIMITER};
pub use providers::{
    ConfigSource, Configuration, ConfigurationBuilder, ProviderError, ProviderResult,
    SecretStoreSource,
};
pub use secrets::{SecretDescriptor, SecretStoreOptions};
pub use settings::{SecretStoreSettings, SettingsFormat};
