//! Configuration Sources
//!
//! This module provides the layered configuration and the sources that
//! feed it. Every source implements [`ConfigSource`] and returns a flat map
//! of `:`-separated keys; a [`ConfigurationBuilder`] loads the sources in
//! registration order and lets later ones override earlier ones.
//!
//! # Sources
//!
//! - **Secret Store**: secrets from a Dapr secret store, by name or in bulk
//! - **Environment Variables**: raw environment and `.env` files
//! - **Memory**: fixed entries, usually defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::providers::{ConfigurationBuilder, EnvSource};
//!
//! let config = ConfigurationBuilder::new()
//!     .add_source(EnvSource::with_prefix("APP"))
//!     .add_secret_store("vault", client, Some(vec!["--".into()]))?
//!     .build()
//!     .await?;
//!
//! let password = config.get("database:password");
//! ```

pub mod traits;
pub mod chain;
pub mod env;
pub mod memory;
pub mod secret_store;

// Re-export core types
pub use traits::{ConfigSource, ProviderError, ProviderResult};
pub use chain::{Configuration, ConfigurationBuilder};

// Re-export source implementations
pub use env::{DotEnvSource, EnvSource};
pub use memory::MemorySource;
pub use secret_store::SecretStoreSource;
