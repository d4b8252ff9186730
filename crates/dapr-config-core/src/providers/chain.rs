//! Layered Configuration
//!
//! This module combines configuration sources into a single flat view.
//! Sources are loaded in the order they were registered and merged so that
//! a source registered later overrides earlier ones, key by key.
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::providers::{ConfigurationBuilder, EnvSource, MemorySource};
//!
//! let config = ConfigurationBuilder::new()
//!     .add_source(MemorySource::new([("database:host", "localhost")]))  // Defaults
//!     .add_source(EnvSource::with_prefix("APP"))                         // Overrides
//!     .add_secret_store("vault", client.clone(), None)?                   // Wins
//!     .build()
//!     .await?;
//!
//! let host = config.get("Database:Host");
//! ```

use super::secret_store::SecretStoreSource;
use super::traits::{ConfigSource, ProviderError, ProviderResult};
use crate::client::SecretClient;
use crate::keys::{strip_segments, ConfigMap, KEY_DELIMITER};
use crate::secrets::{SecretDescriptor, SecretStoreOptions};
use std::sync::Arc;

/// Ordered list of configuration sources
///
/// Sources registered later have higher priority.
#[derive(Default)]
pub struct ConfigurationBuilder {
    sources: Vec<Arc<dyn ConfigSource>>,
}

impl std::fmt::Debug for ConfigurationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationBuilder")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl ConfigurationBuilder {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source (builder pattern)
    pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add a secret store source that fetches the given secrets by name
    pub fn add_secret_store_descriptors(
        self,
        store: &str,
        descriptors: Vec<SecretDescriptor>,
        client: Arc<dyn SecretClient>,
        key_delimiters: Option<Vec<String>>,
    ) -> ProviderResult<Self> {
        let source =
            SecretStoreSource::with_descriptors(Some(store), Some(descriptors), Some(client), key_delimiters)?;
        Ok(self.add_source(source))
    }

    /// Add a secret store source that loads the whole store
    pub fn add_secret_store(
        self,
        store: &str,
        client: Arc<dyn SecretClient>,
        key_delimiters: Option<Vec<String>>,
    ) -> ProviderResult<Self> {
        let source = SecretStoreSource::bulk(Some(store), Some(client), key_delimiters)?;
        Ok(self.add_source(source))
    }

    /// Add a secret store source configured through its options
    pub fn add_secret_store_with<F>(self, configure: F) -> ProviderResult<Self>
    where
        F: FnOnce(&mut SecretStoreOptions),
    {
        let source = SecretStoreSource::configure(configure)?;
        Ok(self.add_source(source))
    }

    /// Get the number of sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if no source was added
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Get a list of source names in registration order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Load every source and merge the results
    ///
    /// The first failing source aborts the build.
    pub async fn build(self) -> ProviderResult<Configuration> {
        let mut data = ConfigMap::new();
        let mut names = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let entries = source.load().await.map_err(|e| {
                tracing::error!(source = source.name(), error = %e, "Configuration source failed to load");
                e
            })?;

            tracing::debug!(source = source.name(), keys = entries.len(), "Loaded configuration source");
            data.merge(entries);
            names.push(source.name().to_string());
        }

        Ok(Configuration {
            data,
            sources: names,
        })
    }

    /// Build from synchronous code
    ///
    /// Drives [`build`](Self::build) on a private current-thread runtime.
    /// Must not be called from within an async runtime.
    pub fn build_blocking(self) -> ProviderResult<Configuration> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ProviderError::Runtime(
                "build_blocking called from within an async runtime; use build().await".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.build())
    }
}

/// Merged, read-only configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    data: ConfigMap,
    sources: Vec<String>,
}

impl Configuration {
    /// Look up a value; keys are compared ignoring case
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter()
    }

    /// Names of the loaded sources in registration order
    pub fn source_names(&self) -> &[String] {
        &self.sources
    }

    /// Entries below `section`, with the section prefix removed
    ///
    /// `get_section("database")` maps `database:host` to `host`.
    pub fn get_section(&self, section: &str) -> ConfigMap {
        self.data
            .iter()
            .filter_map(|(key, value)| {
                let rest = strip_segments(key, section, KEY_DELIMITER)?;
                Some((rest.to_string(), value.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemorySecretClient;
    use crate::providers::MemorySource;

    #[derive(Debug)]
    struct FailingSource;

    #[async_trait::async_trait]
    impl ConfigSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self) -> ProviderResult<ConfigMap> {
            Err(ProviderError::DuplicateKey { key: "x".into() })
        }
    }

    #[tokio::test]
    async fn test_empty_builder() {
        let builder = ConfigurationBuilder::new();
        assert!(builder.is_empty());

        let config = builder.build().await.unwrap();
        assert!(config.is_empty());
        assert!(config.source_names().is_empty());
    }

    #[tokio::test]
    async fn test_last_source_wins() {
        let config = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("db:host", "first"), ("db:port", "5432")]))
            .add_source(MemorySource::new([("DB:HOST", "second")]))
            .build()
            .await
            .unwrap();

        assert_eq!(config.get("db:host"), Some("second"));
        assert_eq!(config.get("db:port"), Some("5432"));
        assert_eq!(config.len(), 2);
    }

    #[tokio::test]
    async fn test_secret_store_overrides_defaults() {
        let client = Arc::new(InMemorySecretClient::new().with_value("vault", "db__password", "from-vault"));

        let config = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("db:password", "default"), ("db:user", "app")]))
            .add_secret_store("vault", client, None)
            .unwrap()
            .build()
            .await
            .unwrap();

        assert_eq!(config.get("db:password"), Some("from-vault"));
        assert_eq!(config.get("db:user"), Some("app"));
        assert_eq!(config.source_names(), ["memory".to_string(), "secret-store:vault".to_string()]);
    }

    #[tokio::test]
    async fn test_add_secret_store_descriptors() {
        let client = Arc::new(
            InMemorySecretClient::new()
                .with_value("vault", "api--key", "k")
                .with_value("vault", "unused", "u"),
        );

        let config = ConfigurationBuilder::new()
            .add_secret_store_descriptors("vault", vec!["api--key".into()], client, Some(vec!["--".into()]))
            .unwrap()
            .build()
            .await
            .unwrap();

        assert_eq!(config.get("api:key"), Some("k"));
        assert!(!config.contains_key("unused"));
    }

    #[test]
    fn test_add_secret_store_rejects_bad_arguments() {
        let client: Arc<dyn SecretClient> = Arc::new(InMemorySecretClient::new());

        let err = ConfigurationBuilder::new()
            .add_secret_store("", client.clone(), None)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArgumentValue("store")));

        let err = ConfigurationBuilder::new()
            .add_secret_store_descriptors("vault", vec![], client, None)
            .unwrap_err();
        assert!(matches!(err, ProviderError::EmptyInput));

        let err = ConfigurationBuilder::new()
            .add_secret_store_with(|opts| opts.store = Some("vault".into()))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidArgument("client")));
    }

    #[tokio::test]
    async fn test_failing_source_aborts_build() {
        let result = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("a", "1")]))
            .add_source(FailingSource)
            .build()
            .await;

        assert!(matches!(result, Err(ProviderError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn test_get_section() {
        let config = ConfigurationBuilder::new()
            .add_source(MemorySource::new([
                ("Database:Host", "h"),
                ("database:credentials:user", "u"),
                ("databases:other", "x"),
                ("cache:host", "c"),
            ]))
            .build()
            .await
            .unwrap();

        let section = config.get_section("DATABASE");
        assert_eq!(section.len(), 2);
        assert_eq!(section.get("host"), Some("h"));
        assert_eq!(section.get("credentials:user"), Some("u"));

        let nested = config.get_section("database:CREDENTIALS");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested.get("user"), Some("u"));
    }

    #[tokio::test]
    async fn test_get_section_non_ascii_case() {
        let config = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("İSTANBUL:host", "h"), ("ΣΑΣ:port", "1")]))
            .build()
            .await
            .unwrap();

        assert_eq!(config.get_section("İstanbul").get("host"), Some("h"));
        assert_eq!(config.get_section("σας").get("port"), Some("1"));
    }

    #[test]
    fn test_build_blocking() {
        let config = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("a", "1")]))
            .build_blocking()
            .unwrap();
        assert_eq!(config.get("A"), Some("1"));
    }

    #[tokio::test]
    async fn test_build_blocking_inside_runtime() {
        let result = ConfigurationBuilder::new().build_blocking();
        assert!(matches!(result, Err(ProviderError::Runtime(_))));
    }

    #[test]
    fn test_source_names() {
        let builder = ConfigurationBuilder::new()
            .add_source(MemorySource::new([("a", "1")]))
            .add_source(FailingSource);
        assert_eq!(builder.source_names(), vec!["memory", "failing"]);
        assert_eq!(builder.len(), 2);
    }
}
