//! Secret Store Configuration Source
//!
//! Loads secrets from a Dapr secret store into the layered configuration.
//!
//! # Modes
//!
//! - **Descriptor mode**: one `get_secret` call per [`SecretDescriptor`].
//!   The calls run concurrently and their results are merged in descriptor
//!   order.
//! - **Bulk mode**: a single `get_bulk_secret` call. The store's own secret
//!   names (the outer keys of the response) are dropped; only the inner
//!   key/value pairs become configuration entries.
//!
//! # Key Normalization
//!
//! Secret stores often cannot hold `:` in names, so hierarchy is encoded
//! with another delimiter. With normalization enabled (the default), the
//! first configured delimiter found in a key is replaced by `:`; when none
//! matches, `__` is. See [`normalize_key`].
//!
//! # Duplicates
//!
//! Two entries that end up under the same key, ignoring case, fail the
//! whole load. Nothing is overwritten silently.
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::providers::SecretStoreSource;
//!
//! let source = SecretStoreSource::configure(|opts| {
//!     opts.store = Some("vault".into());
//!     opts.client = Some(client.clone());
//!     opts.key_delimiters = Some(vec!["--".into()]);
//! })?;
//! let entries = source.load().await?;
//! ```

use super::traits::{ConfigSource, ProviderError, ProviderResult};
use crate::client::{Metadata, SecretClient, SecretMap};
use crate::keys::{normalize_key, ConfigMap};
use crate::secrets::{SecretDescriptor, SecretStoreOptions};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum LoadMode {
    Descriptors(Vec<SecretDescriptor>),
    Bulk,
}

impl LoadMode {
    fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Descriptors(_) => "descriptors",
            LoadMode::Bulk => "bulk",
        }
    }
}

/// Configuration source backed by a Dapr secret store
///
/// All argument checks happen on construction; [`load`](ConfigSource::load)
/// only fails on client errors and duplicate keys.
pub struct SecretStoreSource {
    name: String,
    store: String,
    client: Arc<dyn SecretClient>,
    mode: LoadMode,
    key_delimiters: Vec<String>,
    normalize_key: bool,
    metadata: Metadata,
}

impl fmt::Debug for SecretStoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStoreSource")
            .field("store", &self.store)
            .field("mode", &self.mode.as_str())
            .field("key_delimiters", &self.key_delimiters)
            .field("normalize_key", &self.normalize_key)
            .finish()
    }
}

impl SecretStoreSource {
    /// Create a source from options
    ///
    /// Bulk mode is selected when `secret_descriptors` is `None`.
    pub fn from_options(options: SecretStoreOptions) -> ProviderResult<Self> {
        Self::build(options, false)
    }

    /// Create a source by filling in a default [`SecretStoreOptions`]
    pub fn configure<F>(configure: F) -> ProviderResult<Self>
    where
        F: FnOnce(&mut SecretStoreOptions),
    {
        let mut options = SecretStoreOptions::default();
        configure(&mut options);
        Self::from_options(options)
    }

    /// Create a source that fetches the given secrets by name
    ///
    /// Unlike [`from_options`](Self::from_options), missing descriptors are
    /// an error here rather than a switch to bulk mode.
    pub fn with_descriptors(
        store: Option<&str>,
        descriptors: Option<Vec<SecretDescriptor>>,
        client: Option<Arc<dyn SecretClient>>,
        key_delimiters: Option<Vec<String>>,
    ) -> ProviderResult<Self> {
        let options = SecretStoreOptions {
            store: store.map(str::to_string),
            client,
            secret_descriptors: descriptors,
            key_delimiters,
            ..Default::default()
        };
        Self::build(options, true)
    }

    /// Create a source that fetches every secret of the store
    pub fn bulk(
        store: Option<&str>,
        client: Option<Arc<dyn SecretClient>>,
        key_delimiters: Option<Vec<String>>,
    ) -> ProviderResult<Self> {
        let options = SecretStoreOptions {
            store: store.map(str::to_string),
            client,
            key_delimiters,
            ..Default::default()
        };
        Self::build(options, false)
    }

    fn build(options: SecretStoreOptions, require_descriptors: bool) -> ProviderResult<Self> {
        let store = options.store.ok_or(ProviderError::InvalidArgument("store"))?;
        if store.trim().is_empty() {
            return Err(ProviderError::InvalidArgumentValue("store"));
        }

        if require_descriptors && options.secret_descriptors.is_none() {
            return Err(ProviderError::InvalidArgument("secret_descriptors"));
        }

        let client = options.client.ok_or(ProviderError::InvalidArgument("client"))?;

        let mode = match options.secret_descriptors {
            None => LoadMode::Bulk,
            Some(descriptors) if descriptors.is_empty() => return Err(ProviderError::EmptyInput),
            Some(descriptors) => {
                if descriptors.iter().any(|d| d.name().trim().is_empty()) {
                    return Err(ProviderError::InvalidArgumentValue("secret_descriptors"));
                }
                LoadMode::Descriptors(descriptors)
            }
        };

        Ok(Self {
            name: format!("secret-store:{}", store),
            store,
            client,
            mode,
            key_delimiters: options.key_delimiters.unwrap_or_default(),
            normalize_key: options.normalize_key,
            metadata: options.metadata,
        })
    }

    /// Name of the secret store component
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Whether the source fetches everything in one bulk call
    pub fn is_bulk(&self) -> bool {
        matches!(self.mode, LoadMode::Bulk)
    }

    async fn fetch_descriptors(
        &self,
        descriptors: &[SecretDescriptor],
    ) -> ProviderResult<Vec<(String, String)>> {
        let fetches = descriptors.iter().map(|descriptor| async move {
            match self
                .client
                .get_secret(&self.store, descriptor.name(), descriptor.metadata())
                .await
            {
                Ok(secret) => Ok(Some(secret)),
                Err(e) if e.is_not_found() && !descriptor.is_required() => {
                    tracing::warn!(
                        store = %self.store,
                        secret = descriptor.name(),
                        "Optional secret not found, skipping"
                    );
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        });

        let results = futures::future::try_join_all(fetches).await?;

        let mut entries = Vec::new();
        for (descriptor, secret) in descriptors.iter().zip(results) {
            let Some(secret) = secret else { continue };
            for (raw_key, value) in sorted(secret) {
                entries.push((descriptor.output_key(&raw_key).to_string(), value));
            }
        }
        Ok(entries)
    }

    async fn fetch_bulk(&self) -> ProviderResult<Vec<(String, String)>> {
        let bulk = self.client.get_bulk_secret(&self.store, &self.metadata).await?;

        // Outer keys only order the merge; they never reach the output
        let ordered: BTreeMap<String, SecretMap> = bulk.into_iter().collect();
        Ok(ordered.into_values().flat_map(sorted).collect())
    }
}

fn sorted(secret: SecretMap) -> impl Iterator<Item = (String, String)> {
    secret.into_iter().collect::<BTreeMap<_, _>>().into_iter()
}

#[async_trait::async_trait]
impl ConfigSource for SecretStoreSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> ProviderResult<ConfigMap> {
        tracing::debug!(
            store = %self.store,
            mode = self.mode.as_str(),
            normalize_key = self.normalize_key,
            "Loading secrets"
        );

        let entries = match &self.mode {
            LoadMode::Descriptors(descriptors) => self.fetch_descriptors(descriptors).await?,
            LoadMode::Bulk => self.fetch_bulk().await?,
        };

        let mut data = ConfigMap::new();
        for (raw_key, value) in entries {
            let key = if self.normalize_key {
                normalize_key(&raw_key, &self.key_delimiters)
            } else {
                raw_key
            };

            if let Err(existing) = data.try_insert(key.clone(), value) {
                tracing::error!(
                    store = %self.store,
                    key = %key,
                    existing = %existing,
                    "Duplicate secret key"
                );
                return Err(ProviderError::DuplicateKey { key });
            }
        }

        tracing::info!(
            store = %self.store,
            mode = self.mode.as_str(),
            keys = data.len(),
            "Loaded secrets"
        );
        Ok(data)
    }
}
