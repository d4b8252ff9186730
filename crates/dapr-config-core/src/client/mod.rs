//! Secret clients
//!
//! A [`SecretClient`] is the seam between the configuration provider and
//! whatever actually talks to the Dapr sidecar. The provider only needs the
//! two read operations of the secrets building block:
//!
//! - `get_secret(store, key)`: one logical secret, which the store may fan
//!   out into several key/value pairs
//! - `get_bulk_secret(store)`: every secret in the store, keyed by a
//!   store-internal name
//!
//! Two implementations ship with the crate: [`DaprHttpClient`] for a running
//! sidecar and [`InMemorySecretClient`] for local development and tests.

pub mod http;

pub use http::{DaprClientConfig, DaprHttpClient};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Key/value pairs of one logical secret
pub type SecretMap = HashMap<String, String>;

/// Every secret of a store, keyed by the store's own secret name
pub type BulkSecretMap = HashMap<String, SecretMap>;

/// Request metadata forwarded to the secret store component
pub type Metadata = HashMap<String, String>;

/// Errors raised by a secret client
#[derive(Error, Debug)]
pub enum SecretClientError {
    /// The store or the key does not exist
    #[error("Secret not found: {store}/{key}")]
    NotFound { store: String, key: String },

    /// The sidecar could not be reached
    #[error("Secret store unavailable: {0}")]
    Unavailable(String),

    /// The request failed in flight (timeout, reset, protocol error)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The sidecar or the store rejected the caller
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other non-success response from the sidecar
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SecretClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretClientError::NotFound { .. })
    }
}

/// Result type for secret client operations
pub type ClientResult<T> = Result<T, SecretClientError>;

/// Read access to a Dapr secret store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SecretClient: Send + Sync + fmt::Debug {
    /// Fetch one logical secret
    async fn get_secret(
        &self,
        store: &str,
        key: &str,
        metadata: &Metadata,
    ) -> ClientResult<SecretMap>;

    /// Fetch every secret in the store
    async fn get_bulk_secret(&self, store: &str, metadata: &Metadata) -> ClientResult<BulkSecretMap>;
}

/// Secret client backed by a fixed set of secrets
///
/// Stores are keyed by name; each store holds secrets by name, each secret
/// holding its key/value pairs. Every call is counted so callers can check
/// how often the store was hit.
#[derive(Default)]
pub struct InMemorySecretClient {
    stores: BTreeMap<String, BTreeMap<String, SecretMap>>,
    calls: AtomicUsize,
}

impl fmt::Debug for InMemorySecretClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySecretClient")
            .field("stores", &self.stores.keys().collect::<Vec<_>>())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl InMemorySecretClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret made of several key/value pairs (builder pattern)
    pub fn with_secret<I, K, V>(mut self, store: &str, name: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.stores
            .entry(store.to_string())
            .or_default()
            .insert(name.to_string(), pairs);
        self
    }

    /// Add a secret whose single key is its own name
    pub fn with_value(self, store: &str, name: &str, value: &str) -> Self {
        self.with_secret(store, name, [(name, value)])
    }

    /// Number of client calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn store(&self, store: &str) -> ClientResult<&BTreeMap<String, SecretMap>> {
        self.stores.get(store).ok_or_else(|| SecretClientError::NotFound {
            store: store.to_string(),
            key: String::new(),
        })
    }
}

#[async_trait::async_trait]
impl SecretClient for InMemorySecretClient {
    async fn get_secret(
        &self,
        store: &str,
        key: &str,
        _metadata: &Metadata,
    ) -> ClientResult<SecretMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.store(store)?
            .get(key)
            .cloned()
            .ok_or_else(|| SecretClientError::NotFound {
                store: store.to_string(),
                key: key.to_string(),
            })
    }

    async fn get_bulk_secret(&self, store: &str, _metadata: &Metadata) -> ClientResult<BulkSecretMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .store(store)?
            .iter()
            .map(|(name, pairs)| (name.clone(), pairs.clone()))
            .collect())
    }
}
