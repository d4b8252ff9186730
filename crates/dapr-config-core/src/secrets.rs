//! Secret descriptors and secret-store options
//!
//! [`SecretDescriptor`] names one secret to fetch individually.
//! [`SecretStoreOptions`] is the configuration bag handed to
//! [`SecretStoreSource`](crate::providers::SecretStoreSource); leaving
//! `secret_descriptors` unset selects bulk mode.

use crate::client::{Metadata, SecretClient};
use crate::keys::eq_ignore_case;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_required() -> bool {
    true
}

/// One secret to fetch by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDescriptor {
    name: String,

    /// Output key names; the first one replaces `name` in the result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,

    #[serde(default = "default_required")]
    is_required: bool,
}

impl SecretDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            metadata: Metadata::new(),
            is_required: true,
        }
    }

    /// Add an alternate output key (builder pattern)
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add request metadata forwarded to the store (builder pattern)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Skip this secret instead of failing when the store does not have it
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Key under which a raw key returned for this secret is published.
    ///
    /// A raw key equal to the secret's own name (ignoring case) is remapped
    /// to the first alias; every other key is kept.
    pub fn output_key<'a>(&'a self, raw_key: &'a str) -> &'a str {
        match self.aliases.first() {
            Some(alias) if eq_ignore_case(raw_key, &self.name) => alias,
            _ => raw_key,
        }
    }
}

impl From<&str> for SecretDescriptor {
    fn from(name: &str) -> Self {
        SecretDescriptor::new(name)
    }
}

/// Options for a secret-store configuration source
///
/// Argument fields are optional so that a missing store or client is
/// reported by the source's constructor rather than being unrepresentable.
#[derive(Debug, Clone)]
pub struct SecretStoreOptions {
    /// Secret store component name (required)
    pub store: Option<String>,
    /// Client used to reach the store (required)
    pub client: Option<Arc<dyn SecretClient>>,
    /// Secrets to fetch by name; `None` selects bulk mode
    pub secret_descriptors: Option<Vec<SecretDescriptor>>,
    /// Hierarchy delimiters recognized in raw keys, in priority order
    pub key_delimiters: Option<Vec<String>>,
    /// Rewrite raw keys to `:`-separated keys (default: true)
    pub normalize_key: bool,
    /// Metadata forwarded to the bulk request
    pub metadata: Metadata,
}

impl Default for SecretStoreOptions {
    fn default() -> Self {
        Self {
            store: None,
            client: None,
            secret_descriptors: None,
            key_delimiters: None,
            normalize_key: true,
            metadata: Metadata::new(),
        }
    }
}

impl SecretStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn SecretClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn secret_descriptors<I, D>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<SecretDescriptor>,
    {
        self.secret_descriptors = Some(descriptors.into_iter().map(Into::into).collect());
        self
    }

    pub fn key_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_delimiters = Some(delimiters.into_iter().map(Into::into).collect());
        self
    }

    pub fn normalize_key(mut self, normalize: bool) -> Self {
        self.normalize_key = normalize;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
