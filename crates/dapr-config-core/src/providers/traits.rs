//! Core traits for configuration sources
//!
//! This module defines the trait every source of the layered configuration
//! implements, and the errors a source can raise while loading.

use crate::client::SecretClientError;
use crate::keys::ConfigMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while building or loading a configuration source
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required argument was not supplied
    #[error("Value cannot be null. {0} argument is null")]
    InvalidArgument(&'static str),

    /// A required string argument was empty or whitespace
    #[error("The value cannot be null or empty. (Parameter '{0}')")]
    InvalidArgumentValue(&'static str),

    /// Descriptor mode was selected with no descriptors
    #[error("No secret descriptor was provided")]
    EmptyInput,

    /// Two secrets normalized to the same configuration key
    #[error("Duplicate secret found for key '{key}'. Please remove any duplicates from your secret store.")]
    DuplicateKey { key: String },

    /// The secret client call failed
    #[error(transparent)]
    Upstream(#[from] SecretClientError),

    /// A settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(String),

    /// I/O error (for file-based settings)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No async runtime could be used to drive the load
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A source of flat configuration entries
///
/// Sources are registered on a [`ConfigurationBuilder`](super::ConfigurationBuilder)
/// in order and loaded once when the configuration is built. A source
/// returns every entry it has with `:`-separated keys; the configuration
/// merges them, later sources overriding earlier ones.
///
/// # Error Handling
///
/// Any error aborts the build. Sources must not return partial results.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Returns a short name for logging
    fn name(&self) -> &str;

    /// Load every entry of this source
    async fn load(&self) -> ProviderResult<ConfigMap>;
}
