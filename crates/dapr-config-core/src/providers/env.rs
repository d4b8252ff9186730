//! Environment Variable Configuration Sources
//!
//! This module provides sources that read configuration from:
//! - Raw process environment variables
//! - `.env` files
//!
//! # Key Naming Convention
//!
//! Environment variable names cannot contain `:`, so hierarchy is written
//! with `__` (double underscore):
//! - `DATABASE__HOST` → `DATABASE:HOST`
//! - With prefix `APP`, only `APP__*` variables are read and the prefix is
//!   stripped: `APP__DATABASE__HOST` → `DATABASE:HOST`
//!
//! Lookups in the built configuration ignore case, so `database:host`
//! finds either.
//!
//! # Example
//!
//! ```rust,ignore
//! use dapr_config_core::providers::{DotEnvSource, EnvSource};
//!
//! let env = EnvSource::with_prefix("APP");
//! let dotenv = DotEnvSource::from_file(".env")?;
//! ```

use super::traits::{ConfigSource, ProviderError, ProviderResult};
use crate::keys::{normalize_key, strip_segments, ConfigMap, DEFAULT_DELIMITER};
use std::path::{Path, PathBuf};

/// Turn `(name, value)` pairs into configuration entries
///
/// Names outside the prefix are skipped; the prefix is removed from the
/// rest and `__` becomes `:`. When two names end up equal ignoring case,
/// the first one seen is kept and the other is logged and dropped.
fn collect_vars<I>(vars: I, prefix: Option<&str>) -> ConfigMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut data = ConfigMap::new();
    for (name, value) in vars {
        let key = match prefix {
            Some(prefix) => match strip_segments(&name, prefix, DEFAULT_DELIMITER) {
                Some(rest) => rest,
                None => continue,
            },
            None => name.as_str(),
        };

        if key.is_empty() {
            continue;
        }
        if let Err(existing) = data.try_insert(normalize_key(key, &[]), value) {
            tracing::warn!(
                variable = %name,
                existing = %existing,
                "Variable collides with an earlier one ignoring case, dropped"
            );
        }
    }
    data
}

/// Source for process environment variables
///
/// The environment is read each time the source is loaded.
#[derive(Debug, Default)]
pub struct EnvSource {
    prefix: Option<String>,
}

impl EnvSource {
    /// Create a source reading every environment variable
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source reading only variables starting with `{prefix}__`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait::async_trait]
impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    async fn load(&self) -> ProviderResult<ConfigMap> {
        // vars_os so that a single non-UTF-8 variable cannot panic the load
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        // Sorted so case-only collisions resolve the same way on every load
        vars.sort();
        Ok(collect_vars(vars, self.prefix.as_deref()))
    }
}

/// Source for `.env` file configuration
///
/// # File Format
///
/// Standard .env format is supported:
/// ```text
/// # Comment
/// KEY=value
/// NAMESPACE__KEY=value
/// QUOTED="value with spaces"
/// MULTILINE="line1\nline2"
/// ```
#[derive(Debug)]
pub struct DotEnvSource {
    path: PathBuf,
    prefix: Option<String>,
}

impl DotEnvSource {
    /// Create a source from a .env file path
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ProviderError::Settings(format!(
                ".env file not found: {}",
                path.display()
            )));
        }

        Ok(Self { path, prefix: None })
    }

    /// Only read entries starting with `{prefix}__`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Parse `.env` content into `(name, value)` pairs
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_string();
            let mut value = value.trim();

            // Remove surrounding quotes
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            let value = value
                .replace("\\n", "\n")
                .replace("\\t", "\t")
                .replace("\\r", "\r");

            vars.push((key, value));
        }
    }

    vars
}

#[async_trait::async_trait]
impl ConfigSource for DotEnvSource {
    fn name(&self) -> &str {
        "dotenv"
    }

    async fn load(&self) -> ProviderResult<ConfigMap> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(collect_vars(parse_dotenv(&content), self.prefix.as_deref()))
    }
}
