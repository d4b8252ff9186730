//! File-based secret-store settings
//!
//! Everything in [`SecretStoreOptions`] except the client can be kept in a
//! settings file. The format is picked from the file extension:
//!
//! ```toml
//! store = "vault"
//! key_delimiters = ["--"]
//!
//! [[secret_descriptors]]
//! name = "db"
//! aliases = ["database"]
//! ```

use crate::client::{Metadata, SecretClient};
use crate::providers::{ProviderError, ProviderResult};
use crate::secrets::{SecretDescriptor, SecretStoreOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Serialized form of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
    Yaml,
}

impl SettingsFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(SettingsFormat::Json),
            "toml" => Some(SettingsFormat::Toml),
            "yaml" | "yml" => Some(SettingsFormat::Yaml),
            _ => None,
        }
    }
}

/// Secret-store settings without the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretStoreSettings {
    pub store: Option<String>,
    pub secret_descriptors: Option<Vec<SecretDescriptor>>,
    pub key_delimiters: Option<Vec<String>>,
    pub normalize_key: bool,
    pub metadata: Metadata,
}

impl Default for SecretStoreSettings {
    fn default() -> Self {
        Self {
            store: None,
            secret_descriptors: None,
            key_delimiters: None,
            normalize_key: true,
            metadata: Metadata::new(),
        }
    }
}

impl SecretStoreSettings {
    /// Read settings from a JSON, TOML, or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path).ok_or_else(|| {
            ProviderError::Settings(format!(
                "cannot infer settings format of {}",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse settings from a string
    pub fn parse(content: &str, format: SettingsFormat) -> ProviderResult<Self> {
        let parsed: Self = match format {
            SettingsFormat::Json => {
                serde_json::from_str(content).map_err(|e| ProviderError::Settings(e.to_string()))
            }
            SettingsFormat::Toml => {
                toml::from_str(content).map_err(|e| ProviderError::Settings(e.to_string()))
            }
            SettingsFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ProviderError::Settings(e.to_string()))
            }
        }?;

        tracing::debug!(format = ?format, "Parsed secret store settings");
        Ok(parsed)
    }

    /// Attach a client, producing source options
    pub fn into_options(self, client: Arc<dyn SecretClient>) -> SecretStoreOptions {
        SecretStoreOptions {
            store: self.store,
            client: Some(client),
            secret_descriptors: self.secret_descriptors,
            key_delimiters: self.key_delimiters,
            normalize_key: self.normalize_key,
            metadata: self.metadata,
        }
    }
}
