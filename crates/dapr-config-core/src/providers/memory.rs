//! In-memory configuration source
//!
//! Holds a fixed set of entries, typically defaults registered before the
//! sources that override them.

use super::traits::{ConfigSource, ProviderResult};
use crate::keys::ConfigMap;

/// Source backed by a fixed set of entries
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: ConfigMap,
}

impl MemorySource {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: entries.into_iter().collect(),
        }
    }

    /// Add an entry (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key, value);
        self
    }
}

#[async_trait::async_trait]
impl ConfigSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> ProviderResult<ConfigMap> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new([("a:b", "1")]).with("C", "2");
        let data = source.load().await.unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.get("A:B"), Some("1"));
        assert_eq!(data.get("c"), Some("2"));
    }
}
