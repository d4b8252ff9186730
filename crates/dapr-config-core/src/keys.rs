//! Configuration keys
//!
//! Keys in the layered configuration are hierarchical paths joined with
//! [`KEY_DELIMITER`] (`:`) and compared case-insensitively. This module
//! owns both halves of that convention:
//!
//! - [`ConfigMap`]: an ordered map that folds key case for lookup while
//!   keeping the casing of the most recently inserted key
//! - [`normalize_key`]: rewriting a raw secret-store key's hierarchy
//!   delimiter into the canonical separator
//!
//! # Example
//!
//! ```rust
//! use dapr_config_core::keys::{normalize_key, ConfigMap};
//!
//! let key = normalize_key("database--host", &["--".to_string()]);
//! assert_eq!(key, "database:host");
//!
//! let mut map = ConfigMap::new();
//! map.insert(key, "db.internal");
//! assert_eq!(map.get("DATABASE:HOST"), Some("db.internal"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Canonical hierarchy separator of the layered configuration
pub const KEY_DELIMITER: &str = ":";

/// Delimiter recognized when no configured delimiter matches
pub const DEFAULT_DELIMITER: &str = "__";

/// Rewrite a raw key's hierarchy delimiter to [`KEY_DELIMITER`].
///
/// Delimiters are tried in the order given and the first one that occurs
/// anywhere in the key wins: every occurrence of it is replaced and any
/// other configured delimiter in the same key is left untouched. When no
/// configured delimiter occurs, `__` is replaced instead.
pub fn normalize_key(key: &str, delimiters: &[String]) -> String {
    let matched = delimiters
        .iter()
        .filter(|d| !d.is_empty())
        .find(|d| key.contains(d.as_str()));

    match matched {
        Some(delimiter) => key.replace(delimiter.as_str(), KEY_DELIMITER),
        None => key.replace(DEFAULT_DELIMITER, KEY_DELIMITER),
    }
}

/// Case-fold a key for comparison.
///
/// Each character is uppercased on its own, so the result never depends on
/// the surrounding characters (`σ` and final `ς` both fold to `Σ`).
pub fn fold_case(key: &str) -> String {
    key.chars().flat_map(char::to_uppercase).collect()
}

/// Compare two keys ignoring case
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_uppercase)
        .eq(b.chars().flat_map(char::to_uppercase))
}

/// Remove the leading segments of `key` that match `prefix`, ignoring case.
///
/// Both are split on `delimiter` and compared segment by segment. Returns
/// the remainder after the delimiter that follows the last matched segment,
/// or `None` when the prefix does not match or nothing follows it.
pub fn strip_segments<'a>(key: &'a str, prefix: &str, delimiter: &str) -> Option<&'a str> {
    let wanted: Vec<&str> = prefix.split(delimiter).collect();
    let mut parts = key.splitn(wanted.len() + 1, delimiter);
    for segment in wanted {
        if !eq_ignore_case(parts.next()?, segment) {
            return None;
        }
    }
    parts.next()
}

/// Flat, case-insensitive, ordered key/value map.
///
/// Iteration order is the order of the case-folded keys, which keeps the
/// output of a load byte-for-byte reproducible.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: BTreeMap<String, (String, String)>,
}

impl ConfigMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value, replacing any existing value whose key differs only
    /// by case. The previous value is returned.
    ///
    /// The stored key keeps the casing of the replacing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        self.entries
            .insert(fold_case(&key), (key, value.into()))
            .map(|(_, previous)| previous)
    }

    /// Insert a value only if no key equal under case folding is present.
    ///
    /// Returns the key already stored when the insert is refused.
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), String> {
        use std::collections::btree_map::Entry;

        let key = key.into();
        match self.entries.entry(fold_case(&key)) {
            Entry::Occupied(existing) => Err(existing.get().0.clone()),
            Entry::Vacant(slot) => {
                slot.insert((key, value.into()));
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold_case(key)).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold_case(key))
    }

    /// Keys with their original casing
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of this map; its values win on conflicts
    pub fn merge(&mut self, other: ConfigMap) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }
}

impl fmt::Debug for ConfigMap {
    // Values are usually secrets, only keys are printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoValues<String, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}
