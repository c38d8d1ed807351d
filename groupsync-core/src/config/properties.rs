//! Group-scoped properties
//!
//! Sync policies and access rules live in a flat property space keyed
//! `<group>.<category>.<leaf>`, e.g. `default.features.sync` or
//! `default.features.blacklist.outbound`. Files are TOML; nested tables
//! flatten into dotted keys and arrays join with commas, so
//!
//! ```toml
//! [default.features]
//! sync = "cluster"
//! blacklist.outbound = ["internal-*"]
//! ```
//!
//! yields `default.features.sync = cluster` and
//! `default.features.blacklist.outbound = internal-*`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use super::error::{ConfigError, ConfigResult};

/// Leaf name of the sync policy property
pub const SYNC: &str = "sync";

/// Separator between key segments
pub const KEY_SEPARATOR: char = '.';

/// Build `<group>.<category>.<leaf>`
pub fn property_key(group: &str, category: &str, leaf: &str) -> String {
    format!("{group}{KEY_SEPARATOR}{category}{KEY_SEPARATOR}{leaf}")
}

/// Read access to externally persisted group properties
///
/// `Ok(None)` means the key is absent, which callers must be able to tell
/// apart from a read failure.
pub trait PropertySource: Send + Sync {
    fn property(&self, key: &str) -> ConfigResult<Option<String>>;
}

/// In-memory property table, optionally loaded from a TOML file
#[derive(Debug, Default)]
pub struct GroupProperties {
    values: RwLock<BTreeMap<String, String>>,
}

impl GroupProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let table: toml::Table =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut values = BTreeMap::new();
        flatten_table("", &table, &mut values);
        Ok(Self {
            values: RwLock::new(values),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Set or replace one property
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> ConfigResult<()> {
        let mut values = self.values.write().map_err(|e| ConfigError::Unavailable(e.to_string()))?;
        values.insert(key.into(), value.into());
        Ok(())
    }

    pub fn remove(&self, key: &str) -> ConfigResult<Option<String>> {
        let mut values = self.values.write().map_err(|e| ConfigError::Unavailable(e.to_string()))?;
        Ok(values.remove(key))
    }

    /// Group names that carry at least one property
    pub fn groups(&self) -> ConfigResult<Vec<String>> {
        let values = self.values.read().map_err(|e| ConfigError::Unavailable(e.to_string()))?;
        let mut groups: Vec<String> = values
            .keys()
            .filter_map(|key| key.split_once(KEY_SEPARATOR).map(|(group, _)| group.to_string()))
            .collect();
        groups.dedup();
        Ok(groups)
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PropertySource for GroupProperties {
    fn property(&self, key: &str) -> ConfigResult<Option<String>> {
        let values = self.values.read().map_err(|e| ConfigError::Unavailable(e.to_string()))?;
        Ok(values.get(key).cloned())
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}{KEY_SEPARATOR}{name}")
        };
        match value {
            toml::Value::Table(nested) => flatten_table(&key, nested, out),
            other => {
                out.insert(key, scalar_text(other));
            }
        }
    }
}

fn scalar_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
