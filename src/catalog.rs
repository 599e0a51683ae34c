//! Device type catalog.
//!
//! DESIGN
//! ======
//! The catalog maps a type key (`"router"`, `"switch"`, ...) to the defaults
//! a new device of that type starts from. It is built once at startup from
//! the built-in entries plus any extension file the host loads, then handed
//! to the registry and never mutated again.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid catalog entry `{key}`: {reason}")]
    InvalidEntry { key: String, reason: &'static str },
}

/// Defaults shared by every device of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceType {
    pub name: String,
    pub icon: String,
    pub category: String,
    pub default_ports: u32,
    pub default_layer: String,
}

impl DeviceType {
    fn builtin(name: &str, icon: &str, category: &str, default_ports: u32, default_layer: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            category: category.to_string(),
            default_ports,
            default_layer: default_layer.to_string(),
        }
    }
}

/// Immutable lookup from type key to [`DeviceType`].
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    types: BTreeMap<String, DeviceType>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl DeviceCatalog {
    /// An empty catalog. Every `create_device` against it fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in network device types.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            ("router", DeviceType::builtin("Router", "router", "network", 4, "core")),
            ("switch", DeviceType::builtin("Switch", "switch", "network", 24, "distribution")),
            ("firewall", DeviceType::builtin("Firewall", "shield", "security", 8, "security")),
            ("access_point", DeviceType::builtin("Access Point", "wifi", "network", 1, "access")),
            ("load_balancer", DeviceType::builtin("Load Balancer", "balance", "network", 4, "core")),
            ("server", DeviceType::builtin("Server", "server", "compute", 2, "servers")),
            ("workstation", DeviceType::builtin("Workstation", "desktop", "endpoint", 1, "endpoints")),
            ("laptop", DeviceType::builtin("Laptop", "laptop", "endpoint", 1, "endpoints")),
            ("printer", DeviceType::builtin("Printer", "printer", "endpoint", 1, "endpoints")),
            ("cloud", DeviceType::builtin("Cloud", "cloud", "external", 0, "wan")),
        ];
        let mut catalog = Self::empty();
        for (key, ty) in entries {
            catalog.types.insert(key.to_string(), ty);
        }
        catalog
    }

    /// Merge extra entries from a JSON object of `key -> entry`.
    ///
    /// Entries replace built-ins with the same key. Nothing is merged if any
    /// entry is invalid.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON and `InvalidEntry` for an empty key,
    /// name or layer.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize, CatalogError> {
        let incoming: BTreeMap<String, DeviceType> = serde_json::from_str(json)?;
        for (key, ty) in &incoming {
            validate_entry(key, ty)?;
        }
        let count = incoming.len();
        self.types.extend(incoming);
        Ok(count)
    }

    /// Insert or replace one entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEntry` for an empty key, name or layer.
    pub fn insert(&mut self, key: &str, ty: DeviceType) -> Result<(), CatalogError> {
        validate_entry(key, &ty)?;
        self.types.insert(key.to_string(), ty);
        Ok(())
    }
}

fn validate_entry(key: &str, ty: &DeviceType) -> Result<(), CatalogError> {
    let invalid = |reason| CatalogError::InvalidEntry { key: key.to_string(), reason };
    if key.trim().is_empty() {
        return Err(invalid("empty type key"));
    }
    if ty.name.trim().is_empty() {
        return Err(invalid("empty name"));
    }
    if ty.default_layer.trim().is_empty() {
        return Err(invalid("empty default layer"));
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

impl DeviceCatalog {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DeviceType> {
        self.types.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    /// Type keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Keys of every type in `category`, sorted.
    #[must_use]
    pub fn keys_in_category(&self, category: &str) -> Vec<&str> {
        self.types
            .iter()
            .filter(|(_, ty)| ty.category == category)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
