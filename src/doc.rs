//! Device model and the registry that owns every placed device.
//!
//! This module defines what is on the canvas (`Device`), its open property
//! bag (`DeviceProperties`), the sparse-update types used to create and edit
//! devices (`DeviceOverrides`, `DeviceUpdate`), and the runtime store that
//! owns them (`DeviceRegistry`).
//!
//! The registry knows nothing about screen coordinates. Mutations are
//! recorded as [`DeviceEvent`]s for the controller to forward to the
//! renderer. Spatial queries live in [`crate::hit`].
//!
//! Storage is a dense slot arena plus an id -> slot index: lookup and removal
//! are O(1), iteration follows insertion order, and vacated slots are
//! compacted away once they outnumber live devices.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::camera::{Point, Rect};
use crate::catalog::DeviceCatalog;
use crate::connections::{ConnectionId, ConnectionManager};
use crate::consts::DEVICE_SIZE;

/// Vacated slots tolerated before compaction is considered.
const COMPACT_MIN_SLOTS: usize = 32;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("device not found: {0}")]
    NotFound(DeviceId),
    #[error("unknown device type: {0}")]
    UnknownType(String),
}

/// Unique identifier for a device. Never reused within a registry's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operational status shown on the device badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Open string properties (ip, mac, model, vlan, ...) plus the port count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProperties {
    /// Number of ports on the device.
    #[serde(default)]
    pub ports: u32,
    /// Every other property, keyed by name.
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

impl DeviceProperties {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn ip(&self) -> Option<&str> {
        self.get("ip")
    }

    #[must_use]
    pub fn mac(&self) -> Option<&str> {
        self.get("mac")
    }

    #[must_use]
    pub fn vlan(&self) -> Option<&str> {
        self.get("vlan")
    }
}

/// A placed device as stored in the registry and exchanged on export/import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Key into the device type catalog.
    #[serde(rename = "type")]
    pub device_type: String,
    pub name: String,
    /// Left edge in canvas space.
    pub x: f64,
    /// Top edge in canvas space.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub layer: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub properties: DeviceProperties,
    #[serde(default)]
    pub selected: bool,
    /// Back-references to connections owned by the connection manager.
    #[serde(skip)]
    pub connections: BTreeSet<ConnectionId>,
}

impl Device {
    /// Full body rectangle in canvas space.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Top-left corner in canvas space.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Caller-supplied values that replace type defaults at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOverrides {
    pub name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub layer: Option<String>,
    pub status: Option<DeviceStatus>,
    pub ports: Option<u32>,
    pub properties: BTreeMap<String, String>,
}

/// Property changes merged key by key. `None` removes a key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesPatch {
    pub ports: Option<u32>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<String>>,
}

/// Sparse update for a device. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertiesPatch>,
}

/// Notifications produced by registry mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Created(Device),
    Updated(Device),
    Moved { id: DeviceId, x: f64, y: f64 },
    Removed(DeviceId),
    Selected(Device),
    /// One device left the selection; others may still be selected.
    Deselected(DeviceId),
    SelectionCleared,
    Imported { count: usize },
    Cleared,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Authoritative store of placed devices.
///
/// Every mutation queues a [`DeviceEvent`]. The queue is unbounded: an owner
/// that mutates the registry directly must drain it with
/// [`DeviceRegistry::take_events`] after each batch of calls.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    catalog: DeviceCatalog,
    default_size: f64,
    slots: Vec<Option<Device>>,
    index: HashMap<DeviceId, usize>,
    events: Vec<DeviceEvent>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(DeviceCatalog::builtin())
    }
}

impl DeviceRegistry {
    /// Create an empty registry over `catalog`.
    #[must_use]
    pub fn new(catalog: DeviceCatalog) -> Self {
        Self::with_default_size(catalog, DEVICE_SIZE)
    }

    /// Create an empty registry whose devices default to `size` x `size`.
    #[must_use]
    pub fn with_default_size(catalog: DeviceCatalog, size: f64) -> Self {
        Self { catalog, default_size: size, slots: Vec::new(), index: HashMap::new(), events: Vec::new() }
    }

    #[must_use]
    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// Drain the notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<DeviceEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Lifecycle ---

    /// Place a new device of type `type_key` with its top-left at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if `type_key` is not in the catalog.
    pub fn create_device(
        &mut self,
        type_key: &str,
        x: f64,
        y: f64,
        overrides: DeviceOverrides,
    ) -> Result<Device, RegistryError> {
        let Some(ty) = self.catalog.get(type_key) else {
            warn!(type_key, "create_device with unknown type");
            return Err(RegistryError::UnknownType(type_key.to_string()));
        };

        let mut id = DeviceId::generate();
        while self.index.contains_key(&id) {
            id = DeviceId::generate();
        }

        let device = Device {
            name: overrides.name.unwrap_or_else(|| format!("{}-{}", ty.name, id)),
            device_type: type_key.to_string(),
            x,
            y,
            width: overrides.width.unwrap_or(self.default_size),
            height: overrides.height.unwrap_or(self.default_size),
            layer: overrides.layer.unwrap_or_else(|| ty.default_layer.clone()),
            status: overrides.status.unwrap_or_default(),
            properties: DeviceProperties {
                ports: overrides.ports.unwrap_or(ty.default_ports),
                values: overrides.properties,
            },
            selected: false,
            connections: BTreeSet::new(),
            id,
        };

        debug!(id = %device.id, type_key, "device created");
        self.push(device.clone());
        self.events.push(DeviceEvent::Created(device.clone()));
        Ok(device)
    }

    /// Shallow-merge `update` into a device. Properties merge key by key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn update_device(&mut self, id: &DeviceId, update: &DeviceUpdate) -> Result<Device, RegistryError> {
        let device = self.get_mut(id)?;
        if let Some(ref name) = update.name {
            device.name.clone_from(name);
        }
        if let Some(x) = update.x {
            device.x = x;
        }
        if let Some(y) = update.y {
            device.y = y;
        }
        if let Some(w) = update.width {
            device.width = w;
        }
        if let Some(h) = update.height {
            device.height = h;
        }
        if let Some(ref layer) = update.layer {
            device.layer.clone_from(layer);
        }
        if let Some(status) = update.status {
            device.status = status;
        }
        if let Some(ref patch) = update.properties {
            if let Some(ports) = patch.ports {
                device.properties.ports = ports;
            }
            for (key, value) in &patch.values {
                match value {
                    Some(v) => {
                        device.properties.values.insert(key.clone(), v.clone());
                    }
                    None => {
                        device.properties.values.remove(key);
                    }
                }
            }
        }
        let updated = device.clone();
        self.events.push(DeviceEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Delete a device after asking `connections` to drop every edge it references.
    ///
    /// The cascade runs while the device is still in the store. Removed
    /// connection ids are also stripped from the surviving endpoints.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn remove_device(
        &mut self,
        id: &DeviceId,
        connections: &mut dyn ConnectionManager,
    ) -> Result<Device, RegistryError> {
        let Some(&slot) = self.index.get(id) else {
            debug!(%id, "remove_device on unknown id");
            return Err(RegistryError::NotFound(id.clone()));
        };
        let Some(device) = self.slots[slot].as_ref() else {
            return Err(RegistryError::NotFound(id.clone()));
        };
        // The device is still in the store while its edges are dropped.
        let cascade: Vec<ConnectionId> = device.connections.iter().cloned().collect();
        for conn in &cascade {
            connections.remove_connection(conn, device);
        }
        if !cascade.is_empty() {
            for other in self.slots.iter_mut().flatten() {
                other.connections.retain(|c| !cascade.contains(c));
            }
        }

        self.index.remove(id);
        let Some(mut removed) = self.slots[slot].take() else {
            return Err(RegistryError::NotFound(id.clone()));
        };
        removed.connections.clear();
        self.maybe_compact();

        debug!(%id, cascaded = cascade.len(), "device removed");
        self.events.push(DeviceEvent::Removed(id.clone()));
        Ok(removed)
    }

    /// Move a device's top-left corner and have its edges recomputed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn move_device(
        &mut self,
        id: &DeviceId,
        x: f64,
        y: f64,
        connections: &mut dyn ConnectionManager,
    ) -> Result<(), RegistryError> {
        let device = self.get_mut(id)?;
        device.x = x;
        device.y = y;
        connections.update_device_connections(id);
        self.events.push(DeviceEvent::Moved { id: id.clone(), x, y });
        Ok(())
    }

    /// Empty the store. Connection back-references go with it.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.events.push(DeviceEvent::Cleared);
    }

    // --- Selection ---

    /// Select a device. Without `multi`, every other device is deselected first.
    ///
    /// An unknown id changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn select_device(&mut self, id: &DeviceId, multi: bool) -> Result<Device, RegistryError> {
        if !self.index.contains_key(id) {
            debug!(%id, "select_device on unknown id");
            return Err(RegistryError::NotFound(id.clone()));
        }
        if !multi {
            for device in self.slots.iter_mut().flatten() {
                device.selected = false;
            }
        }
        let device = self.get_mut(id)?;
        device.selected = true;
        let selected = device.clone();
        self.events.push(DeviceEvent::Selected(selected.clone()));
        Ok(selected)
    }

    /// Deselect one device. Returns whether it was selected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn deselect_device(&mut self, id: &DeviceId) -> Result<bool, RegistryError> {
        let device = self.get_mut(id)?;
        let was = std::mem::replace(&mut device.selected, false);
        if was {
            self.events.push(DeviceEvent::Deselected(id.clone()));
        }
        Ok(was)
    }

    /// Deselect everything. Returns how many devices were selected.
    pub fn clear_selection(&mut self) -> usize {
        let mut count = 0;
        for device in self.slots.iter_mut().flatten() {
            if device.selected {
                device.selected = false;
                count += 1;
            }
        }
        if count > 0 {
            self.events.push(DeviceEvent::SelectionCleared);
        }
        count
    }

    /// Select every device. Returns how many devices are now selected.
    pub fn select_all(&mut self) -> usize {
        let ids: Vec<DeviceId> = self.iter().map(|d| d.id.clone()).collect();
        for id in &ids {
            if let Err(e) = self.select_device(id, true) {
                debug!(error = %e, "select_all skipped device");
            }
        }
        ids.len()
    }

    /// Selected devices in insertion order.
    #[must_use]
    pub fn get_selected_devices(&self) -> Vec<&Device> {
        self.iter().filter(|d| d.selected).collect()
    }

    /// Remove every selected device, cascading connections for each.
    ///
    /// Returns the ids that were removed, in insertion order.
    pub fn delete_selected(&mut self, connections: &mut dyn ConnectionManager) -> Vec<DeviceId> {
        let ids: Vec<DeviceId> = self.get_selected_devices().into_iter().map(|d| d.id.clone()).collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.remove_device(&id, connections) {
                Ok(_) => removed.push(id),
                Err(e) => debug!(error = %e, "delete_selected skipped device"),
            }
        }
        removed
    }

    // --- Connection back-references ---

    /// Record that connection `conn` touches device `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn link_connection(&mut self, id: &DeviceId, conn: ConnectionId) -> Result<(), RegistryError> {
        self.get_mut(id)?.connections.insert(conn);
        Ok(())
    }

    /// Forget that connection `conn` touches device `id`. Returns whether it was recorded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is unknown.
    pub fn unlink_connection(&mut self, id: &DeviceId, conn: &ConnectionId) -> Result<bool, RegistryError> {
        Ok(self.get_mut(id)?.connections.remove(conn))
    }

    // --- Export / import ---

    /// Every device in insertion order, with connection references stripped.
    #[must_use]
    pub fn export(&self) -> Vec<Device> {
        self.iter()
            .map(|d| Device { connections: BTreeSet::new(), ..d.clone() })
            .collect()
    }

    /// Replace the store with `devices`. Connection sets start empty.
    ///
    /// A record whose id repeats an earlier record is skipped. Returns the
    /// number of devices stored.
    pub fn import(&mut self, devices: Vec<Device>) -> usize {
        self.slots.clear();
        self.index.clear();
        for mut device in devices {
            if self.index.contains_key(&device.id) {
                warn!(id = %device.id, "import skipped duplicate id");
                continue;
            }
            if !self.catalog.contains(&device.device_type) {
                warn!(id = %device.id, device_type = %device.device_type, "imported device has unknown type");
            }
            device.connections.clear();
            self.push(device);
        }
        let count = self.len();
        self.events.push(DeviceEvent::Imported { count });
        count
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.index.get(id).and_then(|&slot| self.slots[slot].as_ref())
    }

    #[must_use]
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.index.contains_key(id)
    }

    /// Devices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.slots.iter().flatten()
    }

    /// Every device in insertion order.
    #[must_use]
    pub fn get_all_devices(&self) -> Vec<&Device> {
        self.iter().collect()
    }

    /// Number of devices currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the store contains no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // --- Storage ---

    fn get_mut(&mut self, id: &DeviceId) -> Result<&mut Device, RegistryError> {
        self.index
            .get(id)
            .and_then(|&slot| self.slots[slot].as_mut())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    fn push(&mut self, device: Device) {
        self.index.insert(device.id.clone(), self.slots.len());
        self.slots.push(Some(device));
    }

    fn maybe_compact(&mut self) {
        let vacant = self.slots.len() - self.index.len();
        if vacant < COMPACT_MIN_SLOTS || vacant < self.index.len() {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (slot, device) in self.slots.iter().enumerate() {
            if let Some(device) = device {
                self.index.insert(device.id.clone(), slot);
            }
        }
    }
}
