//! Connection-management collaborator.
//!
//! Connections (edges between devices) are owned outside this crate. The
//! registry only keeps back-references so that deleting a device can ask the
//! owner to drop every edge touching it, and so that moving a device can ask
//! the owner to recompute edge geometry.

use serde::{Deserialize, Serialize};

use crate::doc::{Device, DeviceId};

/// Opaque identifier of a connection owned by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the registry calls on the connection owner.
pub trait ConnectionManager {
    /// Drop one connection. Called once per back-reference during cascade
    /// deletion, before `device` leaves the registry, so its position, type and
    /// properties are still those of the edge's endpoint.
    fn remove_connection(&mut self, id: &ConnectionId, device: &Device);

    /// Recompute the geometry of every edge touching `device`.
    fn update_device_connections(&mut self, device: &DeviceId);
}

/// Collaborator for hosts that do not draw connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconnected;

impl ConnectionManager for Unconnected {
    fn remove_connection(&mut self, id: &ConnectionId, device: &Device) {
        tracing::debug!(connection = %id, device = %device.id, "no connection owner attached");
    }

    fn update_device_connections(&mut self, _device: &DeviceId) {}
}
