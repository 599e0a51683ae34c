//! Boundary validation of well-known device properties.
//!
//! The registry stores properties as an open string map and never inspects
//! them. Values arriving from the host (property editors, imports) are
//! checked here first; unknown keys pass through untouched.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::doc::{Device, DeviceOverrides, DeviceUpdate};

/// Highest usable 802.1Q VLAN id.
const MAX_VLAN: u16 = 4094;

/// Upper bound on a device's port count.
pub const MAX_PORTS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("invalid ip address: {0}")]
    InvalidIp(String),
    #[error("invalid mac address: {0}")]
    InvalidMac(String),
    #[error("invalid vlan id: {0} (expected 1-4094)")]
    InvalidVlan(String),
    #[error("invalid port count: {0} (max 1024)")]
    InvalidPorts(u32),
}

/// Check one property value. Keys other than ip, mac and vlan always pass.
///
/// # Errors
///
/// Returns the matching `PropertyError` for a malformed well-known value.
pub fn validate_property(key: &str, value: &str) -> Result<(), PropertyError> {
    match key {
        "ip" => {
            if value.parse::<IpAddr>().is_err() {
                return Err(PropertyError::InvalidIp(value.to_string()));
            }
        }
        "mac" => {
            if !is_mac(value) {
                return Err(PropertyError::InvalidMac(value.to_string()));
            }
        }
        "vlan" => {
            let valid = value.parse::<u16>().is_ok_and(|id| (1..=MAX_VLAN).contains(&id));
            if !valid {
                return Err(PropertyError::InvalidVlan(value.to_string()));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Check a port count.
///
/// # Errors
///
/// Returns `InvalidPorts` above [`MAX_PORTS`].
pub fn validate_ports(ports: u32) -> Result<(), PropertyError> {
    if ports > MAX_PORTS {
        return Err(PropertyError::InvalidPorts(ports));
    }
    Ok(())
}

/// Check every value in a property map.
///
/// # Errors
///
/// Returns the first failure in key order.
pub fn validate_properties(values: &BTreeMap<String, String>) -> Result<(), PropertyError> {
    for (key, value) in values {
        validate_property(key, value)?;
    }
    Ok(())
}

/// Check the property values carried by a create request.
///
/// # Errors
///
/// Returns the first malformed property or port count.
pub fn validate_overrides(overrides: &DeviceOverrides) -> Result<(), PropertyError> {
    if let Some(ports) = overrides.ports {
        validate_ports(ports)?;
    }
    validate_properties(&overrides.properties)
}

/// Check the property values carried by an update. Removals always pass.
///
/// # Errors
///
/// Returns the first malformed property or port count.
pub fn validate_update(update: &DeviceUpdate) -> Result<(), PropertyError> {
    let Some(ref patch) = update.properties else {
        return Ok(());
    };
    if let Some(ports) = patch.ports {
        validate_ports(ports)?;
    }
    for (key, value) in &patch.values {
        if let Some(v) = value {
            validate_property(key, v)?;
        }
    }
    Ok(())
}

/// Check a stored device record, as arriving from an import.
///
/// # Errors
///
/// Returns the first malformed property or port count.
pub fn validate_device(device: &Device) -> Result<(), PropertyError> {
    validate_ports(device.properties.ports)?;
    validate_properties(&device.properties.values)
}

/// Six hex octets separated consistently by `:` or `-`.
fn is_mac(value: &str) -> bool {
    let sep = if value.contains(':') { ':' } else { '-' };
    let octets: Vec<&str> = value.split(sep).collect();
    octets.len() == 6 && octets.iter().all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}
