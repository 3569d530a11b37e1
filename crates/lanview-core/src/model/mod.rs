// Domain model: normalized types the UI layer consumes.

pub mod aggregate;
pub mod device;

pub use aggregate::{AggregateResult, NetworkRates, SystemInfo, SystemSnapshot};
pub use device::{DeviceKind, NormalizedDevice};

use serde::{Deserialize, Serialize};

/// Wireless network as shown to the user.
///
/// Networks declared disabled upstream are excluded during conversion,
/// so a value of this type always represents a broadcastable network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirelessNetwork {
    pub id: Option<String>,
    pub ssid: String,
    pub security: Option<String>,
}

/// Network definition including its DHCP scope. Treated as sensitive by
/// the stats aggregator: redacted when the session lapses mid-batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfigEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub purpose: Option<String>,
    pub subnet: Option<String>,
    pub dhcp_enabled: Option<bool>,
    pub dhcp_start: Option<String>,
    pub dhcp_stop: Option<String>,
    pub vlan: Option<i64>,
}

/// Port-forwarding rule. Sensitive: redacted like DHCP data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortForwardRule {
    pub id: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub source: Option<String>,
    pub destination_port: Option<String>,
    pub forward_ip: Option<String>,
    pub forward_port: Option<String>,
    pub protocol: Option<String>,
}
