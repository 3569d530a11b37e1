// Local API response types
//
// Models for the local controller's JSON API. Fields use
// `#[serde(default)]` liberally because the API is inconsistent about
// field presence across firmware versions; everything unmodeled lands in
// the `extra` catch-all so normalization can still probe it.

use serde::{Deserialize, Serialize};

/// Nested link-layer identity some firmware attaches instead of a flat
/// `mac` field: `{ "type": "mac", "value": "aa:bb:..." }`. The declared
/// type is not trustworthy on its own, so consumers also validate the
/// value shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkLayerIdentity {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Network device from `stat/device`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalDevice {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub identity: Option<LinkLayerIdentity>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// 0=offline, 1=online, 2=pending, 4=upgrading, 5=provisioning
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub last_seen: Option<i64>,
    #[serde(default)]
    pub uptime: Option<i64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Connected client (station) from `stat/sta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClientEntry {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub identity: Option<LinkLayerIdentity>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub is_wired: Option<bool>,
    #[serde(default)]
    pub last_seen: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wireless network definition from `rest/wlanconf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalWlan {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub security: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Network definition (including DHCP scope) from `rest/networkconf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalNetworkConf {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub ip_subnet: Option<String>,
    #[serde(default, rename = "dhcpd_enabled")]
    pub dhcp_enabled: Option<bool>,
    #[serde(default, rename = "dhcpd_start")]
    pub dhcp_start: Option<String>,
    #[serde(default, rename = "dhcpd_stop")]
    pub dhcp_stop: Option<String>,
    #[serde(default)]
    pub vlan: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Port-forwarding rule from `rest/portforward`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalPortForward {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub dst_port: Option<String>,
    #[serde(default)]
    pub fwd: Option<String>,
    #[serde(default)]
    pub fwd_port: Option<String>,
    #[serde(default)]
    pub proto: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Health subsystem record from `stat/health` (one per subsystem:
/// `wan`, `www`, `wlan`, `lan`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSubsystem {
    #[serde(default)]
    pub subsystem: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Current WAN receive rate, bytes/sec.
    #[serde(default, rename = "rx_bytes-r")]
    pub rx_bytes_rate: Option<f64>,
    /// Current WAN transmit rate, bytes/sec.
    #[serde(default, rename = "tx_bytes-r")]
    pub tx_bytes_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Controller system information from `stat/sysinfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSysInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uptime: Option<i64>,
    /// Gateway CPU temperature when reported by the hardware.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
