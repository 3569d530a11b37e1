// Cloud API response types
//
// The cloud service wraps payloads in a bare `{ "data": [...] }` envelope
// (stripped by the executor). Shapes differ from the local API: device
// state is a string, and devices arrive grouped per host.

use serde::{Deserialize, Serialize};

use crate::local::models::LinkLayerIdentity;

/// Logical site from `ea/sites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSite {
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub meta: Option<CloudSiteMeta>,
    /// Aggregate counters the cloud attaches per site (device totals,
    /// WAN throughput percentiles, ...). Loosely typed by design.
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSiteMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Per-host device grouping from `ea/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDeviceGroup {
    #[serde(default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub devices: Vec<CloudDevice>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Device record from the cloud API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDevice {
    #[serde(default)]
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
    pub model: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    /// Connection state as a string: `"connected"` / `"offline"` / ...
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub product_line: Option<String>,
    /// RFC 3339 timestamp of the last status change.
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
