use serde::{Deserialize, Serialize};

use super::device::NormalizedDevice;
use super::{NetworkConfigEntry, PortForwardRule, WirelessNetwork};

/// Aggregate throughput across the WAN uplink, in bits per second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NetworkRates {
    pub download_bps: f64,
    pub upload_bps: f64,
}

/// Controller self-description from the system info endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
    pub temperature_c: Option<f64>,
}

/// Everything the "system" pane shows, collected in one batch.
///
/// The sensitive fields (`dhcp`, `port_forwarding`) are `None` either
/// when the backend does not expose them or when the aggregator redacted
/// them after a session lapse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub info: Option<SystemInfo>,
    pub wifi_networks: Option<Vec<WirelessNetwork>>,
    pub dhcp: Option<Vec<NetworkConfigEntry>>,
    pub port_forwarding: Option<Vec<PortForwardRule>>,
}

/// One complete collection pass over a controller.
///
/// Individual resources that failed to load are simply absent (empty or
/// `None`); a partial result is still a result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    pub devices: Vec<NormalizedDevice>,
    pub clients: Vec<NormalizedDevice>,
    pub network: Option<NetworkRates>,
    pub system: SystemSnapshot,
    /// Resources that failed during the batch, as `(resource, message)`.
    pub failures: Vec<(String, String)>,
}
