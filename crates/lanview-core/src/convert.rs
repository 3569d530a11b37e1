// ── Upstream-to-domain conversion ──
//
// Pure functions mapping api-layer response types into the normalized
// model. All fallback and identity-resolution policy lives here, so the
// facade and aggregator stay mechanical.

use chrono::{DateTime, TimeZone, Utc};

use lanview_api::cloud::models::CloudDevice;
use lanview_api::local::models::{
    HealthSubsystem, LinkLayerIdentity, LocalClientEntry, LocalDevice, LocalNetworkConf,
    LocalPortForward, LocalSysInfo, LocalWlan,
};

use crate::model::{
    DeviceKind, NetworkConfigEntry, NetworkRates, NormalizedDevice, PortForwardRule, SystemInfo,
    WirelessNetwork,
};

/// Fallback display name when the upstream offers neither a name nor a
/// hostname.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

// ── Identity resolution ─────────────────────────────────────────────

/// Strict MAC-address shape check: six hex octet pairs separated by `:`
/// or `-`. Deliberately stricter than the upstream's own "type" hints,
/// which have been observed lying.
pub(crate) fn is_mac(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 17 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        if i % 3 == 2 {
            if *b != b':' && *b != b'-' {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }
    true
}

/// Extract a MAC from a nested identity record. The value is accepted
/// when the declared type says "mac" or when the value itself has a
/// strict MAC shape; a non-MAC value under a non-"mac" type is ignored.
fn identity_mac(identity: Option<&LinkLayerIdentity>) -> Option<String> {
    let identity = identity?;
    let value = identity.value.as_deref()?;
    if value.is_empty() {
        return None;
    }
    let declared_mac = identity
        .kind
        .as_deref()
        .is_some_and(|k| k.eq_ignore_ascii_case("mac"));
    if declared_mac || is_mac(value) {
        Some(value.to_owned())
    } else {
        None
    }
}

/// Resolve `(id, mac)` with the shared priority order: explicit id wins
/// for identity, explicit MAC is next, then the nested identity record.
/// An unresolvable id becomes the empty string, never a synthetic value.
fn resolve_identity(
    id: Option<&str>,
    mac: Option<&str>,
    identity: Option<&LinkLayerIdentity>,
) -> (String, Option<String>) {
    let mac = mac
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
        .or_else(|| identity_mac(identity));
    let id = id
        .filter(|i| !i.is_empty())
        .map(str::to_owned)
        .or_else(|| mac.clone())
        .unwrap_or_default();
    (id, mac)
}

fn display_name(name: Option<&str>, hostname: Option<&str>) -> String {
    name.filter(|n| !n.is_empty())
        .or(hostname.filter(|h| !h.is_empty()))
        .unwrap_or(UNKNOWN_DEVICE_NAME)
        .to_owned()
}

fn kind_from_hint(hint: Option<&str>) -> DeviceKind {
    match hint.map(str::to_ascii_lowercase).as_deref() {
        Some("ugw" | "udm" | "uxg" | "gateway" | "gateways") => DeviceKind::Gateway,
        Some("usw" | "switch" | "switches") => DeviceKind::Switch,
        Some("uap" | "ap" | "wifi") => DeviceKind::AccessPoint,
        _ => DeviceKind::Unknown,
    }
}

fn epoch_secs(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.and_then(|t| Utc.timestamp_opt(t, 0).single())
}

fn uptime_secs(uptime: Option<i64>) -> Option<u64> {
    uptime.and_then(|u| u64::try_from(u).ok())
}

// ── Devices and clients ─────────────────────────────────────────────

pub(crate) fn device_from_local(d: &LocalDevice) -> NormalizedDevice {
    let (id, mac) = resolve_identity(d.id.as_deref(), d.mac.as_deref(), d.identity.as_ref());
    NormalizedDevice {
        id,
        name: display_name(d.name.as_deref(), d.hostname.as_deref()),
        kind: kind_from_hint(d.device_type.as_deref()),
        mac,
        ip: d.ip.clone(),
        model: d.model.clone(),
        firmware_version: d.version.clone(),
        // Only state 1 means online; pending/upgrading/absent all read
        // as offline.
        online: d.state == Some(1),
        last_seen: epoch_secs(d.last_seen),
        uptime_secs: uptime_secs(d.uptime),
        host_name: None,
        raw: d.extra.clone(),
    }
}

pub(crate) fn client_from_local(c: &LocalClientEntry) -> NormalizedDevice {
    let (id, mac) = resolve_identity(c.id.as_deref(), c.mac.as_deref(), c.identity.as_ref());
    NormalizedDevice {
        id,
        name: display_name(c.name.as_deref(), c.hostname.as_deref()),
        kind: DeviceKind::Client,
        mac,
        ip: c.ip.clone(),
        model: None,
        firmware_version: None,
        // Presence in `stat/sta` means the client is currently
        // associated, but only an explicit wired/last-seen signal is
        // authoritative; the list endpoint itself returns active
        // clients, so presence counts as online.
        online: true,
        last_seen: epoch_secs(c.last_seen),
        uptime_secs: None,
        host_name: None,
        raw: c.extra.clone(),
    }
}

pub(crate) fn device_from_cloud(d: &CloudDevice, host_name: Option<&str>) -> NormalizedDevice {
    let (id, mac) = resolve_identity(d.id.as_deref(), d.mac.as_deref(), d.identity.as_ref());
    NormalizedDevice {
        id,
        name: display_name(d.name.as_deref(), d.hostname.as_deref()),
        kind: kind_from_hint(d.product_line.as_deref()),
        mac,
        ip: d.ip.clone(),
        model: d.model.clone(),
        firmware_version: d.firmware_version.clone(),
        online: d.status.as_deref() == Some("connected"),
        last_seen: d
            .updated_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc)),
        uptime_secs: None,
        host_name: host_name.map(str::to_owned),
        raw: d.extra.clone(),
    }
}

// ── System resources ────────────────────────────────────────────────

/// Convert a WLAN record, or drop it.
///
/// Explicitly disabled networks are excluded; an absent `enabled` flag
/// is treated as enabled. The SSID falls back to `name`, then to the id
/// unless the id looks like a MAC address (some firmware fills the ssid
/// slot with the BSSID, which is useless as a display label).
pub(crate) fn wlan_from_local(w: &LocalWlan) -> Option<WirelessNetwork> {
    if w.enabled == Some(false) {
        return None;
    }
    let ssid = w
        .ssid
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(w.name.as_deref().filter(|n| !n.is_empty()))
        .or(w.id.as_deref().filter(|i| !i.is_empty() && !is_mac(i)))?;
    Some(WirelessNetwork {
        id: w.id.clone(),
        ssid: ssid.to_owned(),
        security: w.security.clone(),
    })
}

pub(crate) fn network_conf_from_local(n: &LocalNetworkConf) -> NetworkConfigEntry {
    NetworkConfigEntry {
        id: n.id.clone(),
        name: n.name.clone(),
        purpose: n.purpose.clone(),
        subnet: n.ip_subnet.clone(),
        dhcp_enabled: n.dhcp_enabled,
        dhcp_start: n.dhcp_start.clone(),
        dhcp_stop: n.dhcp_stop.clone(),
        vlan: n.vlan,
    }
}

pub(crate) fn port_forward_from_local(p: &LocalPortForward) -> PortForwardRule {
    PortForwardRule {
        id: p.id.clone(),
        name: p.name.clone(),
        enabled: p.enabled,
        source: p.src.clone(),
        destination_port: p.dst_port.clone(),
        forward_ip: p.fwd.clone(),
        forward_port: p.fwd_port.clone(),
        protocol: p.proto.clone(),
    }
}

/// WAN throughput from the health subsystem list. The upstream reports
/// bytes/sec; the model carries bits/sec.
pub(crate) fn rates_from_health(subsystems: &[HealthSubsystem]) -> Option<NetworkRates> {
    let wan = subsystems
        .iter()
        .find(|s| s.subsystem.as_deref() == Some("wan"))?;
    match (wan.rx_bytes_rate, wan.tx_bytes_rate) {
        (None, None) => None,
        (rx, tx) => Some(NetworkRates {
            download_bps: rx.unwrap_or(0.0) * 8.0,
            upload_bps: tx.unwrap_or(0.0) * 8.0,
        }),
    }
}

pub(crate) fn system_info_from_local(s: &LocalSysInfo) -> SystemInfo {
    SystemInfo {
        name: s.name.clone(),
        version: s.version.clone(),
        uptime_secs: uptime_secs(s.uptime),
        temperature_c: s.temperature,
    }
}
