use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad device category inferred from upstream type hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "title_case")]
pub enum DeviceKind {
    Gateway,
    Switch,
    AccessPoint,
    Client,
    Unknown,
}

/// Device or client in the normalized schema.
///
/// `id` and `name` are always populated (possibly with fallbacks), so
/// list views never have to deal with missing identity. `online` is only
/// `true` when the upstream explicitly said so; absence of state reads
/// as offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDevice {
    /// Stable identifier: upstream id, else MAC, else empty.
    pub id: String,
    /// Display name: name, else hostname, else "Unknown Device".
    pub name: String,
    pub kind: DeviceKind,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub uptime_secs: Option<u64>,
    /// Which host this device belongs to (cloud multi-site only).
    pub host_name: Option<String>,
    /// Unmodeled upstream fields, passed through for detail views.
    #[serde(default)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl NormalizedDevice {
    /// Whether the normalizer could derive any identity at all.
    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }
}
