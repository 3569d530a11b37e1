//! Normalized controller surface between `lanview-api` and UI consumers.
//!
//! This crate owns the domain model and the two public entry points:
//!
//! - **[`Controller`]** — facade over the divergent local/cloud upstream
//!   protocols. Routes each operation to the configured backend and
//!   reshapes the responses into one normalized schema.
//! - **[`StatsAggregator`]** — concurrent fan-out/fan-in over the facade
//!   with single-flight deduplication, per-resource failure tolerance,
//!   sensitive-field redaction when the session lapses mid-batch, and an
//!   optional background keep-alive for local deployments.
//!
//! Construction starts from a [`ConnectionConfig`]; replacing the config
//! means constructing a new `Controller`, which invalidates any session.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod stats;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, ConnectionMode, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use stats::{KeepAliveHandle, StatsAggregator};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AggregateResult, DeviceKind, NetworkConfigEntry, NetworkRates, NormalizedDevice,
    PortForwardRule, SystemInfo, SystemSnapshot, WirelessNetwork,
};
