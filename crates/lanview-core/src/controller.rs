// ── Controller facade ──
//
// One entry point over the two upstream protocol families. Each
// operation routes to the configured backend, converts the response into
// the normalized model, and reports capability gaps as typed
// `Unsupported` errors instead of empty results.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use lanview_api::{CloudClient, LocalClient, SessionManager};

use crate::config::{ConnectionConfig, ConnectionMode};
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    NetworkConfigEntry, NetworkRates, NormalizedDevice, PortForwardRule, SystemInfo,
    WirelessNetwork,
};

enum Backend {
    Local(LocalClient),
    Cloud(CloudClient),
}

struct ControllerInner {
    mode: ConnectionMode,
    session: SessionManager,
    backend: Backend,
}

/// Facade over one controller connection.
///
/// Cheaply cloneable; clones share the session and HTTP client.
/// Operations the active backend cannot serve fail with
/// [`CoreError::Unsupported`] naming what would be required, so callers
/// can distinguish "no data" from "wrong connection type".
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl Controller {
    /// Build a controller from a validated connection configuration.
    ///
    /// Construction is offline: no network traffic until the first
    /// operation or an explicit [`Controller::login`].
    pub fn new(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let mode = config.effective_mode();
        let session = SessionManager::new(config.session_config()?, &config.transport_config())?;
        let backend = match mode {
            ConnectionMode::Local => Backend::Local(LocalClient::new(session.clone())),
            ConnectionMode::Cloud => Backend::Cloud(CloudClient::new(session.clone())),
        };
        Ok(Self {
            inner: Arc::new(ControllerInner {
                mode,
                session,
                backend,
            }),
        })
    }

    pub fn mode(&self) -> ConnectionMode {
        self.inner.mode
    }

    /// The session manager backing this controller.
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Authenticate eagerly (operations otherwise authenticate lazily).
    pub async fn login(&self) -> Result<(), CoreError> {
        self.inner.session.login().await?;
        Ok(())
    }

    /// End the session. Never fails; remote errors are logged and dropped.
    pub async fn logout(&self) {
        self.inner.session.logout().await;
    }

    // ── Devices and clients ─────────────────────────────────────────

    /// List network devices in the normalized schema.
    ///
    /// Local: one site's devices. Cloud: devices across every site the
    /// API key can see; sites that fail to load are skipped with a
    /// warning so one unreachable host doesn't blank the whole view.
    pub async fn devices(&self) -> Result<Vec<NormalizedDevice>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let devices = client.list_devices().await?;
                Ok(devices.iter().map(convert::device_from_local).collect())
            }
            Backend::Cloud(client) => self.cloud_devices(client).await,
        }
    }

    async fn cloud_devices(&self, client: &CloudClient) -> Result<Vec<NormalizedDevice>, CoreError> {
        let sites = client.list_sites().await?;

        // One host can back several logical sites; fetch each host once.
        let mut host_ids: Vec<String> = Vec::new();
        for site in &sites {
            if let Some(host_id) = &site.host_id {
                if !host_ids.contains(host_id) {
                    host_ids.push(host_id.clone());
                }
            }
        }
        debug!(sites = sites.len(), hosts = host_ids.len(), "fanning out cloud device fetch");

        let fetches = host_ids
            .iter()
            .map(|host_id| client.list_host_device_groups(host_id));
        let mut devices = Vec::new();
        for (host_id, result) in host_ids.iter().zip(join_all(fetches).await) {
            match result {
                Ok(groups) => {
                    for group in groups {
                        let host_name = group.host_name.as_deref();
                        devices.extend(
                            group
                                .devices
                                .iter()
                                .map(|d| convert::device_from_cloud(d, host_name)),
                        );
                    }
                }
                Err(e) => warn!(host_id, error = %e, "skipping unreachable host"),
            }
        }
        Ok(devices)
    }

    /// List connected clients. Local controllers only.
    pub async fn clients(&self) -> Result<Vec<NormalizedDevice>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let clients = client.list_clients().await?;
                Ok(clients.iter().map(convert::client_from_local).collect())
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "client listing",
                "a local controller connection",
            )),
        }
    }

    // ── System resources (local only) ───────────────────────────────

    /// List enabled wireless networks.
    pub async fn wireless_networks(&self) -> Result<Vec<WirelessNetwork>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let wlans = client.list_wireless_networks().await?;
                Ok(wlans.iter().filter_map(convert::wlan_from_local).collect())
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "wireless network listing",
                "a local controller connection",
            )),
        }
    }

    /// List network definitions with their DHCP scopes.
    pub async fn network_configs(&self) -> Result<Vec<NetworkConfigEntry>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let nets = client.list_network_configs().await?;
                Ok(nets.iter().map(convert::network_conf_from_local).collect())
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "network configuration listing",
                "a local controller connection",
            )),
        }
    }

    /// List port-forwarding rules.
    pub async fn port_forwards(&self) -> Result<Vec<PortForwardRule>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let rules = client.list_port_forwards().await?;
                Ok(rules.iter().map(convert::port_forward_from_local).collect())
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "port-forwarding listing",
                "a local controller connection",
            )),
        }
    }

    /// Current WAN throughput, when the controller reports it.
    pub async fn network_rates(&self) -> Result<Option<NetworkRates>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let health = client.health().await?;
                Ok(convert::rates_from_health(&health))
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "throughput rates",
                "a local controller connection",
            )),
        }
    }

    /// Controller self-description (name, version, uptime, temperature).
    pub async fn system_info(&self) -> Result<Option<SystemInfo>, CoreError> {
        match &self.inner.backend {
            Backend::Local(client) => {
                let info = client.sysinfo().await?;
                Ok(info.first().map(convert::system_info_from_local))
            }
            Backend::Cloud(_) => Err(CoreError::unsupported(
                "system information",
                "a local controller connection",
            )),
        }
    }

    // ── Connectivity check ──────────────────────────────────────────

    /// Validate the configuration end to end: authenticate, fetch one
    /// representative list, verify it has the expected shape.
    ///
    /// Returns `Ok(false)` when the endpoint answers but does not speak
    /// the expected protocol (wrong port, some other web UI), and an
    /// error for authentication and connectivity failures. The session
    /// opened for the check is always closed before returning.
    pub async fn test_connection(&self) -> Result<bool, CoreError> {
        let outcome = self.test_connection_inner().await;
        self.inner.session.logout().await;
        outcome
    }

    async fn test_connection_inner(&self) -> Result<bool, CoreError> {
        self.inner.session.login().await?;
        let probe = match &self.inner.backend {
            Backend::Local(client) => client.list_devices().await.map(|_| ()),
            Backend::Cloud(client) => client.list_sites().await.map(|_| ()),
        };
        match probe {
            Ok(()) => Ok(true),
            // The endpoint answered with something that isn't the
            // controller API. Not an error, just "not a controller".
            Err(lanview_api::Error::Protocol { message }) => {
                debug!(message, "connection test got a non-protocol response");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
