// Local controller resource endpoints
//
// Thin typed wrappers over the request executor. All paths are
// site-scoped; the executor handles deployment prefixing, the session
// cookie, envelope unwrapping, and the single expiry retry.

pub mod models;

use tracing::debug;

use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::session::SessionManager;

use models::{
    HealthSubsystem, LocalClientEntry, LocalDevice, LocalNetworkConf, LocalPortForward,
    LocalSysInfo, LocalWlan,
};

/// Typed client for the local controller API.
#[derive(Clone)]
pub struct LocalClient {
    exec: RequestExecutor,
}

impl LocalClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            exec: RequestExecutor::new(session),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.exec
    }

    /// List all network devices.
    ///
    /// `GET /api/s/{site}/stat/device`
    pub async fn list_devices(&self) -> Result<Vec<LocalDevice>, Error> {
        debug!("listing devices");
        self.exec.get("stat/device").await
    }

    /// List connected clients (stations).
    ///
    /// `GET /api/s/{site}/stat/sta`
    pub async fn list_clients(&self) -> Result<Vec<LocalClientEntry>, Error> {
        debug!("listing clients");
        self.exec.get("stat/sta").await
    }

    /// List wireless network definitions.
    ///
    /// `GET /api/s/{site}/rest/wlanconf`
    pub async fn list_wireless_networks(&self) -> Result<Vec<LocalWlan>, Error> {
        debug!("listing wireless networks");
        self.exec.get("rest/wlanconf").await
    }

    /// List network definitions including DHCP scopes.
    ///
    /// `GET /api/s/{site}/rest/networkconf`
    pub async fn list_network_configs(&self) -> Result<Vec<LocalNetworkConf>, Error> {
        debug!("listing network configs");
        self.exec.get("rest/networkconf").await
    }

    /// List port-forwarding rules.
    ///
    /// `GET /api/s/{site}/rest/portforward`
    pub async fn list_port_forwards(&self) -> Result<Vec<LocalPortForward>, Error> {
        debug!("listing port forwards");
        self.exec.get("rest/portforward").await
    }

    /// Fetch per-subsystem health, including current WAN throughput rates.
    ///
    /// `GET /api/s/{site}/stat/health`
    pub async fn health(&self) -> Result<Vec<HealthSubsystem>, Error> {
        debug!("fetching health");
        self.exec.get("stat/health").await
    }

    /// Fetch controller system information.
    ///
    /// `GET /api/s/{site}/stat/sysinfo`
    pub async fn sysinfo(&self) -> Result<Vec<LocalSysInfo>, Error> {
        debug!("fetching sysinfo");
        self.exec.get("stat/sysinfo").await
    }
}
