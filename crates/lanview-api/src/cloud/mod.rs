// Cloud controller endpoints
//
// API-key-authenticated multi-site REST service. Requests go through the
// same executor as local traffic; for cloud sessions the executor treats
// 401/403 as terminal (keys don't lapse mid-session) and surfaces 429
// with the upstream's Retry-After hint.

pub mod models;

use tracing::debug;

use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::session::SessionManager;

use models::{CloudDevice, CloudDeviceGroup, CloudSite};

/// Typed client for the vendor-hosted cloud API.
#[derive(Clone)]
pub struct CloudClient {
    exec: RequestExecutor,
}

impl CloudClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            exec: RequestExecutor::new(session),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.exec
    }

    /// Enumerate the logical sites visible to the API key.
    ///
    /// `GET /ea/sites`
    pub async fn list_sites(&self) -> Result<Vec<CloudSite>, Error> {
        debug!("listing cloud sites");
        self.exec.get("ea/sites").await
    }

    /// List devices for one host, keeping the per-host grouping (the
    /// group carries the host's display name).
    ///
    /// `GET /ea/devices?hostIds[]={host_id}`
    pub async fn list_host_device_groups(
        &self,
        host_id: &str,
    ) -> Result<Vec<CloudDeviceGroup>, Error> {
        debug!(host_id, "listing cloud devices");
        self.exec
            .get(&format!("ea/devices?hostIds[]={host_id}"))
            .await
    }

    /// List devices for one host, flattened out of the grouping.
    pub async fn list_host_devices(&self, host_id: &str) -> Result<Vec<CloudDevice>, Error> {
        let groups = self.list_host_device_groups(host_id).await?;
        Ok(groups.into_iter().flat_map(|g| g.devices).collect())
    }
}
