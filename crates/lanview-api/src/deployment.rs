// Deployment classification
//
// Local controllers speak one of two login endpoint variants. Which one a
// given base URL speaks is probed once per connection configuration and
// cached on the session manager; cloud endpoints bypass detection.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::session::extract_session_cookie;

/// Hostname of the vendor-hosted cloud controller API.
pub const CLOUD_API_HOST: &str = "api.ui.com";

/// Which login/resource path variant a controller endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    /// Gateway-style local controller: login at `/api/auth/login`,
    /// resources behind the `/proxy/network` prefix.
    Gateway,
    /// Classic local controller: login at `/api/login`, no prefix.
    Classic,
    /// Vendor-hosted cloud API, key-authenticated, no session login.
    Cloud,
    /// Not yet detected.
    Unknown,
}

impl Deployment {
    /// The login endpoint path. `None` for cloud (API-key auth).
    pub fn login_path(&self) -> Option<&'static str> {
        match self {
            Self::Gateway => Some("/api/auth/login"),
            Self::Classic => Some("/api/login"),
            Self::Cloud | Self::Unknown => None,
        }
    }

    /// The logout endpoint path. `None` for cloud.
    pub fn logout_path(&self) -> Option<&'static str> {
        match self {
            Self::Gateway => Some("/api/auth/logout"),
            Self::Classic => Some("/api/logout"),
            Self::Cloud | Self::Unknown => None,
        }
    }

    /// Path prefix inserted before every resource path.
    ///
    /// Gateway-style controllers proxy the network application, so the
    /// otherwise-identical paths gain a prefix.
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Self::Gateway => "/proxy/network",
            Self::Classic | Self::Cloud | Self::Unknown => "",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Gateway | Self::Classic)
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gateway => "gateway",
            Self::Classic => "classic",
            Self::Cloud => "cloud",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Whether a base URL points at the known cloud API hostname.
pub fn is_cloud_url(url: &Url) -> bool {
    url.host_str() == Some(CLOUD_API_HOST)
}

/// Outcome of a detection probe. A successful gateway probe is a real
/// login, so the captured session is handed back for reuse.
pub(crate) struct ProbeOutcome {
    pub deployment: Deployment,
    pub session_cookie: Option<String>,
}

/// Probe which local deployment variant the controller speaks.
///
/// POSTs the credentials at the gateway-style login path. A success
/// response carrying a session-establishing `Set-Cookie` header means
/// gateway-style. A network-level error or non-success HTTP status falls
/// back to classic -- many local controllers simply don't expose the
/// gateway path, so the probe failure is never propagated.
pub(crate) async fn probe(
    http: &reqwest::Client,
    base_url: &Url,
    username: &str,
    password: &SecretString,
) -> Result<ProbeOutcome, Error> {
    let gateway_path = Deployment::Gateway
        .login_path()
        .unwrap_or("/api/auth/login");
    let probe_url = base_url.join(gateway_path)?;

    debug!(url = %probe_url, "probing gateway-style login endpoint");

    let body = json!({
        "username": username,
        "password": password.expose_secret(),
    });

    match http.post(probe_url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
            if let Some(cookie) = extract_session_cookie(resp.headers()) {
                debug!("detected gateway-style deployment");
                return Ok(ProbeOutcome {
                    deployment: Deployment::Gateway,
                    session_cookie: Some(cookie),
                });
            }
            // 200 without a session header: not a real login endpoint.
            debug!("gateway probe succeeded without session header, assuming classic");
            Ok(ProbeOutcome {
                deployment: Deployment::Classic,
                session_cookie: None,
            })
        }
        Ok(resp) => {
            debug!(status = %resp.status(), "gateway probe rejected, assuming classic");
            Ok(ProbeOutcome {
                deployment: Deployment::Classic,
                session_cookie: None,
            })
        }
        Err(e) => {
            // Network-level failure (refused, DNS, TLS): fall back, don't raise.
            debug!(error = %e, "gateway probe unreachable, assuming classic");
            Ok(ProbeOutcome {
                deployment: Deployment::Classic,
                session_cookie: None,
            })
        }
    }
}

/// Map a login-rejection HTTP status to a user-actionable message.
pub(crate) fn login_failure(
    status: StatusCode,
    deployment: Deployment,
    retry_after_secs: Option<u64>,
) -> Error {
    match status.as_u16() {
        400 => Error::Authentication {
            message: "malformed login request -- check that both username and password are set"
                .into(),
        },
        401 => Error::Authentication {
            message: "invalid username or password".into(),
        },
        403 => Error::Authentication {
            message: "login forbidden -- the account may be locked or lack local access".into(),
        },
        404 => Error::Authentication {
            message: format!(
                "login endpoint not found -- the controller does not speak the {deployment} protocol"
            ),
        },
        429 => Error::RateLimited {
            retry_after_secs: retry_after_secs.unwrap_or(60),
        },
        code => Error::Authentication {
            message: format!("login failed (HTTP {code})"),
        },
    }
}
