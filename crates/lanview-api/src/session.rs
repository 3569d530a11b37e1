// Session management
//
// Owns credential state, the current session token, and the deployment
// classification cache. Login is single-flight: concurrent callers share
// one in-flight attempt through a `Shared` future instead of issuing
// duplicate authentication requests. All session-state mutations go
// through one mutex so the check/act steps of ensure-authenticated logic
// cannot interleave.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::{HeaderMap, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::deployment::{self, Deployment};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default session time-to-live for cookie-based local sessions.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Credential material for one controller connection.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password for cookie-session local controllers.
    Password {
        username: String,
        password: SecretString,
    },
    /// API key for the cloud controller service.
    ApiKey(SecretString),
}

/// Connection description consumed by the session manager.
///
/// Immutable once set: replacing the configuration means constructing a
/// new [`SessionManager`], which implicitly invalidates any prior session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    /// Site identifier for site-scoped resource paths.
    pub site: String,
    /// TTL after which a cookie session is considered stale.
    pub ttl: Duration,
}

impl SessionConfig {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            site: "default".into(),
            ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Cloud mode is explicit (API-key credentials) or auto-selected when
    /// the base URL matches the known cloud hostname.
    fn is_cloud(&self) -> bool {
        matches!(self.credentials, Credentials::ApiKey(_))
            || deployment::is_cloud_url(&self.base_url)
    }
}

/// The credential a request should carry.
#[derive(Debug, Clone)]
pub enum RequestCredential {
    /// Normalized `name=value; ...` cookie string for local sessions.
    Cookie(String),
    /// API key header value for cloud requests.
    ApiKey(SecretString),
}

#[derive(Default)]
struct SessionState {
    /// Opaque session credential (cookie string). `None` when logged out.
    token: Option<String>,
    obtained_at: Option<Instant>,
    /// Detection result, cached until the config is replaced.
    deployment: Option<Deployment>,
}

type LoginFuture = Shared<BoxFuture<'static, Result<(), Error>>>;

struct SessionInner {
    config: SessionConfig,
    http: reqwest::Client,
    state: Mutex<SessionState>,
    in_flight: tokio::sync::Mutex<Option<LoginFuture>>,
}

/// Authenticated-channel owner for one controller connection.
///
/// Cheaply cloneable; all clones share the same session state. Injected
/// into the controller facade rather than living as a global singleton so
/// unrelated callers never share hidden session state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    /// Build a session manager with its own connection-scoped HTTP client.
    pub fn new(config: SessionConfig, transport: &TransportConfig) -> Result<Self, Error> {
        if let Credentials::Password { username, .. } = &config.credentials {
            if username.is_empty() {
                return Err(Error::Config("username must not be empty".into()));
            }
        }
        let http = transport.build_client()?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                http,
                state: Mutex::new(SessionState::default()),
                in_flight: tokio::sync::Mutex::new(None),
            }),
        })
    }

    /// The underlying HTTP client (shared with resource clients).
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.config.base_url
    }

    pub fn site(&self) -> &str {
        &self.inner.config.site
    }

    /// The cached deployment classification, if detection has run.
    pub fn deployment(&self) -> Deployment {
        if self.inner.config.is_cloud() {
            return Deployment::Cloud;
        }
        self.inner
            .state
            .lock()
            .expect("session state lock poisoned")
            .deployment
            .unwrap_or(Deployment::Unknown)
    }

    /// Detect which deployment variant the endpoint speaks.
    ///
    /// Cloud configurations bypass detection. For local configurations the
    /// probe is a real credentialed login against the gateway-style path;
    /// the session it may establish is kept rather than thrown away. The
    /// classification is cached until the configuration is replaced.
    pub async fn detect(&self) -> Result<Deployment, Error> {
        if self.inner.config.is_cloud() {
            return Ok(Deployment::Cloud);
        }
        if let Some(found) = self
            .inner
            .state
            .lock()
            .expect("session state lock poisoned")
            .deployment
        {
            return Ok(found);
        }

        let Credentials::Password { username, password } = &self.inner.config.credentials else {
            return Err(Error::Config(
                "local deployment detection requires username/password credentials".into(),
            ));
        };

        let outcome = deployment::probe(
            &self.inner.http,
            &self.inner.config.base_url,
            username,
            password,
        )
        .await?;

        let mut state = self
            .inner
            .state
            .lock()
            .expect("session state lock poisoned");
        state.deployment = Some(outcome.deployment);
        if let Some(cookie) = outcome.session_cookie {
            state.token = Some(cookie);
            state.obtained_at = Some(Instant::now());
        }
        Ok(outcome.deployment)
    }

    /// Whether a usable session is currently held.
    ///
    /// For local modes the token must also be younger than the TTL. For
    /// cloud mode a configured API key is sufficient; the first real
    /// request still validates it against the upstream.
    pub fn is_authenticated(&self) -> bool {
        if self.inner.config.is_cloud() {
            return match &self.inner.config.credentials {
                Credentials::ApiKey(key) => !key.expose_secret().is_empty(),
                Credentials::Password { .. } => false,
            };
        }
        let state = self
            .inner
            .state
            .lock()
            .expect("session state lock poisoned");
        match (&state.token, state.obtained_at) {
            (Some(_), Some(at)) => at.elapsed() < self.inner.config.ttl,
            _ => false,
        }
    }

    /// Authenticate with the controller.
    ///
    /// If an attempt is already in flight, awaits and returns its result
    /// instead of starting a second one -- critical under concurrent
    /// first-load requests, which would otherwise hammer the login
    /// endpoint. Idempotent when a valid session is already held.
    pub async fn login(&self) -> Result<bool, Error> {
        let fut = {
            let mut guard = self.inner.in_flight.lock().await;
            if let Some(fut) = guard.clone() {
                fut
            } else {
                if self.is_authenticated() {
                    return Ok(true);
                }
                let inner = Arc::clone(&self.inner);
                let fut: LoginFuture = async move {
                    let result = perform_login(&inner).await;
                    // Clear the slot so a later failure can be retried.
                    inner.in_flight.lock().await.take();
                    result
                }
                .boxed()
                .shared();
                *guard = Some(fut.clone());
                fut
            }
        };
        fut.await.map(|()| true)
    }

    /// Ensure a valid session exists, authenticating if necessary.
    pub async fn ensure_authenticated(&self) -> Result<(), Error> {
        if self.is_authenticated() {
            return Ok(());
        }
        self.login().await.map(|_| ())
    }

    /// Drop the local session without notifying the controller.
    ///
    /// Used by the request executor when a response signals expiry. The
    /// deployment classification cache is kept: the endpoint hasn't changed,
    /// only the session lapsed.
    pub fn invalidate(&self) {
        let mut state = self
            .inner
            .state
            .lock()
            .expect("session state lock poisoned");
        state.token = None;
        state.obtained_at = None;
    }

    /// End the session, best-effort.
    ///
    /// Remote invalidation failures are swallowed (logged only) -- logout
    /// must never raise. Local state is always cleared regardless of the
    /// remote outcome. Cloud mode has no remote session to end.
    pub async fn logout(&self) {
        let (token, deployment) = {
            let state = self
                .inner
                .state
                .lock()
                .expect("session state lock poisoned");
            (state.token.clone(), state.deployment)
        };

        if let (Some(token), Some(deployment)) = (token, deployment) {
            if let Some(path) = deployment.logout_path() {
                match self.inner.config.base_url.join(path) {
                    Ok(url) => {
                        debug!(url = %url, "logging out");
                        let result = self
                            .inner
                            .http
                            .post(url)
                            .header(reqwest::header::COOKIE, &token)
                            .send()
                            .await;
                        if let Err(e) = result {
                            warn!(error = %e, "remote logout failed (ignored)");
                        }
                    }
                    Err(e) => warn!(error = %e, "logout URL construction failed (ignored)"),
                }
            }
        }

        self.invalidate();
    }

    /// The credential to attach to an outgoing request, if any.
    pub fn request_credential(&self) -> Option<RequestCredential> {
        if self.inner.config.is_cloud() {
            return match &self.inner.config.credentials {
                Credentials::ApiKey(key) => Some(RequestCredential::ApiKey(key.clone())),
                Credentials::Password { .. } => None,
            };
        }
        self.inner
            .state
            .lock()
            .expect("session state lock poisoned")
            .token
            .clone()
            .map(RequestCredential::Cookie)
    }

    /// Build a site-scoped resource URL:
    /// `{base}{prefix}/api/s/{site}/{path}` for local deployments, or
    /// `{base}/{path}` for cloud.
    pub fn resource_url(&self, path: &str) -> Result<Url, Error> {
        let deployment = self.deployment();
        if deployment == Deployment::Cloud {
            return Ok(self.inner.config.base_url.join(path)?);
        }
        let base = self.inner.config.base_url.as_str().trim_end_matches('/');
        let prefix = deployment.api_prefix();
        let full = format!("{base}{prefix}/api/s/{}/{path}", self.inner.config.site);
        Url::parse(&full).map_err(Error::InvalidUrl)
    }
}

/// The actual network login, run inside the shared in-flight future.
async fn perform_login(inner: &SessionInner) -> Result<(), Error> {
    // Cloud: a non-empty key is enough to consider the session established.
    // The first real request validates it against the upstream.
    if inner.config.is_cloud() {
        return match &inner.config.credentials {
            Credentials::ApiKey(key) if !key.expose_secret().is_empty() => Ok(()),
            Credentials::ApiKey(_) => Err(Error::Authentication {
                message: "cloud API key is empty".into(),
            }),
            Credentials::Password { .. } => Err(Error::Config(
                "cloud endpoint requires an API key, not username/password".into(),
            )),
        };
    }

    let Credentials::Password { username, password } = &inner.config.credentials else {
        return Err(Error::Config(
            "local controller requires username/password credentials".into(),
        ));
    };

    // Resolve the deployment first. A successful gateway probe is itself a
    // login, in which case the captured session is already stored.
    let cached = inner
        .state
        .lock()
        .expect("session state lock poisoned")
        .deployment;
    let deployment = if let Some(d) = cached {
        d
    } else {
        let outcome =
            deployment::probe(&inner.http, &inner.config.base_url, username, password).await?;
        let mut state = inner.state.lock().expect("session state lock poisoned");
        state.deployment = Some(outcome.deployment);
        if let Some(cookie) = outcome.session_cookie {
            state.token = Some(cookie);
            state.obtained_at = Some(Instant::now());
            debug!(deployment = %outcome.deployment, "session established by probe");
            return Ok(());
        }
        outcome.deployment
    };

    let login_path = deployment.login_path().ok_or_else(|| Error::Config(
        "deployment has no login endpoint".into(),
    ))?;
    let url = inner.config.base_url.join(login_path)?;

    debug!(url = %url, deployment = %deployment, "logging in");

    let body = json!({
        "username": username,
        "password": password.expose_secret(),
    });

    let resp = inner.http.post(url).json(&body).send().await?;
    let status = resp.status();

    if !status.is_success() {
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(deployment::login_failure(status, deployment, retry_after));
    }

    let token = extract_session_cookie(resp.headers()).ok_or_else(|| Error::Authentication {
        message: "login response did not establish a session".into(),
    })?;

    let mut state = inner.state.lock().expect("session state lock poisoned");
    state.token = Some(token);
    state.obtained_at = Some(Instant::now());
    debug!(deployment = %deployment, "login successful");
    Ok(())
}

/// Normalize `Set-Cookie` response headers into a single reusable
/// `name=value; ...` credential string.
pub(crate) fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    // Split at the first '=' so base64-padded values (trailing '=')
    // survive; only cookies with an empty value are dropped.
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| !name.is_empty() && !value.is_empty())
        })
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_cookies(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for c in cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(c).unwrap());
        }
        headers
    }

    #[test]
    fn single_cookie_is_normalized() {
        let headers = headers_with_cookies(&["TOKEN=abc123; Path=/; HttpOnly"]);
        assert_eq!(extract_session_cookie(&headers).as_deref(), Some("TOKEN=abc123"));
    }

    #[test]
    fn multiple_cookies_are_joined() {
        let headers = headers_with_cookies(&["TOKEN=abc; Path=/", "csrf=xyz; Secure"]);
        assert_eq!(
            extract_session_cookie(&headers).as_deref(),
            Some("TOKEN=abc; csrf=xyz")
        );
    }

    #[test]
    fn base64_padded_cookie_value_is_kept() {
        let headers = headers_with_cookies(&["TOKEN=abc123w==; Path=/; HttpOnly"]);
        assert_eq!(
            extract_session_cookie(&headers).as_deref(),
            Some("TOKEN=abc123w==")
        );
    }

    #[test]
    fn empty_cookie_values_are_ignored() {
        let headers = headers_with_cookies(&["TOKEN=; Max-Age=0"]);
        assert_eq!(extract_session_cookie(&headers), None);
    }

    #[test]
    fn no_cookies_means_no_session() {
        assert_eq!(extract_session_cookie(&HeaderMap::new()), None);
    }
}
