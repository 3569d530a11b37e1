// ── Runtime connection configuration ──
//
// Describes *how* to connect to a controller. Carries credential data and
// connection tuning, never touches disk -- the caller constructs a
// `ConnectionConfig` and hands it in. Immutable once given to a
// `Controller`: changing connection details means building a new one,
// which implicitly invalidates any existing session.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lanview_api::session::DEFAULT_SESSION_TTL;
use lanview_api::{Credentials, SessionConfig, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Which controller family to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// On-premises controller, cookie-session authenticated.
    Local,
    /// Vendor-hosted multi-site API, key authenticated.
    Cloud,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// System CA store (strict). Default for cloud.
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs). Default for local controllers.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one controller connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub mode: ConnectionMode,
    /// Controller URL. Required for local mode; defaults to the vendor
    /// cloud endpoint for cloud mode.
    pub base_url: Option<Url>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub api_key: Option<SecretString>,
    /// Site to operate on (defaults to "default").
    pub site: String,
    /// Cookie-session time-to-live for local modes.
    pub session_ttl: Duration,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Local-mode config from URL and credentials.
    pub fn local(base_url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            mode: ConnectionMode::Local,
            base_url: Some(base_url),
            username: Some(username.into()),
            password: Some(password),
            api_key: None,
            site: "default".into(),
            session_ttl: DEFAULT_SESSION_TTL,
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }

    /// Cloud-mode config from an API key, targeting the vendor endpoint.
    pub fn cloud(api_key: SecretString) -> Self {
        Self {
            mode: ConnectionMode::Cloud,
            base_url: None,
            username: None,
            password: None,
            api_key: Some(api_key),
            site: "default".into(),
            session_ttl: DEFAULT_SESSION_TTL,
            tls: TlsVerification::SystemDefaults,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// The mode after applying the cloud-hostname auto-selection rule:
    /// a "local" config whose base URL is the known cloud hostname is
    /// treated as cloud.
    pub fn effective_mode(&self) -> ConnectionMode {
        if self.mode == ConnectionMode::Cloud {
            return ConnectionMode::Cloud;
        }
        match &self.base_url {
            Some(url) if lanview_api::deployment::is_cloud_url(url) => ConnectionMode::Cloud,
            _ => ConnectionMode::Local,
        }
    }

    /// Validate and lower into the api-layer session description.
    ///
    /// Exactly one of (username+password+base_url) or (api_key) must be
    /// populated, determined by the effective mode.
    pub(crate) fn session_config(&self) -> Result<SessionConfig, CoreError> {
        match self.effective_mode() {
            ConnectionMode::Local => {
                let base_url = self.base_url.clone().ok_or_else(|| CoreError::Config {
                    message: "local mode requires a controller URL".into(),
                })?;
                let username = self.username.clone().ok_or_else(|| CoreError::Config {
                    message: "local mode requires a username".into(),
                })?;
                let password = self.password.clone().ok_or_else(|| CoreError::Config {
                    message: "local mode requires a password".into(),
                })?;
                if self.api_key.is_some() {
                    return Err(CoreError::Config {
                        message: "local mode uses username/password, not an API key".into(),
                    });
                }
                Ok(SessionConfig::new(
                    base_url,
                    Credentials::Password { username, password },
                )
                .with_site(self.site.clone())
                .with_ttl(self.session_ttl))
            }
            ConnectionMode::Cloud => {
                let api_key = self.api_key.clone().ok_or_else(|| CoreError::Config {
                    message: "cloud mode requires an API key".into(),
                })?;
                let base_url = match &self.base_url {
                    Some(url) => url.clone(),
                    None => format!("https://{}", lanview_api::deployment::CLOUD_API_HOST)
                        .parse()
                        .map_err(|e| CoreError::Config {
                            message: format!("cloud endpoint URL: {e}"),
                        })?,
                };
                Ok(SessionConfig::new(base_url, Credentials::ApiKey(api_key))
                    .with_site(self.site.clone()))
            }
        }
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn local_config_validates() {
        let config = ConnectionConfig::local(
            "https://192.168.1.1".parse().unwrap(),
            "admin",
            SecretString::from("pw".to_string()),
        );
        assert_eq!(config.effective_mode(), ConnectionMode::Local);
        assert!(config.session_config().is_ok());
    }

    #[test]
    fn cloud_hostname_auto_selects_cloud_mode() {
        let mut config = ConnectionConfig::local(
            "https://api.ui.com".parse().unwrap(),
            "admin",
            SecretString::from("pw".to_string()),
        );
        assert_eq!(config.effective_mode(), ConnectionMode::Cloud);
        // ...but without an API key it cannot be lowered.
        assert!(config.session_config().is_err());
        config.api_key = Some(SecretString::from("key".to_string()));
        config.username = None;
        config.password = None;
        assert!(config.session_config().is_ok());
    }

    #[test]
    fn missing_password_is_a_config_error() {
        let mut config = ConnectionConfig::local(
            "https://192.168.1.1".parse().unwrap(),
            "admin",
            SecretString::from("pw".to_string()),
        );
        config.password = None;
        assert!(matches!(
            config.session_config(),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn cloud_defaults_to_vendor_endpoint() {
        let config = ConnectionConfig::cloud(SecretString::from("key".to_string()));
        let session = config.session_config().unwrap();
        assert_eq!(session.base_url.host_str(), Some("api.ui.com"));
    }
}
