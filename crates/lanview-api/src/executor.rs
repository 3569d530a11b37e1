// Request execution
//
// Issues a single logical request under the current session. If the
// response signals expiry (HTTP 401/403 on local deployments, or a
// login-required envelope), the executor invalidates the session,
// re-authenticates exactly once, and retries exactly once. A second
// expiry signal is terminal -- never an infinite loop under persistently
// invalid credentials.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::session::{RequestCredential, SessionManager};

/// Authenticated request issuer for one controller connection.
#[derive(Clone)]
pub struct RequestExecutor {
    session: SessionManager,
}

impl RequestExecutor {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Issue a GET for a resource path and deserialize the unwrapped payload.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let value = self.get_value(path).await?;
        serde_json::from_value(value).map_err(|e| Error::Protocol {
            message: format!("{path}: {e}"),
        })
    }

    /// Issue a GET and return the unwrapped JSON payload.
    ///
    /// Some upstreams nest the payload under a `data` key inside a
    /// `{ meta, data }` envelope; the inner payload is returned
    /// transparently either way.
    pub async fn get_value(&self, path: &str) -> Result<Value, Error> {
        self.session.ensure_authenticated().await?;

        // First attempt, then at most one retry after re-authentication.
        match self.send_once(path).await {
            Err(e) if e.is_auth_expired() && self.session.deployment().is_local() => {
                debug!(path, "session expired, re-authenticating once");
                self.session.invalidate();
                self.session.login().await?;
                match self.send_once(path).await {
                    Err(e) if e.is_auth_expired() => Err(Error::Authentication {
                        message: format!(
                            "session rejected again after re-authentication at {path} -- \
                             credentials are likely no longer valid"
                        ),
                    }),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// One request/response cycle: attach credential, send, classify,
    /// unwrap the envelope. Expiry surfaces as [`Error::SessionExpired`].
    async fn send_once(&self, path: &str) -> Result<Value, Error> {
        let url = self.session.resource_url(path)?;
        debug!("GET {url}");

        let mut builder = self.session.http().get(url);
        builder = match self.session.request_credential() {
            Some(RequestCredential::Cookie(cookie)) => {
                builder.header(reqwest::header::COOKIE, cookie)
            }
            Some(RequestCredential::ApiKey(key)) => {
                use secrecy::ExposeSecret;
                builder.header("X-API-KEY", key.expose_secret())
            }
            None => builder,
        };

        let resp = builder.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            if self.session.deployment().is_local() {
                return Err(Error::SessionExpired);
            }
            // API keys don't expire mid-session: a cloud rejection is terminal.
            return Err(Error::Authentication {
                message: format!("API key rejected by the cloud service (HTTP {status})"),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(Error::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                endpoint: path.to_owned(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Protocol {
                message: format!("{path}: {e} (body preview: {preview:?})"),
            }
        })?;

        unwrap_envelope(path, value)
    }
}

/// Strip the `{ meta, data }` envelope if present.
///
/// Classic local controllers signal session loss with HTTP 200 plus
/// `meta.rc = "error", meta.msg = "api.err.LoginRequired"`; that maps to
/// the same expiry signal as a 401.
fn unwrap_envelope(path: &str, value: Value) -> Result<Value, Error> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };

    if let Some(meta) = map.get("meta") {
        let rc = meta.get("rc").and_then(Value::as_str).unwrap_or("ok");
        if rc != "ok" {
            let msg = meta
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_owned();
            if msg.contains("LoginRequired") {
                return Err(Error::SessionExpired);
            }
            return Err(Error::Protocol {
                message: format!("{path}: rc={rc} {msg}"),
            });
        }
    }

    match map.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(map)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_data_is_unwrapped() {
        let value = json!({ "meta": { "rc": "ok" }, "data": [1, 2, 3] });
        assert_eq!(unwrap_envelope("stat/device", value).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn bare_data_key_is_unwrapped() {
        let value = json!({ "data": [{ "id": "x" }] });
        assert_eq!(
            unwrap_envelope("ea/sites", value).unwrap(),
            json!([{ "id": "x" }])
        );
    }

    #[test]
    fn unenveloped_payload_passes_through() {
        let value = json!([{ "mac": "aa:bb:cc:dd:ee:ff" }]);
        assert_eq!(unwrap_envelope("stat/sta", value.clone()).unwrap(), value);
    }

    #[test]
    fn login_required_envelope_is_expiry() {
        let value = json!({ "meta": { "rc": "error", "msg": "api.err.LoginRequired" }, "data": [] });
        assert!(matches!(
            unwrap_envelope("stat/device", value),
            Err(Error::SessionExpired)
        ));
    }

    #[test]
    fn error_envelope_is_protocol_error() {
        let value = json!({ "meta": { "rc": "error", "msg": "api.err.InvalidObject" }, "data": [] });
        match unwrap_envelope("rest/wlanconf", value) {
            Err(Error::Protocol { message }) => assert!(message.contains("InvalidObject")),
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }
}
