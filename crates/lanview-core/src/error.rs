// ── Core error types ──
//
// User-facing errors from lanview-core. Messages are shown verbatim in
// the UI, so they carry remediation text rather than raw protocol
// details. The `From<lanview_api::Error>` impl translates transport-layer
// errors into domain-appropriate variants.
//
// Clone is required: aggregation results (including failures) are shared
// between single-flight callers.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("Cannot reach controller: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Rate limited by the controller -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Operation not supported: {operation} ({required})")]
    Unsupported {
        operation: String,
        required: String,
    },

    #[error("Controller returned unexpected data: {message}")]
    UnexpectedData { message: String },

    #[error("Controller error: {message}")]
    Api { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn unsupported(operation: &str, required: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_owned(),
            required: required.to_owned(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lanview_api::Error> for CoreError {
    fn from(err: lanview_api::Error) -> Self {
        match err {
            lanview_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            lanview_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "session expired -- re-authentication required".into(),
            },
            lanview_api::Error::RateLimited { retry_after_secs } => {
                CoreError::RateLimited { retry_after_secs }
            }
            lanview_api::Error::Transport(t) => CoreError::ConnectionFailed {
                reason: t.to_string(),
            },
            lanview_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid controller URL: {e}"),
            },
            lanview_api::Error::Tls(message) => CoreError::ConnectionFailed { reason: message },
            lanview_api::Error::Protocol { message } => CoreError::UnexpectedData { message },
            lanview_api::Error::Upstream {
                status,
                endpoint,
                message,
            } => CoreError::Api {
                message: format!("HTTP {status} at {endpoint}: {message}"),
            },
            lanview_api::Error::Config(message) => CoreError::Config { message },
        }
    }
}
