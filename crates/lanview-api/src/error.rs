use std::error::Error as StdError;

use thiserror::Error;

/// Network-level failure, classified from the underlying transport error.
///
/// Classification inspects the `source()` chain for structured causes
/// (`std::io::Error` kinds) first and falls back to string matching when
/// the platform doesn't expose them. Never indicates bad credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("DNS resolution failed: {0}")]
    DnsResolutionFailed(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classify a `reqwest::Error` into a transport failure category.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        // Structured causes: walk the source chain for an io::Error.
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io) = cause.downcast_ref::<std::io::Error>() {
                match io.kind() {
                    std::io::ErrorKind::ConnectionRefused => {
                        return Self::ConnectionRefused(io.to_string());
                    }
                    std::io::ErrorKind::TimedOut => return Self::Timeout,
                    _ => {}
                }
            }
            source = cause.source();
        }

        // String fallback over the full cause chain.
        let chain = {
            let mut text = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                text.push_str(": ");
                text.push_str(&cause.to_string());
                source = cause.source();
            }
            text
        };
        let lower = chain.to_lowercase();

        if lower.contains("dns") || lower.contains("failed to lookup") {
            Self::DnsResolutionFailed(chain)
        } else if lower.contains("connection refused") {
            Self::ConnectionRefused(chain)
        } else if lower.contains("certificate")
            || lower.contains("tls")
            || lower.contains("handshake")
        {
            Self::Tls(chain)
        } else if lower.contains("timed out") {
            Self::Timeout
        } else {
            Self::Other(chain)
        }
    }
}

/// Top-level error type for the `lanview-api` crate.
///
/// Deliberately `Clone` (variants carry strings, not source errors): login
/// and aggregation results are shared between coalesced concurrent callers,
/// so failures must be duplicable. `reqwest::Error` is converted at the
/// boundary via [`TransportError::classify`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected or session unrecoverable. The message carries
    /// status-specific remediation text and is shown to users verbatim.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session no longer valid. Internal signal: the request executor
    /// recovers it with a single re-login, callers never see it unless
    /// re-authentication fails too.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Rate limited by the upstream. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Transport ───────────────────────────────────────────────────
    /// Network-level failure (DNS, refused, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client construction failed (bad TLS config, etc.).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Upstream protocol ───────────────────────────────────────────
    /// Non-success HTTP status outside the expiry path, with endpoint context.
    #[error("Upstream error (HTTP {status}) at {endpoint}: {message}")]
    Upstream {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// Malformed or unexpected response body.
    #[error("Malformed upstream response: {message}")]
    Protocol { message: String },

    // ── Configuration ───────────────────────────────────────────────
    /// Missing or inconsistent connection fields.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::classify(&err))
    }
}

impl Error {
    /// Returns `true` if this error indicates the session lapsed and
    /// re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Timeout | TransportError::ConnectionRefused(_))
                | Self::RateLimited { .. }
        )
    }
}
