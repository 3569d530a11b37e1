//! Async client for heterogeneous network-controller APIs.
//!
//! Two upstream protocol families are supported:
//!
//! - **Local controllers** — cookie-session HTTP APIs served on the LAN,
//!   usually behind a self-signed certificate. Two endpoint variants exist:
//!   gateway-style (`/api/auth/login`, resources behind a proxy prefix) and
//!   classic (`/api/login`, no prefix). [`deployment`] probes which one a
//!   given base URL speaks.
//! - **Cloud controllers** — an API-key-authenticated multi-site REST
//!   service hosted by the vendor.
//!
//! The layering is: [`transport`] builds a connection-scoped HTTP client,
//! [`session::SessionManager`] owns credentials and the renewable session,
//! [`executor::RequestExecutor`] issues authenticated requests with a single
//! transparent re-login on expiry, and [`local`] / [`cloud`] expose typed
//! resource endpoints on top.

pub mod cloud;
pub mod deployment;
pub mod error;
pub mod executor;
pub mod local;
pub mod session;
pub mod transport;

pub use cloud::CloudClient;
pub use deployment::Deployment;
pub use error::{Error, TransportError};
pub use executor::RequestExecutor;
pub use local::LocalClient;
pub use session::{Credentials, SessionConfig, SessionManager};
pub use transport::{TlsMode, TransportConfig};
