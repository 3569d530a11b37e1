#![allow(clippy::unwrap_used)]
// Integration tests for `RequestExecutor` and `LocalClient`/`CloudClient`
// using wiremock: expiry recovery, bounded retry, envelope unwrapping.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanview_api::{
    CloudClient, Credentials, Error, LocalClient, SessionConfig, SessionManager, TlsMode,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn transport() -> TransportConfig {
    TransportConfig {
        tls: TlsMode::System,
        timeout: Duration::from_secs(5),
    }
}

/// Local session against the mock server, classic deployment
/// (gateway probe is answered with 404 unless mocked).
fn local_session(server: &MockServer) -> SessionManager {
    let base_url = Url::parse(&server.uri()).unwrap();
    let config = SessionConfig::new(
        base_url,
        Credentials::Password {
            username: "admin".into(),
            password: "pw".to_string().into(),
        },
    );
    SessionManager::new(config, &transport()).unwrap()
}

fn cloud_session(server: &MockServer) -> SessionManager {
    let base_url = Url::parse(&server.uri()).unwrap();
    let config = SessionConfig::new(base_url, Credentials::ApiKey("key-123".to_string().into()));
    SessionManager::new(config, &transport()).unwrap()
}

async fn mount_classic_login(server: &MockServer, expected_logins: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "unifises=abc; Path=/")
                .set_body_json(json!({ "meta": { "rc": "ok" }, "data": [] })),
        )
        .expect(expected_logins)
        .mount(server)
        .await;
}

fn device_envelope() -> serde_json::Value {
    json!({
        "meta": { "rc": "ok" },
        "data": [{
            "_id": "abc123",
            "mac": "aa:bb:cc:dd:ee:ff",
            "type": "usw",
            "name": "Switch-24",
            "state": 1
        }]
    })
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn devices_are_unwrapped_from_the_envelope() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .and(header("cookie", "unifises=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_envelope()))
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    assert_eq!(devices[0].name.as_deref(), Some("Switch-24"));
    assert_eq!(devices[0].state, Some(1));
}

// ── Expiry recovery ─────────────────────────────────────────────────

#[tokio::test]
async fn expired_session_is_recovered_with_one_retry() {
    let server = MockServer::start().await;
    // Initial login + one re-authentication.
    mount_classic_login(&server, 2).await;

    // First resource call is rejected, the retried one succeeds.
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_envelope()))
        .expect(1)
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn second_expiry_is_terminal() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 2).await;

    // Persistently rejected: exactly two GETs (original + single retry).
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    match client.list_devices().await {
        Err(Error::Authentication { message }) => {
            assert!(message.contains("after re-authentication"), "{message}");
        }
        other => panic!("expected Authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_required_envelope_triggers_the_same_recovery() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.LoginRequired" },
            "data": []
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_envelope()))
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn elapsed_ttl_reauthenticates_before_the_request() {
    let server = MockServer::start().await;
    // Login once up front, once more when the executor finds the TTL gone.
    mount_classic_login(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_envelope()))
        .mount(&server)
        .await;

    let base_url = Url::parse(&server.uri()).unwrap();
    let config = SessionConfig::new(
        base_url,
        Credentials::Password {
            username: "admin".into(),
            password: "pw".to_string().into(),
        },
    )
    .with_ttl(Duration::ZERO);
    let session = SessionManager::new(config, &transport()).unwrap();

    assert!(session.login().await.unwrap());
    let client = LocalClient::new(session);
    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn non_expiry_http_errors_carry_endpoint_context() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/rest/portforward"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    match client.list_port_forwards().await {
        Err(Error::Upstream {
            status, endpoint, ..
        }) => {
            assert_eq!(status, 500);
            assert_eq!(endpoint, "rest/portforward");
        }
        other => panic!("expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_protocol_error() {
    let server = MockServer::start().await;
    mount_classic_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sysinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = LocalClient::new(local_session(&server));
    assert!(matches!(
        client.sysinfo().await,
        Err(Error::Protocol { .. })
    ));
}

// ── Cloud ───────────────────────────────────────────────────────────

#[tokio::test]
async fn cloud_requests_carry_the_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ea/sites"))
        .and(header("x-api-key", "key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "siteId": "site-1",
                "hostId": "host-1",
                "meta": { "name": "Home" }
            }]
        })))
        .mount(&server)
        .await;

    let client = CloudClient::new(cloud_session(&server));
    let sites = client.list_sites().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].host_id.as_deref(), Some("host-1"));
}

#[tokio::test]
async fn cloud_rejection_is_terminal_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ea/sites"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudClient::new(cloud_session(&server));
    match client.list_sites().await {
        Err(Error::Authentication { message }) => {
            assert!(message.contains("API key rejected"), "{message}");
        }
        other => panic!("expected Authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn cloud_devices_are_flattened_from_host_groups() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "hostId": "host-1",
                "devices": [
                    { "id": "d1", "mac": "aa:bb:cc:00:11:22", "status": "connected" },
                    { "id": "d2", "mac": "aa:bb:cc:00:11:33", "status": "offline" }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let client = CloudClient::new(cloud_session(&server));
    let devices = client.list_host_devices("host-1").await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].status.as_deref(), Some("connected"));
}
