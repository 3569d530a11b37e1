#![allow(clippy::unwrap_used)]
// Integration tests for `StatsAggregator` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lanview_core::{ConnectionConfig, Controller, CoreError, StatsAggregator};

// ── Helpers ─────────────────────────────────────────────────────────

async fn mount_classic_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "unifises=abc123; Path=/; HttpOnly")
                .set_body_json(json!({ "meta": { "rc": "ok" }, "data": [] })),
        )
        .mount(server)
        .await;
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "meta": { "rc": "ok" }, "data": data }))
}

fn site_path(suffix: &str) -> String {
    format!("/api/s/default/{suffix}")
}

/// Mount every resource endpoint with small but non-empty payloads.
async fn mount_all_resources(server: &MockServer) {
    let endpoints = [
        (
            "stat/device",
            json!([{ "_id": "d1", "name": "Gateway", "type": "ugw", "state": 1 }]),
        ),
        ("stat/sta", json!([{ "mac": "de:ad:be:ef:00:01" }])),
        ("rest/wlanconf", json!([{ "_id": "w1", "ssid": "HomeNet" }])),
        (
            "rest/networkconf",
            json!([{ "_id": "n1", "name": "LAN", "dhcpd_enabled": true }]),
        ),
        ("rest/portforward", json!([{ "_id": "p1", "name": "ssh" }])),
        (
            "stat/health",
            json!([{ "subsystem": "wan", "rx_bytes-r": 100.0, "tx_bytes-r": 50.0 }]),
        ),
        ("stat/sysinfo", json!([{ "name": "Home Controller", "version": "8.0.7" }])),
    ];
    for (suffix, data) in endpoints {
        Mock::given(method("GET"))
            .and(path(site_path(suffix)))
            .respond_with(envelope(data))
            .mount(server)
            .await;
    }
}

fn local_aggregator(server: &MockServer) -> StatsAggregator {
    let config = ConnectionConfig::local(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        SecretString::from("pw".to_string()),
    );
    StatsAggregator::new(Controller::new(&config).unwrap())
}

// ── Collection ──────────────────────────────────────────────────────

#[tokio::test]
async fn collect_gathers_all_resources() {
    let server = MockServer::start().await;
    mount_classic_auth(&server).await;
    mount_all_resources(&server).await;

    let agg = local_aggregator(&server);
    let result = agg.collect().await.unwrap();

    assert_eq!(result.devices.len(), 1);
    assert_eq!(result.clients.len(), 1);
    assert_eq!(result.system.wifi_networks.as_ref().unwrap().len(), 1);
    assert_eq!(result.system.dhcp.as_ref().unwrap().len(), 1);
    assert_eq!(result.system.port_forwarding.as_ref().unwrap().len(), 1);
    assert!(result.network.is_some());
    assert_eq!(
        result.system.info.as_ref().unwrap().name.as_deref(),
        Some("Home Controller")
    );
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn collect_tolerates_individual_failures() {
    let server = MockServer::start().await;
    mount_classic_auth(&server).await;
    // Health breaks; everything else stays up. Mounted first so it
    // shadows the healthy mock below.
    Mock::given(method("GET"))
        .and(path(site_path("stat/health")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_all_resources(&server).await;

    let agg = local_aggregator(&server);
    let result = agg.collect().await.unwrap();

    assert_eq!(result.devices.len(), 1);
    assert!(result.network.is_none());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, "network_rates");
}

#[tokio::test]
async fn collect_fails_entirely_without_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let agg = local_aggregator(&server);
    assert!(matches!(
        agg.collect().await,
        Err(CoreError::AuthenticationFailed { .. })
    ));
}

#[tokio::test]
async fn concurrent_collects_share_one_batch() {
    let server = MockServer::start().await;
    mount_classic_auth(&server).await;
    // Slow the device endpoint down so the second caller arrives
    // mid-batch. Mounted before the general mocks so it matches first;
    // it serves exactly one request, proving the batch was shared.
    Mock::given(method("GET"))
        .and(path(site_path("stat/device")))
        .respond_with(
            envelope(json!([{ "_id": "d1" }])).set_delay(Duration::from_millis(100)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_all_resources(&server).await;

    let agg = local_aggregator(&server);
    let (a, b) = tokio::join!(agg.collect(), agg.collect());
    let (a, b) = (a.unwrap(), b.unwrap());

    // Same allocation, not merely equal contents.
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    // A collect after the batch settles starts a fresh one.
    let c = agg.collect().await.unwrap();
    assert!(!std::sync::Arc::ptr_eq(&a, &c));
}

#[tokio::test]
async fn sensitive_resources_are_withheld_when_the_session_lapses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    // One successful login for the batch; every re-login attempt fails.
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "unifises=abc123; Path=/; HttpOnly")
                .set_body_json(json!({ "meta": { "rc": "ok" }, "data": [] })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    // The DHCP fetch hits a dead session and recovery fails. Mounted
    // before the general mocks so it matches first.
    Mock::given(method("GET"))
        .and(path(site_path("rest/networkconf")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_all_resources(&server).await;

    let agg = local_aggregator(&server);
    let result = agg.collect().await.unwrap();

    // Non-sensitive data survives; sensitive data is withheld even
    // where the fetch itself succeeded.
    assert_eq!(result.devices.len(), 1);
    assert!(result.system.wifi_networks.is_some());
    assert!(result.system.dhcp.is_none());
    assert!(result.system.port_forwarding.is_none());
    assert!(result.failures.iter().any(|(name, _)| name == "network_configs"));
}

// ── Keep-alive ──────────────────────────────────────────────────────

#[tokio::test]
async fn keep_alive_pings_the_controller() {
    let server = MockServer::start().await;
    mount_classic_auth(&server).await;
    Mock::given(method("GET"))
        .and(path(site_path("stat/sysinfo")))
        .respond_with(envelope(json!([{ "name": "c" }])))
        .expect(1..)
        .mount(&server)
        .await;

    let agg = local_aggregator(&server);
    agg.controller().login().await.unwrap();

    let handle = agg
        .spawn_keep_alive(Duration::from_millis(50))
        .expect("local mode spawns a keep-alive");
    tokio::time::sleep(Duration::from_millis(180)).await;
    handle.stop().await;
}

#[tokio::test]
async fn keep_alive_is_not_spawned_for_cloud() {
    let server = MockServer::start().await;
    let mut config = ConnectionConfig::cloud(SecretString::from("key".to_string()));
    config.base_url = Some(Url::parse(&server.uri()).unwrap());
    let agg = StatsAggregator::new(Controller::new(&config).unwrap());

    assert!(agg.spawn_keep_alive(Duration::from_millis(50)).is_none());
}
