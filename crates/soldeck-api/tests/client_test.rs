#![allow(clippy::unwrap_used)]
// Integration tests for `HaClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use soldeck_api::{Error, HaClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HaClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token: secrecy::SecretString = "test-token".to_string().into();
    let client = HaClient::new(base_url, &token, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Auth & status ───────────────────────────────────────────────────

#[tokio::test]
async fn test_api_status_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
        .mount(&server)
        .await;

    let message = client.api_status().await.unwrap();
    assert_eq!(message, "API running.");
}

#[tokio::test]
async fn test_rejected_token_maps_to_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .mount(&server)
        .await;

    let result = client.api_status().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── State reads ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_state_returns_entity_with_unit() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states/sensor.solar_power"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "sensor.solar_power",
            "state": "1250.44",
            "attributes": { "unit_of_measurement": "W", "friendly_name": "Solar Power" },
            "last_updated": "2024-06-15T10:30:00+00:00"
        })))
        .mount(&server)
        .await;

    let state = client.get_state("sensor.solar_power").await.unwrap().unwrap();
    assert_eq!(state.entity_id, "sensor.solar_power");
    assert_eq!(state.state, "1250.44");
    assert_eq!(state.unit(), Some("W"));
    assert!(state.is_available());
}

#[tokio::test]
async fn test_get_state_missing_entity_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states/sensor.nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Entity not found."})))
        .mount(&server)
        .await;

    assert!(client.get_state("sensor.nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_state_unavailable_entity_is_returned_raw() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states/sensor.grid_power"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "sensor.grid_power",
            "state": "unavailable",
            "attributes": {}
        })))
        .mount(&server)
        .await;

    let state = client.get_state("sensor.grid_power").await.unwrap().unwrap();
    assert!(!state.is_available());
}

// ── Service registry ────────────────────────────────────────────────

#[tokio::test]
async fn test_domain_services_filters_by_domain() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "domain": "light",
                "services": { "turn_on": {}, "turn_off": {} }
            },
            {
                "domain": "esphome",
                "services": {
                    "solar_display_9f3ac1_update_display": {},
                    "other_node_restart": {}
                }
            }
        ])))
        .mount(&server)
        .await;

    let mut services = client.domain_services("esphome").await.unwrap();
    services.sort();
    assert_eq!(
        services,
        vec![
            "other_node_restart".to_owned(),
            "solar_display_9f3ac1_update_display".to_owned()
        ]
    );
}

#[tokio::test]
async fn test_domain_services_unknown_domain_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(client.domain_services("esphome").await.unwrap().is_empty());
}

// ── Service invocation ──────────────────────────────────────────────

#[tokio::test]
async fn test_call_service_posts_payload() {
    let (server, client) = setup().await;

    let payload = json!({ "solar": 1250.4, "page_num": 2 });

    Mock::given(method("POST"))
        .and(path("/api/services/esphome/solar_display_update_display"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .call_service("esphome", "solar_display_update_display", &payload)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_call_service_failure_surfaces_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/esphome/missing_service"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Service not found."))
        .mount(&server)
        .await;

    let result = client
        .call_service("esphome", "missing_service", &json!({}))
        .await;
    assert!(
        matches!(result, Err(Error::Api { status: 400, .. })),
        "expected Api error, got: {result:?}"
    );
}
