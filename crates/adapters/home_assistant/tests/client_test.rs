// Integration tests for `HomeAssistantClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huemu_adapter_home_assistant::HomeAssistantClient;
use huemu_app::ports::HubPort;
use huemu_domain::config::HubSettings;
use huemu_domain::error::BridgeError;
use huemu_domain::hub::HubAction;

async fn setup() -> (MockServer, HomeAssistantClient) {
    let server = MockServer::start().await;
    let client = HomeAssistantClient::new(Duration::from_secs(2)).unwrap();
    client
        .configure(&HubSettings::new(server.uri(), "secret-token"))
        .unwrap();
    (server, client)
}

#[tokio::test]
async fn should_fetch_states_with_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "entity_id": "light.kitchen",
                "state": "on",
                "attributes": {"brightness": 127, "friendly_name": "Kitchen"},
                "last_changed": "2024-01-01T00:00:00+00:00"
            },
            {"entity_id": "sensor.outside", "state": "12.5"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let states = client.fetch_states().await.unwrap();

    assert_eq!(states.len(), 2);
    assert_eq!(states[0].entity_id, "light.kitchen");
    assert_eq!(states[0].number("brightness"), Some(127.0));
    assert!(states[1].attributes.is_empty());
}

#[tokio::test]
async fn should_list_entities_sorted_with_friendly_names() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"entity_id": "switch.garage", "state": "off", "attributes": {}},
            {"entity_id": "cover.blinds", "state": "open", "attributes": {"friendly_name": "Blinds"}}
        ])))
        .mount(&server)
        .await;

    let entities = client.list_entities().await.unwrap();

    assert_eq!(entities[0].entity_id, "cover.blinds");
    assert_eq!(entities[0].friendly_name, "Blinds");
    assert_eq!(entities[1].friendly_name, "switch.garage");
}

#[tokio::test]
async fn should_post_action_to_entity_domain() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({"entity_id": "light.kitchen", "brightness": 200})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let action = HubAction::new("turn_on")
        .with("entity_id", "light.kitchen")
        .with("brightness", 200);
    client.call_action("light.kitchen", &action).await.unwrap();
}

#[tokio::test]
async fn should_post_qualified_service_to_its_own_domain() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/services/script/turn_on"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let action = HubAction::new("script.turn_on").with("entity_id", "script.movie_night");
    client.call_action("light.tv", &action).await.unwrap();
}

#[tokio::test]
async fn should_map_error_status_to_hub_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
        .mount(&server)
        .await;

    let err = client.fetch_states().await.unwrap_err();

    assert!(matches!(err, BridgeError::Hub(_)));
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert!(source.contains("401"));
}

#[tokio::test]
async fn should_time_out_slow_hub() {
    let server = MockServer::start().await;
    let client = HomeAssistantClient::new(Duration::from_millis(100)).unwrap();
    client
        .configure(&HubSettings::new(server.uri(), "secret-token"))
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.fetch_states().await.unwrap_err();
    assert!(matches!(err, BridgeError::Hub(_)));
}
