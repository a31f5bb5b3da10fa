//! Integration tests for the rate-limited, authenticated gateway.
//!
//! Every test runs against a wiremock server standing in for both the token
//! endpoint and the API.

use std::time::Duration;

use collection_factory::{Gateway, GatewayConfig, GatewayError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::token_body;

fn config_for(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        api_base: format!("{}/api/v2", server.uri()),
        token_url: format!("{}/oauth/token", server.uri()),
        ..GatewayConfig::default()
    }
}

async fn mount_token(server: &MockServer, token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token, expires_in)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_gateway_exchanges_credentials_then_sends_bearer() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("client_id=42"))
        .and(body_string_contains("client_secret=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 86_400)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmapsets/123"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header(
            "user-agent",
            format!("collection-factory/{}", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 123})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    let body: serde_json::Value = gateway
        .get_json(&["beatmapsets", "123"], &[])
        .await
        .unwrap();

    assert_eq!(body["id"], 123);
    assert_eq!(gateway.credentials().refresh_count(), 1);
}

#[tokio::test]
async fn test_gateway_reuses_unexpired_credential() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 86_400)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmaps"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"beatmaps": []})))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    for _ in 0..3 {
        let _: serde_json::Value = gateway.get_json(&["beatmaps"], &[]).await.unwrap();
    }
    assert_eq!(gateway.credentials().refresh_count(), 1);
}

#[tokio::test]
async fn test_gateway_refreshes_expired_credential() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    // expires_in = 0 makes every cached credential stale on the next call
    mount_token(&server, "short-lived", 0).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmaps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"beatmaps": []})))
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    let _: serde_json::Value = gateway.get_json(&["beatmaps"], &[]).await.unwrap();
    let _: serde_json::Value = gateway.get_json(&["beatmaps"], &[]).await.unwrap();

    assert_eq!(gateway.credentials().refresh_count(), 2);
}

#[tokio::test]
async fn test_gateway_rejected_client_is_authentication_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmaps"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "wrong").unwrap();
    let err = gateway
        .get_json::<serde_json::Value>(&["beatmaps"], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Authentication { .. }), "{err}");
    assert!(err.to_string().contains("401"));
    assert_eq!(gateway.credentials().refresh_count(), 0);
}

#[tokio::test]
async fn test_gateway_token_response_without_token_is_authentication_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"token_type": "Bearer", "expires_in": 60})),
        )
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    let err = gateway
        .get_json::<serde_json::Value>(&["beatmaps"], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Authentication { .. }), "{err}");
}

#[tokio::test]
async fn test_gateway_retries_after_rate_limit() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    mount_token(&server, "tok-1", 86_400).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmapsets/7"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmapsets/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    let body: serde_json::Value = gateway.get_json(&["beatmapsets", "7"], &[]).await.unwrap();
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn test_gateway_gives_up_after_retry_budget() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    mount_token(&server, "tok-1", 86_400).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmapsets/7"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let config = GatewayConfig {
        max_rate_limit_retries: 1,
        ..config_for(&server)
    };
    let gateway = Gateway::new(&config, "42", "hunter2").unwrap();
    let err = gateway
        .get_json::<serde_json::Value>(&["beatmapsets", "7"], &[])
        .await
        .unwrap_err();

    assert!(
        matches!(err, GatewayError::RateLimited { attempts: 2, .. }),
        "{err}"
    );
}

#[tokio::test]
async fn test_gateway_error_status_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    mount_token(&server, "tok-1", 86_400).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmapsets/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = Gateway::new(&config_for(&server), "42", "hunter2").unwrap();
    let err = gateway
        .get_json::<serde_json::Value>(&["beatmapsets", "999"], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Status { status: 404, .. }), "{err}");
}

#[tokio::test]
async fn test_gateway_blocks_once_permits_are_spent() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    mount_token(&server, "tok-1", 86_400).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/beatmaps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"beatmaps": []})))
        .expect(2)
        .mount(&server)
        .await;

    // One permit for the token exchange, two for API calls.
    let config = GatewayConfig {
        permits: 3,
        window: Duration::from_secs(60),
        ..config_for(&server)
    };
    let gateway = Gateway::new(&config, "42", "hunter2").unwrap();
    for _ in 0..2 {
        let _: serde_json::Value = gateway.get_json(&["beatmaps"], &[]).await.unwrap();
    }
    assert_eq!(gateway.permits().available(), 0);

    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        gateway.get_json::<serde_json::Value>(&["beatmaps"], &[]),
    )
    .await;
    assert!(blocked.is_err(), "fourth call must wait for a returned permit");
}
