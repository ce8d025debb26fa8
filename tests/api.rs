use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use finance_dashboard::{
    config::Config,
    server::{router, AppState},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer, config: Config) -> Router {
    let config = Config {
        brokerage_url: format!("{}/api/v0", server.uri()),
        crypto_url: server.uri(),
        chat_url: server.uri(),
        ..config
    };
    router(Arc::new(AppState::new(config).unwrap()))
}

fn with_keys() -> Config {
    Config {
        brokerage_api_key: Some(String::from("t212-key")),
        chat_api_key: Some(String::from("sk-test")),
        ..Default::default()
    }
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(request).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn mount_brokerage(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v0/equity/metadata/instruments"))
        .and(header("authorization", "t212-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ticker": "AAPL_EQ", "currencyCode": "USD"},
            {"ticker": "BARC_EQ", "currencyCode": "GBX"}
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v0/equity/portfolio"))
        .and(header("authorization", "t212-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"ticker": "AAPL_EQ", "currentPrice": 200, "averagePrice": 180, "quantity": 3},
            {"ticker": "BARC_EQ", "currentPrice": 500, "averagePrice": 450, "quantity": 100}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_portfolio_is_normalized() {
    let server = MockServer::start().await;
    mount_brokerage(&server).await;

    let (status, body) = call(app(&server, with_keys()), get("/api/portfolio")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {
                "ticker": "AAPL_EQ",
                "currentPrice": 200.0,
                "averagePrice": 180.0,
                "quantity": 3,
                "priceCurrency": "USD",
                "normalizedFrom": null
            },
            {
                "ticker": "BARC_EQ",
                "currentPrice": 5.0,
                "averagePrice": 4.5,
                "quantity": 100,
                "priceCurrency": "GBP",
                "normalizedFrom": "GBX"
            }
        ])
    );
}

#[tokio::test]
async fn test_instruments_are_fetched_once() {
    let server = MockServer::start().await;
    mount_brokerage(&server).await;

    let app = app(&server, with_keys());
    for _ in 0..2 {
        let (status, _) = call(app.clone(), get("/api/portfolio")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = call(app, get("/api/instruments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"], json!(4));
    assert!(body["ageSeconds"].as_i64().is_some_and(|age| (0..60).contains(&age)));
    // instruments mock expects exactly one call, checked when the server drops
}

#[tokio::test]
async fn test_upstream_failure_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v0/equity/portfolio"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"code": "TooManyRequests"})),
        )
        .mount(&server)
        .await;

    let (status, body) = call(app(&server, with_keys()), get("/api/portfolio")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], json!("upstream_error"));
    assert_eq!(body["details"], json!({"code": "TooManyRequests"}));
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = call(app(&server, Config::default()), get("/api/cash")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("configuration_missing"));
}

#[tokio::test]
async fn test_crypto_prices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .and(query_param("ids", "bitcoin"))
        .and(query_param("vs_currencies", "gbp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bitcoin": {"gbp": 50000}})))
        .mount(&server)
        .await;

    let (status, body) = call(app(&server, with_keys()), get("/api/crypto?ids=Bitcoin")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"bitcoin": {"gbp": 50000}}));

    let (status, body) = call(app(&server, with_keys()), get("/api/crypto")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));
}

#[tokio::test]
async fn test_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Hello"}}]
        })))
        .mount(&server)
        .await;

    let request = Request::post("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"messages": [{"role": "user", "content": "hi"}]}).to_string(),
        ))
        .unwrap();
    let (status, body) = call(app(&server, with_keys()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"reply": "Hello", "model": "gpt-4o-mini"}));
}
