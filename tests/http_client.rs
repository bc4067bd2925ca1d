use axum::http::{HeaderMap, StatusCode};
use axum::extract::Query;
use axum::Json;
use fusion_sdk::{HttpClient, HttpMethod, ServerConfig, WebServer};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"echo": body}))
}

async fn search(Query(params): Query<BTreeMap<String, String>>) -> Json<Value> {
    Json(json!({"params": params}))
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "authorization": header("authorization"),
        "user_agent": header("user-agent"),
        "accept": header("accept"),
        "trace": header("x-trace"),
    }))
}

async fn plain() -> &'static str {
    "just text"
}

async fn gone() -> StatusCode {
    StatusCode::GONE
}

async fn start() -> fusion_sdk::BackgroundServer {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let mut server = WebServer::new("Loopback").with_config(config);
    server
        .route("/echo", &[HttpMethod::Post, HttpMethod::Put], echo)
        .unwrap()
        .route("/search", &[], search)
        .unwrap()
        .route("/whoami", &[HttpMethod::Get], whoami)
        .unwrap()
        .route("/plain", &[HttpMethod::Get], plain)
        .unwrap()
        .route("/gone", &[HttpMethod::Delete], gone)
        .unwrap();
    server.serve_background().await.unwrap()
}

#[tokio::test]
async fn verbs_round_trip_json() {
    let server = start().await;
    let client = HttpClient::with_base_url(format!("{}/", server.url())).unwrap();

    let res = client.post("/echo", &json!({"a": 1})).await.unwrap();
    assert_eq!(res.status, 200);
    assert!(res.success);
    assert_eq!(res.data, json!({"echo": {"a": 1}}));
    assert_eq!(res.headers.get("content-type").map(String::as_str), Some("application/json"));

    let res = client.put("echo", &json!([1, 2])).await.unwrap();
    assert_eq!(res.data, json!({"echo": [1, 2]}));

    let res = client.get("/search", &[("q", "rust"), ("page", "2")]).await.unwrap();
    assert_eq!(res.data, json!({"params": {"page": "2", "q": "rust"}}));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn non_json_and_error_statuses() {
    let server = start().await;
    let client = HttpClient::with_base_url(server.url()).unwrap();

    let res = client.get("/plain", &[]).await.unwrap();
    assert!(res.success);
    assert_eq!(res.data, json!("just text"));

    let res = client.delete("/gone").await.unwrap();
    assert_eq!(res.status, 410);
    assert!(!res.success);

    let res = client.patch("/echo", &json!({})).await.unwrap();
    assert_eq!(res.status, 405);
    assert!(!res.success);

    let res = client.get("/missing", &[]).await.unwrap();
    assert_eq!(res.status, 404);
    assert_eq!(res.data["error"]["code"], "not_found");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn default_and_custom_headers_are_sent() {
    let server = start().await;
    let mut client = HttpClient::with_base_url(server.url()).unwrap();
    client.set_auth_token("s3cret", "Bearer").unwrap().set_header("X-Trace", "abc").unwrap();

    let res = client.get("/whoami", &[]).await.unwrap();
    assert_eq!(res.data["authorization"], "Bearer s3cret");
    assert_eq!(res.data["accept"], "application/json");
    assert_eq!(res.data["trace"], "abc");
    assert!(res.data["user_agent"].as_str().unwrap().starts_with("fusion-sdk/"));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn network_helpers_see_the_server() {
    let server = start().await;
    let addr = server.local_addr();
    assert!(fusion_sdk::util::is_port_open("127.0.0.1", addr.port(), Duration::from_secs(2)).await);
    assert!(fusion_sdk::util::check_connectivity(&format!("{}/health", server.url()), Duration::from_secs(5)).await);
    assert!(!fusion_sdk::util::check_connectivity(&format!("{}/missing", server.url()), Duration::from_secs(5)).await);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_host_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = HttpClient::with_base_url(format!("http://127.0.0.1:{}", port)).unwrap();
    assert!(matches!(client.get("/", &[]).await, Err(fusion_sdk::AppError::Http(_))));
}
