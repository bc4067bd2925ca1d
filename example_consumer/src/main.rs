//! Example consumer: a separate Rust project that uses fusion-sdk as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Or from this directory: `cargo run`
//!
//! Starts a server in the background, talks to it with the bundled HTTP client, then
//! shuts it down. Only crates re-exported by fusion-sdk are used for web and database work.

use fusion_sdk::axum::Json;
use fusion_sdk::util::{format_currency, hash_data, is_email, HashAlgorithm};
use fusion_sdk::{kv_routes, logging, AppState, Database, FusionConfig, HttpClient, HttpMethod, WebServer};
use serde_json::{json, Value};

async fn quote(Json(body): Json<Value>) -> Json<Value> {
    let amount = body["amount"].as_f64().unwrap_or_default();
    Json(json!({ "formatted": format_currency(amount, "$") }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = FusionConfig::from_env()?;
    logging::init(&config.logging);
    config.server.port = 0;

    let state = AppState::new(Database::in_memory()?);
    let mut server = WebServer::new("Example consumer").with_config(config.server.clone());
    server.route("/quote", &[HttpMethod::Post], quote)?;
    server.merge(kv_routes(state.db.clone()))?;
    let running = server.serve_background().await?;
    tracing::info!("Example consumer listening on {}", running.url());

    config.http.base_url = Some(running.url());
    let mut client = HttpClient::new(&config.http)?;
    client.set_header("X-Example", "consumer")?;

    let quoted = client.post("/quote", &json!({ "amount": 1234.5 })).await?;
    tracing::info!(status = quoted.status, data = %quoted.data, "quote");

    client.put("/kv/greeting", &json!({ "text": "hello" })).await?;
    let stored = client.get("/kv/greeting", &[]).await?;
    tracing::info!(data = %stored.data, "kv");

    let email = "ada@example.com";
    tracing::info!(
        email,
        valid = is_email(email),
        digest = %hash_data(email, HashAlgorithm::Sha256),
        "utils"
    );

    running.shutdown().await?;
    Ok(())
}
