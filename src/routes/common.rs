//! Common routes: index, health, version.

use axum::{routing::get, Json, Router};
use serde::Serialize;

pub const FRAMEWORK: &str = "fusion-sdk";

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /, GET /health, GET /version. `name` is the application name shown by the index route.
pub fn common_routes<S>(name: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let index = serde_json::json!({
        "message": format!("{} running", name),
        "status": "active",
        "framework": FRAMEWORK,
    });
    Router::new()
        .route("/", get(move || async move { Json(index) }))
        .route("/health", get(health))
        .route("/version", get(version))
}
