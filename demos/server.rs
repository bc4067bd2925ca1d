//! Example server: config from env (FUSION_* / .env), default tables bootstrapped, a small users
//! API plus the KV and readiness routes.
//!
//! Run: `cargo run --example server`

use axum::extract::{Path, State};
use axum::Json;
use fusion_sdk::{
    kv_routes, logging, response, AppError, AppState, Condition, Database, FusionConfig,
    HttpMethod, Row, WebServer,
};

async fn list_users(State(state): State<AppState>) -> Result<impl axum::response::IntoResponse, AppError> {
    let users = state.db.lock().await.select("users", &Condition::always()).await?;
    Ok(response::list(users))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<Row>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = state.db.lock().await.insert("users", &body).await?;
    Ok(response::created(serde_json::json!({ "id": id })))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let removed = state.db.lock().await.delete("users", &Condition::eq("id", id)).await?;
    Ok(response::ok(serde_json::json!({ "deleted": removed })))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FusionConfig::from_env()?;
    logging::init(&config.logging);

    let db = Database::open_with(&config.database)?;
    let state = AppState::new(db);
    state.db.lock().await.bootstrap().await?;

    let mut server = WebServer::with_state("Fusion demo", state.clone()).with_config(config.server.clone());
    server
        .route("/users", &[HttpMethod::Get], list_users)?
        .route("/users", &[HttpMethod::Post], create_user)?
        .route("/users/:id", &[HttpMethod::Delete], delete_user)?
        .html("/about", "<h1>Fusion demo</h1><p>users, kv and health routes</p>")?;
    server.merge(kv_routes(state.db.clone()))?;

    for route in server.routes() {
        tracing::info!(path = %route.path, methods = ?route.methods, "route");
    }
    server.serve().await?;
    Ok(())
}
