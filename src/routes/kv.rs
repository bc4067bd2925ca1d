//! Key-value routes plus a readiness check that pings the database.

use crate::handlers::kv::{kv_delete, kv_get, kv_list_keys, kv_put};
use crate::state::{AppState, SharedDatabase};
use crate::web::{HttpMethod, RouteInfo, RouteSet};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    if let Err(e) = state.db.lock().await.ping().await {
        tracing::warn!(error = %e, "readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

fn route(path: &str, methods: &[HttpMethod]) -> RouteInfo {
    RouteInfo {
        path: path.to_string(),
        methods: methods.to_vec(),
    }
}

/// GET /ready, GET /kv, GET|PUT|DELETE /kv/:key.
pub fn kv_routes<S>(db: SharedDatabase) -> RouteSet<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = Router::new()
        .route("/ready", get(ready))
        .route("/kv", get(kv_list_keys))
        .route("/kv/:key", get(kv_get).put(kv_put).delete(kv_delete))
        .with_state(AppState { db });
    RouteSet::new(
        router,
        vec![
            route("/ready", &[HttpMethod::Get]),
            route("/kv", &[HttpMethod::Get]),
            route("/kv/:key", &[HttpMethod::Get, HttpMethod::Put, HttpMethod::Delete]),
        ],
    )
}
