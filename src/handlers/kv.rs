//! KV store data API: list keys, get, set, delete over the `app_data` table.

use crate::error::AppError;
use crate::response::{list, ok};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// GET /kv: list keys and values.
pub async fn kv_list_keys(State(state): State<AppState>) -> Result<impl axum::response::IntoResponse, AppError> {
    let pairs = state.db.lock().await.kv_list().await?;
    let data: Vec<Value> = pairs
        .into_iter()
        .map(|(k, v)| serde_json::json!({ "key": k, "value": v }))
        .collect();
    Ok(list(data))
}

/// GET /kv/:key: get one value.
pub async fn kv_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let value = state
        .db
        .lock()
        .await
        .kv_get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("kv key: {}", key)))?;
    Ok(ok(value))
}

/// PUT /kv/:key: set value (upsert).
pub async fn kv_put(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.db.lock().await.kv_set(&key, &body).await?;
    Ok(ok(body))
}

/// DELETE /kv/:key: delete key.
pub async fn kv_delete(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let removed = state.db.lock().await.kv_delete(&key).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!("kv key: {}", key)));
    }
    Ok((StatusCode::NO_CONTENT, ()))
}
