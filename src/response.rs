//! JSON envelopes for handler results: `{"data": ...}` for one value and
//! `{"data": [...], "meta": {"count": n}}` for lists. Errors use [`crate::error::ErrorBody`].

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub count: usize,
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);

/// 200 with one value.
pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(Envelope { data }))
}

/// 201 with the created value (for example `{"id": 7}`).
pub fn created<T: Serialize>(data: T) -> Reply<T> {
    (StatusCode::CREATED, Json(Envelope { data }))
}

/// 200 with a list and its length.
pub fn list<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<ListEnvelope<T>>) {
    let meta = ListMeta { count: data.len() };
    (StatusCode::OK, Json(ListEnvelope { data, meta }))
}
