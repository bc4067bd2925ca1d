//! HTTP handlers for the key-value store.

pub mod kv;
