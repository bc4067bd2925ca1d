//! Routers mounted by `WebServer`: always-on common routes and the optional KV routes.

mod common;
mod kv;

pub use common::common_routes;
pub use kv::kv_routes;
