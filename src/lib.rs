//! fusion-sdk: one import surface for building small services.
//!
//! Re-exports [`axum`], [`reqwest`] and [`sqlx`] and adds thin façades over them: a lazily
//! opened SQLite [`Database`] with default-table bootstrap and bound-parameter CRUD, a
//! [`WebServer`] with explicit route registration, an [`HttpClient`] returning
//! [`HttpResponse`] values, plus the helpers in [`util`].

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod util;
pub mod web;

pub use axum;
pub use reqwest;
pub use sqlx;

pub use client::{HttpClient, HttpResponse};
pub use config::{DatabaseConfig, FusionConfig, HttpClientConfig, LoggingConfig, ServerConfig};
pub use error::{AppError, ConfigError, Result};
pub use routes::{common_routes, kv_routes};
pub use schema::{default_tables, ensure_tables, TableDescriptor};
pub use service::Database;
pub use sql::{Condition, Row};
pub use state::{AppState, SharedDatabase};
pub use store::Store;
pub use web::{BackgroundServer, HttpMethod, RouteInfo, RouteSet, WebServer};
