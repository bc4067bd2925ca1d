//! Web server façade.

mod server;

pub use server::{BackgroundServer, HttpMethod, RouteInfo, RouteSet, WebServer};
