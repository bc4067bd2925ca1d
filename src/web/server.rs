//! Web server façade over axum: explicit (path, method) -> handler registration.

use crate::config::ServerConfig;
use crate::error::{AppError, ConfigError};
use crate::routes::common_routes;
use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::http::Uri;
use axum::response::Html;
use axum::Json;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_ROUTES: &[&str] = &["/", "/health", "/version"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ConfigError::InvalidRoute(format!("unsupported method {}", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub path: String,
    pub methods: Vec<HttpMethod>,
}

pub struct WebServer<S = ()> {
    name: String,
    router: Router<S>,
    registry: BTreeMap<String, BTreeSet<HttpMethod>>,
    config: ServerConfig,
    state: S,
}

impl WebServer<()> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_state(name, ())
    }
}

impl<S> WebServer<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Server whose handlers may extract `State<S>`.
    pub fn with_state(name: impl Into<String>, state: S) -> Self {
        let name = name.into();
        let registry = DEFAULT_ROUTES
            .iter()
            .map(|p| (p.to_string(), BTreeSet::from([HttpMethod::Get])))
            .collect();
        WebServer {
            router: common_routes(&name),
            name,
            registry,
            config: ServerConfig::default(),
            state,
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register `handler` for every method in `methods` (GET when empty) on `path`.
    /// A (path, method) pair can be registered once.
    pub fn route<H, T>(&mut self, path: &str, methods: &[HttpMethod], handler: H) -> Result<&mut Self, AppError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let methods = method_set(methods);
        self.check_free(path, &methods)?;
        self.record(path, &methods);

        let method_router = methods
            .iter()
            .fold(MethodRouter::<S>::new(), |mr, m| mr.on(m.filter(), handler.clone()));
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(path, method_router);
        tracing::debug!(
            server = %self.name,
            path,
            methods = ?methods,
            "route registered"
        );
        Ok(self)
    }

    /// GET `path` answers with the JSON encoding of whatever `data` produces.
    pub fn api<F, Fut, T>(&mut self, path: &str, data: F) -> Result<&mut Self, AppError>
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.route(path, &[HttpMethod::Get], move || {
            let pending = data();
            async move { Json(pending.await) }
        })
    }

    /// Serve a fixed HTML document at GET `path`.
    pub fn html(&mut self, path: &str, template: impl Into<String>) -> Result<&mut Self, AppError> {
        let body = template.into();
        self.route(path, &[HttpMethod::Get], move || async move { Html(body) })
    }

    /// Mount a [`RouteSet`] (for example [`crate::routes::kv_routes`]). Its routes are checked
    /// against the ones already registered; on conflict nothing is mounted.
    pub fn merge(&mut self, set: RouteSet<S>) -> Result<&mut Self, AppError> {
        let mut claimed: BTreeMap<String, BTreeSet<HttpMethod>> = BTreeMap::new();
        for info in &set.routes {
            let methods = method_set(&info.methods);
            self.check_free(&info.path, &methods)?;
            let seen = claimed.entry(info.path.clone()).or_default();
            if let Some(dup) = methods.iter().find(|m| seen.contains(*m)) {
                return Err(duplicate(&info.path, *dup));
            }
            seen.extend(methods);
        }
        for (path, methods) in &claimed {
            self.record(path, methods);
        }
        let current = std::mem::replace(&mut self.router, Router::new());
        self.router = current.merge(set.router);
        tracing::debug!(server = %self.name, routes = set.routes.len(), "route set merged");
        Ok(self)
    }

    /// Registered routes, sorted by path.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.registry
            .iter()
            .map(|(path, methods)| RouteInfo {
                path: path.clone(),
                methods: methods.iter().copied().collect(),
            })
            .collect()
    }

    fn check_free(&self, path: &str, methods: &BTreeSet<HttpMethod>) -> Result<(), AppError> {
        if !path.starts_with('/') {
            return Err(ConfigError::InvalidRoute(format!("path must start with '/': {}", path)).into());
        }
        if let Some(registered) = self.registry.get(path) {
            if let Some(dup) = methods.iter().find(|m| registered.contains(*m)) {
                return Err(duplicate(path, *dup));
            }
        }
        let shape = route_shape(path);
        if let Some(other) = self.registry.keys().find(|p| p.as_str() != path && route_shape(p) == shape) {
            return Err(ConfigError::InvalidRoute(format!("{} conflicts with {}", path, other)).into());
        }
        Ok(())
    }

    fn record(&mut self, path: &str, methods: &BTreeSet<HttpMethod>) {
        self.registry
            .entry(path.to_string())
            .or_default()
            .extend(methods.iter().copied());
    }

    /// `server.body_limit_bytes` caps every request body, including the buffering done by
    /// extractors such as `Json`.
    pub fn into_router(self) -> Router {
        self.router
            .fallback(not_found)
            .layer(DefaultBodyLimit::max(self.config.body_limit_bytes))
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state)
    }

    /// Bind `server.host:server.port` and serve until the process exits.
    pub async fn serve(self) -> Result<(), AppError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        tracing::info!(
            server = %self.name,
            addr = %listener.local_addr()?,
            routes = self.registry.len(),
            "listening"
        );
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }

    /// Bind, then serve on a spawned task. With port 0 the OS picks the port;
    /// [`BackgroundServer::local_addr`] reports it.
    pub async fn serve_background(self) -> Result<BackgroundServer, AppError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(server = %self.name, addr = %local_addr, "listening in background");
        let (tx, rx) = oneshot::channel::<()>();
        let app = self.into_router();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });
        Ok(BackgroundServer {
            local_addr,
            shutdown: Some(tx),
            handle,
        })
    }
}

/// A router plus the (path, methods) table it serves, so [`WebServer::merge`] can detect
/// overlaps before axum would panic on them.
pub struct RouteSet<S = ()> {
    router: Router<S>,
    routes: Vec<RouteInfo>,
}

impl<S> RouteSet<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// `routes` must list every route `router` serves.
    pub fn new(router: Router<S>, routes: Vec<RouteInfo>) -> Self {
        RouteSet { router, routes }
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

fn method_set(methods: &[HttpMethod]) -> BTreeSet<HttpMethod> {
    if methods.is_empty() {
        BTreeSet::from([HttpMethod::Get])
    } else {
        methods.iter().copied().collect()
    }
}

fn duplicate(path: &str, method: HttpMethod) -> AppError {
    ConfigError::DuplicateRoute {
        path: path.to_string(),
        method: method.as_str(),
    }
    .into()
}

/// Path with parameter names erased: `/kv/:key` and `/kv/:id` share the shape `/kv/:`.
fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|seg| match seg.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => seg,
        })
        .collect::<Vec<_>>()
        .join("/")
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("route {}", uri.path()))
}

/// Handle to a server started with [`WebServer::serve_background`].
pub struct BackgroundServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl BackgroundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting connections, let in-flight requests finish, and wait for the task.
    pub async fn shutdown(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.handle.await {
            Ok(result) => result.map_err(AppError::from),
            Err(join) => Err(AppError::Io(std::io::Error::other(join.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn hello() -> &'static str {
        "hello"
    }

    #[test]
    fn duplicate_method_on_same_path_is_rejected() {
        let mut server = WebServer::new("dup");
        server.route("/users", &[HttpMethod::Get], hello).unwrap();
        server.route("/users", &[HttpMethod::Post], hello).unwrap();
        let err = server.route("/users", &[HttpMethod::Post, HttpMethod::Put], hello).err().unwrap();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::DuplicateRoute { method: "POST", .. })
        ));
        // The failed call registered nothing.
        let users = server.routes().into_iter().find(|r| r.path == "/users").unwrap();
        assert_eq!(users.methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn default_routes_are_taken() {
        let mut server = WebServer::new("defaults");
        assert!(server.route("/health", &[], hello).is_err());
        assert!(server.route("relative", &[], hello).is_err());
        let paths: Vec<String> = server.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/", "/health", "/version"]);
    }

    #[test]
    fn methods_parse_case_insensitively() {
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[tokio::test]
    async fn index_and_unknown_route() {
        let app = WebServer::new("MyApp").into_router();
        let res = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["message"], "MyApp running");
        assert_eq!(body["framework"], "fusion-sdk");

        let res = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let mut server = WebServer::new("m");
        server.route("/only-post", &[HttpMethod::Post], hello).unwrap();
        let res = server
            .into_router()
            .oneshot(Request::builder().uri("/only-post").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn html_route_serves_template() {
        let mut server = WebServer::new("h");
        server.html("/page", "<h1>hi</h1>").unwrap();
        let res = server
            .into_router()
            .oneshot(Request::builder().uri("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>hi</h1>");
    }

    fn hello_set() -> RouteSet {
        RouteSet::new(
            Router::new().route("/hello", axum::routing::get(hello)),
            vec![RouteInfo {
                path: "/hello".into(),
                methods: vec![HttpMethod::Get],
            }],
        )
    }

    #[test]
    fn route_after_merge_is_a_duplicate() {
        let mut server = WebServer::new("merged");
        server.merge(hello_set()).unwrap();
        let err = server.route("/hello", &[HttpMethod::Get], hello).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::DuplicateRoute { method: "GET", .. })));
        // Other methods on the merged path are still free.
        server.route("/hello", &[HttpMethod::Post], hello).unwrap();
    }

    #[test]
    fn merge_over_existing_route_mounts_nothing() {
        let mut server = WebServer::new("merged");
        server.route("/hello", &[], hello).unwrap();
        assert!(server.merge(hello_set()).is_err());
        assert!(server.merge(RouteSet::new(Router::new(), vec![RouteInfo {
            path: "/health".into(),
            methods: vec![HttpMethod::Get],
        }]))
        .is_err());
        assert_eq!(server.routes().len(), 4);
    }

    #[test]
    fn renamed_path_parameter_conflicts() {
        let mut server = WebServer::new("params");
        server.route("/items/:id", &[HttpMethod::Get], hello).unwrap();
        let err = server.route("/items/:key", &[HttpMethod::Put], hello).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidRoute(_))));
        assert_eq!(route_shape("/items/:id/*rest"), "/items/:/*");
    }

    #[tokio::test]
    async fn api_route_serializes_data() {
        let mut server = WebServer::new("api");
        server
            .api("/stats", || async { serde_json::json!({"users": 3, "ok": true}) })
            .unwrap();
        let res = server
            .into_router()
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"users": 3, "ok": true}));
    }
}
