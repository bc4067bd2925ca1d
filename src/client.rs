//! Outbound HTTP façade over reqwest: base URL, default headers, JSON in and out.

use crate::config::HttpClientConfig;
use crate::error::AppError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one request. `data` is the parsed JSON body, or the raw text as a JSON string
/// when the body is not JSON (`Null` when empty).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
    pub success: bool,
}

pub struct HttpClient {
    client: Client,
    base_url: Option<String>,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            headers,
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        Self::new(&HttpClientConfig {
            base_url: Some(base_url.into()),
            ..HttpClientConfig::default()
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Sends `Authorization: <scheme> <token>` on every later request.
    pub fn set_auth_token(&mut self, token: &str, scheme: &str) -> Result<&mut Self, AppError> {
        let value = HeaderValue::from_str(&format!("{} {}", scheme, token))
            .map_err(|e| AppError::BadRequest(format!("authorization header: {}", e)))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, AppError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::BadRequest(format!("header name {}: {}", name, e)))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| AppError::BadRequest(format!("header {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Joins the base URL and `endpoint` with exactly one slash. Without a base URL the
    /// endpoint must already be absolute.
    pub fn url(&self, endpoint: &str) -> String {
        match &self.base_url {
            None => endpoint.to_string(),
            Some(_) if endpoint.starts_with("http://") || endpoint.starts_with("https://") => endpoint.to_string(),
            Some(base) if endpoint.is_empty() => base.clone(),
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
        }
    }

    pub async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<HttpResponse, AppError> {
        let request = self.request(Method::GET, endpoint).query(query);
        self.send(Method::GET, endpoint, request).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<HttpResponse, AppError> {
        self.send_json(Method::POST, endpoint, body).await
    }

    pub async fn put(&self, endpoint: &str, body: &Value) -> Result<HttpResponse, AppError> {
        self.send_json(Method::PUT, endpoint, body).await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<HttpResponse, AppError> {
        self.send_json(Method::PATCH, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<HttpResponse, AppError> {
        let request = self.request(Method::DELETE, endpoint);
        self.send(Method::DELETE, endpoint, request).await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(endpoint))
            .headers(self.headers.clone())
    }

    async fn send_json(&self, method: Method, endpoint: &str, body: &Value) -> Result<HttpResponse, AppError> {
        let request = self.request(method.clone(), endpoint).json(body);
        self.send(method, endpoint, request).await
    }

    async fn send(&self, method: Method, endpoint: &str, request: RequestBuilder) -> Result<HttpResponse, AppError> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, endpoint, status = status.as_u16(), "http request");
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let text = response.text().await?;
        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            data: parse_body(text),
            success: status.is_success(),
        })
    }
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
