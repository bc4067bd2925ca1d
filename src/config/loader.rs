//! Load config from defaults, a JSON file, and `FUSION_*` environment variables.

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::path::Path;
use std::str::FromStr;

impl FusionConfig {
    /// Defaults overridden by environment variables (after loading `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = FusionConfig::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        validate(&config)?;
        Ok(config)
    }

    /// Read a JSON config file; absent sections and fields take their defaults.
    /// Environment variables are not consulted; call [`FusionConfig::apply_env`] for that.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let config: FusionConfig = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        validate(&config)?;
        Ok(config)
    }

    /// Override fields from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FUSION_DB_PATH") {
            self.database.path = v;
        }
        if let Some(v) = lookup("FUSION_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = parse_var("FUSION_DB_BUSY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("FUSION_DB_BOOTSTRAP") {
            self.database.bootstrap = parse_bool("FUSION_DB_BOOTSTRAP", &v)?;
        }
        if let Some(v) = lookup("FUSION_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("FUSION_PORT") {
            self.server.port = parse_var("FUSION_PORT", &v)?;
        }
        if let Some(v) = lookup("FUSION_BODY_LIMIT_BYTES") {
            self.server.body_limit_bytes = parse_var("FUSION_BODY_LIMIT_BYTES", &v)?;
        }
        if let Some(v) = lookup("FUSION_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_var("FUSION_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("FUSION_HTTP_BASE_URL") {
            self.http.base_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("FUSION_LOG") {
            self.logging.filter = v;
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
