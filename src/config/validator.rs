//! Config validation: values that deserialize fine but cannot work at runtime.

use crate::config::FusionConfig;
use crate::error::ConfigError;

pub fn validate(config: &FusionConfig) -> Result<(), ConfigError> {
    if config.database.path.trim().is_empty() {
        return Err(ConfigError::Validation("database.path must not be empty".into()));
    }
    if config.server.host.trim().is_empty() {
        return Err(ConfigError::Validation("server.host must not be empty".into()));
    }
    if config.server.body_limit_bytes == 0 {
        return Err(ConfigError::Validation("server.body_limit_bytes must be greater than 0".into()));
    }
    if config.http.timeout_secs == 0 {
        return Err(ConfigError::Validation("http.timeout_secs must be greater than 0".into()));
    }
    if let Some(base) = &config.http.base_url {
        let url = reqwest::Url::parse(base)
            .map_err(|e| ConfigError::Validation(format!("http.base_url '{}': {}", base, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "http.base_url '{}': scheme must be http or https",
                base
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate(&FusionConfig::default()).unwrap();
    }

    #[test]
    fn empty_db_path_fails() {
        let mut config = FusionConfig::default();
        config.database.path = "  ".into();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_http_base_url_fails() {
        let mut config = FusionConfig::default();
        config.http.base_url = Some("ftp://files.example.com".into());
        assert!(validate(&config).is_err());
        config.http.base_url = Some("not a url".into());
        assert!(validate(&config).is_err());
    }
}
