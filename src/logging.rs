//! Console tracing setup.
//!
//! Filter precedence: `FUSION_LOG`, then `RUST_LOG`, then [`LoggingConfig::filter`].

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FUSION_LOG";

/// Install the global fmt subscriber. Returns false when one was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .try_init()
        .is_ok()
}

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|e| {
            eprintln!("invalid log filter {:?}: {}; using info", config.filter, e);
            EnvFilter::new("info")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_tolerated() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        assert!(!init(&config));
    }
}
