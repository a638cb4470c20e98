use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ApiError;
use crate::rate_limiter::RateLimitSettings;

/// Service configuration, sourced from environment variables with defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Path of the JSON catalog file.
    pub catalog_path: PathBuf,
    /// Admission settings for the rate governor.
    pub rate_limit: RateLimitSettings,
    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            catalog_path: PathBuf::from("data/pokemons.json"),
            rate_limit: RateLimitSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset, and validates the result.
    pub fn from_env() -> Result<Self, ApiError> {
        let defaults = Config::default();

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|_| {
                ApiError::Configuration(format!("BIND_ADDR is not a socket address: {raw}"))
            })?,
            Err(_) => defaults.bind_addr,
        };

        let catalog_path = std::env::var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.catalog_path);

        let max_requests = parse_env("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests)?;
        let window_ms = parse_env(
            "RATE_LIMIT_WINDOW_MS",
            defaults.rate_limit.window.as_millis() as u64,
        )?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level);

        let config = Config {
            bind_addr,
            catalog_path,
            rate_limit: RateLimitSettings {
                max_requests,
                window: Duration::from_millis(window_ms),
            },
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.rate_limit.validate().map_err(ApiError::Configuration)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ApiError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ApiError::Configuration(format!("{name} is not a valid number: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut config = Config::default();
        config.rate_limit.window = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ApiError::Configuration(_))
        ));
    }
}
