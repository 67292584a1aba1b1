//! Configuration management

use thiserror::Error;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// HS256 secret shared with Hasura for session tokens
    pub jwt_secret: String,
    /// CORS allowlist; empty allows no cross-origin callers
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: "must be at least 32 characters".to_string(),
            });
        }

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        Ok(Self {
            bind_address,
            jwt_secret,
            allowed_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "test-jwt-secret-key-for-testing-only-0123";

    fn clear_env() {
        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("BIND_ADDRESS");
        std::env::remove_var("ALLOWED_ORIGINS");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        std::env::set_var("JWT_SECRET", SECRET);

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert!(config.allowed_origins.is_empty());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_allowed_origins_parsed() {
        clear_env();
        std::env::set_var("JWT_SECRET", SECRET);
        std::env::set_var(
            "ALLOWED_ORIGINS",
            "https://partners.example.com, https://admin.example.com,,",
        );

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://partners.example.com", "https://admin.example.com"]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret() {
        clear_env();
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    #[serial]
    fn test_short_secret_rejected() {
        clear_env();
        std::env::set_var("JWT_SECRET", "short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "JWT_SECRET", .. })
        ));
        clear_env();
    }
}
