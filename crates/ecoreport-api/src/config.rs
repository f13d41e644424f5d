//! Configuration management for the ecoreport API
//!
//! Loads configuration from environment variables with sensible defaults.
//! The JWT secret is deliberately *not* defaulted: startup fails fast when
//! it is missing instead of falling back to a weak hardcoded value.

use anyhow::{Context, Result};
use ecoreport_core::EnumPolicy;
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// SQLite connection string
    pub database_url: String,

    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,

    /// Directory where uploaded images are stored
    pub uploads_dir: PathBuf,

    /// Whether enumerated report fields are validated on write
    pub enum_policy: EnumPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an injected variable lookup, so the loading rules are
    /// testable without mutating process state.
    fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: get("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://ecoreport.db?mode=rwc".to_string()),

            jwt_secret: get("JWT_SECRET")
                .context("JWT_SECRET must be set; refusing to start with a default secret")?,

            uploads_dir: get("UPLOADS_DIR")
                .unwrap_or_else(|| "./public/uploads".to_string())
                .into(),

            enum_policy: match get("STRICT_ENUMS").as_deref() {
                Some("false") | Some("0") => EnumPolicy::Lenient,
                _ => EnumPolicy::Strict,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(())
    }

    /// Get the API server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the uploads directory exists
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads_dir).with_context(|| {
            format!(
                "Failed to create uploads directory: {}",
                self.uploads_dir.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            uploads_dir: PathBuf::from("./public/uploads"),
            enum_policy: EnumPolicy::Strict,
        }
    }

    #[test]
    fn test_bind_address() {
        let mut config = base_config();
        config.host = "127.0.0.1".to_string();
        config.port = 9000;

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = base_config();
        config.port = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("PORT must be greater than 0"));
    }

    #[test]
    fn test_validate_empty_secret() {
        let mut config = base_config();
        config.jwt_secret = String::new();

        assert!(config.validate().is_err());
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_missing_jwt_secret_fails_fast() {
        let result = Config::from_lookup(vars(&[("PORT", "8080")]));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_from_lookup_applies_defaults() {
        let config = Config::from_lookup(vars(&[("JWT_SECRET", "test-secret")])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.enum_policy, EnumPolicy::Strict);
    }

    #[test]
    fn test_strict_enums_opt_out() {
        let config = Config::from_lookup(vars(&[
            ("JWT_SECRET", "test-secret"),
            ("STRICT_ENUMS", "false"),
        ]))
        .unwrap();

        assert_eq!(config.enum_policy, EnumPolicy::Lenient);
    }
}
