//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Upstream secrets are optional here: the
//! server starts without them and generation requests fail with
//! `CONFIGURATION_ERROR` until they are provided.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub llm_api_key: Option<String>,
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub proposals_table: String,
    pub cors_allowed_origin: HeaderValue,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        // Empty values count as unset.
        let secret = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Language Model Gateway ---
        let llm_api_key = secret("LLM_API_KEY");
        let llm_api_base = var_or("LLM_API_BASE", "https://openrouter.ai/api/v1")
            .trim_end_matches('/')
            .to_string();
        let llm_model = var_or("LLM_MODEL", "openai/gpt-4o-mini");

        let timeout_str = var_or("LLM_TIMEOUT_SECS", "30");
        let llm_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LLM_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        // --- Record Store ---
        let store_url = secret("STORE_URL").map(|url| url.trim_end_matches('/').to_string());
        let store_api_key = secret("STORE_API_KEY");
        let proposals_table = var_or("PROPOSALS_TABLE", "flashcard_proposals");

        let cors_origin_str = var_or("CORS_ALLOWED_ORIGIN", "http://localhost:3000");
        let cors_allowed_origin = HeaderValue::from_str(&cors_origin_str).map_err(|e| {
            ConfigError::InvalidValue("CORS_ALLOWED_ORIGIN".to_string(), e.to_string())
        })?;

        Ok(Self {
            bind_address,
            log_level,
            llm_api_key,
            llm_api_base,
            llm_model,
            llm_timeout,
            store_url,
            store_api_key,
            proposals_table,
            cors_allowed_origin,
        })
    }

    /// Returns the name of the first missing upstream secret, if any.
    pub fn missing_secret(&self) -> Option<&'static str> {
        if self.llm_api_key.is_none() {
            Some("LLM_API_KEY")
        } else if self.store_url.is_none() {
            Some("STORE_URL")
        } else if self.store_api_key.is_none() {
            Some("STORE_API_KEY")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.proposals_table, "flashcard_proposals");
        assert_eq!(config.cors_allowed_origin, "http://localhost:3000");
        assert_eq!(config.missing_secret(), Some("LLM_API_KEY"));
    }

    #[test]
    fn secrets_and_urls_are_normalized() {
        let config = config_from(&[
            ("LLM_API_KEY", "sk-test"),
            ("LLM_API_BASE", "http://localhost:9000/v1/"),
            ("STORE_URL", "http://localhost:54321/"),
            ("STORE_API_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(config.llm_api_base, "http://localhost:9000/v1");
        assert_eq!(config.store_url.as_deref(), Some("http://localhost:54321"));
        assert_eq!(config.missing_secret(), None);
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let config = config_from(&[("LLM_API_KEY", "sk"), ("STORE_URL", "http://x"), ("STORE_API_KEY", " ")])
            .unwrap();
        assert_eq!(config.missing_secret(), Some("STORE_API_KEY"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            config_from(&[("BIND_ADDRESS", "nope")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"
        ));
        assert!(matches!(
            config_from(&[("LLM_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "LLM_TIMEOUT_SECS"
        ));
        assert!(matches!(
            config_from(&[("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "RUST_LOG"
        ));
    }
}
