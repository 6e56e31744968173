//! Configuration module for the chat service.
//!
//! Loads configuration from YAML files and environment variables.

use std::collections::BTreeMap;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::validation::FieldRules;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub validation: ValidationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Application settings: identity, secrets and sibling service URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Display name used in page titles.
    pub name: String,
    /// `http` or `https`.
    pub scheme: String,
    /// Domain session cookies are scoped to.
    pub domain: String,
    /// Shared secret for verifying session tokens.
    pub app_secret: String,
    /// Secret for verifying signed cookie envelopes.
    pub cookie_secret: String,
    pub auth_service_url: String,
    pub account_service_url: String,
    pub chat_service_url: String,
    pub cdn_url: String,
}

/// Form schemas, keyed by field name.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub employee: BTreeMap<String, FieldRules>,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CHAT__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with CHAT__ prefix
            .add_source(
                Environment::with_prefix("CHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Refuse to start without the values the gate depends on.
    fn check(&self) -> Result<(), ConfigError> {
        let required = [
            ("app.app_secret", &self.app.app_secret),
            ("app.cookie_secret", &self.app.cookie_secret),
            ("app.auth_service_url", &self.app.auth_service_url),
            ("app.domain", &self.app.domain),
            ("database.url", &self.database.url),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::NotFound(key.to_string()));
            }
        }

        if self.validation.employee.is_empty() {
            return Err(ConfigError::NotFound("validation.employee".to_string()));
        }

        Ok(())
    }
}

impl AppConfig {
    /// Whether cookies travel over TLS only.
    pub fn is_secure(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }
}
