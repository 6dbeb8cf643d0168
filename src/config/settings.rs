//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub wizard: WizardConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

/// Which backend implementation serves tables and accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub backend: BackendKind,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Empty URL keeps drafts and revocations in process memory
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Session and sign-in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_seconds: u64,
    pub sign_in_max_attempts: u32,
    pub sign_in_window_seconds: u64,
    pub sign_in_burst: u32,
}

/// Registration wizard configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WizardConfig {
    pub draft_ttl_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub public_registration: bool,
    pub request_logging: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("HOSTELBRIDGE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::HostelBridgeError> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                allowed_origins: vec![],
            },
            database: DatabaseConfig {
                backend: BackendKind::Postgres,
                url: "postgresql://localhost/hostelbridge".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "hostelbridge:".to_string(),
                ttl_seconds: 3600,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                session_ttl_seconds: 60 * 60 * 12,
                sign_in_max_attempts: 5,
                sign_in_window_seconds: 300,
                sign_in_burst: 2,
            },
            wizard: WizardConfig {
                draft_ttl_seconds: 60 * 60 * 24,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
            },
            features: FeaturesConfig {
                public_registration: true,
                request_logging: true,
            },
        }
    }
}

impl Settings {
    /// Settings for tests and local development: in-memory backend and storage
    pub fn in_memory(jwt_secret: &str) -> Self {
        let mut settings = Settings::default();
        settings.database.backend = BackendKind::Memory;
        settings.database.url = String::new();
        settings.redis.url = String::new();
        settings.auth.jwt_secret = jwt_secret.to_string();
        settings.features.request_logging = false;
        settings
    }
}
