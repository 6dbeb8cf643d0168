//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{HostelBridgeError, Result};
use super::{BackendKind, Settings};

/// Minimum HS256 secret length in bytes
const MIN_SECRET_LENGTH: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_wizard_config(&settings.wizard)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(HostelBridgeError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(HostelBridgeError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.backend == BackendKind::Memory {
        return Ok(());
    }

    if config.url.is_empty() {
        return Err(HostelBridgeError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(HostelBridgeError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(HostelBridgeError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if !config.url.is_empty() && !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
        return Err(HostelBridgeError::Config(
            format!("Invalid Redis URL: {}", config.url)
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(HostelBridgeError::Config(
            "Redis TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate session configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_SECRET_LENGTH {
        return Err(HostelBridgeError::Config(
            format!("JWT secret must be at least {} bytes", MIN_SECRET_LENGTH)
        ));
    }

    if config.session_ttl_seconds == 0 {
        return Err(HostelBridgeError::Config(
            "Session TTL must be greater than 0".to_string()
        ));
    }

    if config.sign_in_max_attempts == 0 || config.sign_in_window_seconds == 0 {
        return Err(HostelBridgeError::Config(
            "Sign-in rate limit must allow at least one attempt per window".to_string()
        ));
    }

    Ok(())
}

fn validate_wizard_config(config: &super::WizardConfig) -> Result<()> {
    if config.draft_ttl_seconds < 60 {
        return Err(HostelBridgeError::Config(
            "Wizard draft TTL must be at least 60 seconds".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(HostelBridgeError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(HostelBridgeError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_default_settings_need_secret() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.auth.jwt_secret = SECRET.to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_memory_backend_skips_database_url() {
        let settings = Settings::in_memory(SECRET);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_connection_bounds() {
        let mut settings = Settings::in_memory(SECRET);
        settings.database.backend = BackendKind::Postgres;
        settings.database.url = "postgresql://localhost/test".to_string();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::in_memory(SECRET);
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
