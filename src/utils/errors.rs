//! Error handling for HostelBridge
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use std::collections::BTreeMap;
use thiserror::Error;

/// Main error type for HostelBridge application
#[derive(Error, Debug)]
pub enum HostelBridgeError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User already registered: {email}")]
    AlreadyRegistered { email: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Confirmation required to delete {entity} {id}")]
    ConfirmationRequired { entity: &'static str, id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Per-field validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field; the first message for a field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Turn the collected messages into a result
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(HostelBridgeError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Result type alias for HostelBridge operations
pub type Result<T> = std::result::Result<T, HostelBridgeError>;

impl From<config::ConfigError> for HostelBridgeError {
    fn from(error: config::ConfigError) -> Self {
        HostelBridgeError::Config(error.to_string())
    }
}

impl From<argon2::password_hash::Error> for HostelBridgeError {
    fn from(error: argon2::password_hash::Error) -> Self {
        HostelBridgeError::ServiceUnavailable(format!("password hashing failed: {}", error))
    }
}

impl HostelBridgeError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            HostelBridgeError::Database(_) => false,
            HostelBridgeError::Migration(_) => false,
            HostelBridgeError::Redis(_) => true,
            HostelBridgeError::Token(_) => false,
            HostelBridgeError::Config(_) => false,
            HostelBridgeError::NotAuthenticated => false,
            HostelBridgeError::PermissionDenied(_) => false,
            HostelBridgeError::AlreadyRegistered { .. } => false,
            HostelBridgeError::InvalidCredentials => false,
            HostelBridgeError::NotFound { .. } => false,
            HostelBridgeError::Validation(_) => false,
            HostelBridgeError::InvalidStateTransition { .. } => false,
            HostelBridgeError::ConfirmationRequired { .. } => true,
            HostelBridgeError::Cancelled => true,
            HostelBridgeError::Serialization(_) => false,
            HostelBridgeError::Io(_) => true,
            HostelBridgeError::RateLimitExceeded => true,
            HostelBridgeError::InvalidInput(_) => false,
            HostelBridgeError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HostelBridgeError::Database(_) => ErrorSeverity::Critical,
            HostelBridgeError::Migration(_) => ErrorSeverity::Critical,
            HostelBridgeError::Config(_) => ErrorSeverity::Critical,
            HostelBridgeError::NotAuthenticated => ErrorSeverity::Warning,
            HostelBridgeError::PermissionDenied(_) => ErrorSeverity::Warning,
            HostelBridgeError::InvalidCredentials => ErrorSeverity::Warning,
            HostelBridgeError::Token(_) => ErrorSeverity::Warning,
            HostelBridgeError::RateLimitExceeded => ErrorSeverity::Warning,
            HostelBridgeError::AlreadyRegistered { .. } => ErrorSeverity::Info,
            HostelBridgeError::Validation(_) => ErrorSeverity::Info,
            HostelBridgeError::InvalidInput(_) => ErrorSeverity::Info,
            HostelBridgeError::ConfirmationRequired { .. } => ErrorSeverity::Info,
            HostelBridgeError::NotFound { .. } => ErrorSeverity::Info,
            HostelBridgeError::Cancelled => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Short machine-readable kind, sent to clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            HostelBridgeError::NotAuthenticated | HostelBridgeError::Token(_) => "not_authenticated",
            HostelBridgeError::PermissionDenied(_) => "permission_denied",
            HostelBridgeError::AlreadyRegistered { .. } => "already_registered",
            HostelBridgeError::InvalidCredentials => "invalid_credentials",
            HostelBridgeError::NotFound { .. } => "not_found",
            HostelBridgeError::Validation(_) => "validation",
            HostelBridgeError::InvalidStateTransition { .. } => "invalid_transition",
            HostelBridgeError::ConfirmationRequired { .. } => "confirmation_required",
            HostelBridgeError::Cancelled => "cancelled",
            HostelBridgeError::RateLimitExceeded => "rate_limited",
            HostelBridgeError::InvalidInput(_) => "invalid_input",
            _ => "internal",
        }
    }

    /// Sanitized message that is safe to show to an end user.
    ///
    /// Backend, storage and token failures collapse into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            HostelBridgeError::AlreadyRegistered { .. } => {
                "This email is already registered. Please sign in instead.".to_string()
            }
            HostelBridgeError::InvalidCredentials => "Invalid email or password.".to_string(),
            HostelBridgeError::NotAuthenticated | HostelBridgeError::Token(_) => {
                "Please sign in to continue.".to_string()
            }
            HostelBridgeError::PermissionDenied(_) => {
                "You are not authorized to access this page.".to_string()
            }
            HostelBridgeError::NotFound { entity, .. } => format!("The requested {} was not found.", entity),
            HostelBridgeError::Validation(_) => "Please correct the highlighted fields.".to_string(),
            HostelBridgeError::InvalidStateTransition { .. } => {
                "This step cannot be completed right now.".to_string()
            }
            HostelBridgeError::ConfirmationRequired { entity, .. } => {
                format!("Please confirm that you want to delete this {}.", entity)
            }
            HostelBridgeError::Cancelled => "The request was cancelled.".to_string(),
            HostelBridgeError::RateLimitExceeded => {
                "Too many attempts. Please wait a moment and try again.".to_string()
            }
            HostelBridgeError::InvalidInput(message) => message.clone(),
            _ => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_sanitized() {
        let err = HostelBridgeError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.user_message(), "Something went wrong. Please try again later.");
        assert_eq!(err.kind(), "internal");

        let err = HostelBridgeError::AlreadyRegistered { email: "a@b.org".to_string() };
        assert!(err.user_message().contains("already registered"));
        assert!(!err.user_message().contains("a@b.org"));
    }

    #[test]
    fn test_validation_errors_first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email is required");
        errors.add("email", "Invalid email format");
        assert_eq!(errors.fields.get("email").map(String::as_str), Some("Email is required"));
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_severity() {
        assert_eq!(HostelBridgeError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(HostelBridgeError::RateLimitExceeded.severity(), ErrorSeverity::Warning);
        assert!(HostelBridgeError::Cancelled.is_recoverable());
    }
}
