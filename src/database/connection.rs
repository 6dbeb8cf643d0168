//! Database connection management

use std::sync::Arc;
use std::time::Duration;

use sqlx::{Pool, Postgres};

use crate::config::{BackendKind, DatabaseConfig as DatabaseSettings};
use crate::database::{Backend, MemoryBackend, PgBackend};
use crate::utils::errors::HostelBridgeError;

pub type DatabasePool = Pool<Postgres>;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/hostelbridge".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl From<&DatabaseSettings> for DatabaseConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            url: settings.url.clone(),
            max_connections: settings.max_connections,
            min_connections: settings.min_connections,
            ..Self::default()
        }
    }
}

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, HostelBridgeError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), HostelBridgeError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<(), HostelBridgeError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await?;

    Ok(())
}

/// Build the configured backend, connecting and migrating when it is PostgreSQL
pub async fn connect_backend(settings: &DatabaseSettings) -> Result<Arc<dyn Backend>, HostelBridgeError> {
    match settings.backend {
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
        BackendKind::Postgres => {
            let pool = create_pool(&DatabaseConfig::from(settings)).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgBackend::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert!(config.url.contains("postgresql://"));
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let mut settings = crate::config::Settings::default().database;
        settings.backend = BackendKind::Memory;
        let backend = connect_backend(&settings).await.unwrap();
        assert_eq!(backend.name(), "memory");
        assert!(backend.health_check().await.is_ok());
    }
}
