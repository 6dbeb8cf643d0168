//! PostgreSQL test database
//!
//! Starts a disposable PostgreSQL container and runs the migrations against
//! it. Needs a Docker daemon, so tests using it are `#[ignore]`d by default.

use std::sync::Arc;

use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

use HostelBridge::database::{create_pool, run_migrations, DatabaseConfig, PgBackend};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct TestDatabase {
    pub backend: Arc<PgBackend>,
    // Dropping the container stops it
    _container: ContainerAsync<Postgres>,
}

impl TestDatabase {
    pub async fn start() -> TestResult<Self> {
        let container = Postgres::default().start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;

        let config = DatabaseConfig {
            url: format!("postgres://postgres:postgres@{}:{}/postgres", host, port),
            max_connections: 5,
            ..DatabaseConfig::default()
        };
        let pool = create_pool(&config).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            backend: Arc::new(PgBackend::new(pool)),
            _container: container,
        })
    }
}
