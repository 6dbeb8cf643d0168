//! Database module
//!
//! This module handles the backend connection and data access

pub mod backend;
pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use backend::{Backend, Direction, Filter, Query, Record, Table};
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check, connect_backend};
pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use repositories::Repository;
pub use service::DatabaseService;
