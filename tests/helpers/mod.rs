//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory application driven
//! through its router, generated registration data, and a PostgreSQL
//! container for backend tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
