//! HostelBridge
//!
//! Multi-portal web service for a federation of boarding hostels and
//! institutions. Students apply, hostel and institution admins review,
//! trustees and donors follow where support goes, and a super admin manages
//! the site's content and user roles. Registration runs through resumable
//! multi-step wizards that finish in a single compensated submission.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{HostelBridgeError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use handlers::{create_router, AppState};
pub use services::ServiceFactory;
pub use state::{StateStorage, WizardManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
