//! Services module
//!
//! This module contains business logic services

pub mod aggregate;
pub mod applications;
pub mod auth;
pub mod dashboard;
pub mod donations;
pub mod management;
pub mod public;
pub mod registration;
pub mod session;

// Re-export commonly used services
pub use applications::{ApplicationService, ApplyRequest};
pub use auth::{AuthEvent, AuthService, Claims, SignInResponse};
pub use dashboard::DashboardService;
pub use donations::{DonateRequest, DonationService};
pub use management::{ManagedUser, ManagementService, Resource};
pub use public::{ContactForm, Portal, PublicService, TicketForm};
pub use registration::{DraftView, RegistrationService};
pub use session::{ListenerGuard, SessionContext, SessionSnapshot};

use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::state::{StateStorage, WizardManager};

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub storage: StateStorage,
    pub auth: AuthService,
    pub registration: RegistrationService,
    pub dashboards: DashboardService,
    pub applications: ApplicationService,
    pub donations: DonationService,
    pub management: ManagementService,
    pub public: PublicService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(database: DatabaseService, storage: StateStorage, settings: &Settings) -> Self {
        let auth = AuthService::new(database.clone(), storage.clone(), &settings.auth);
        let registration = RegistrationService::new(
            database.clone(),
            auth.clone(),
            storage.clone(),
            Arc::new(WizardManager::new()),
            settings.wizard.draft_ttl_seconds,
        );

        Self {
            dashboards: DashboardService::new(database.clone()),
            applications: ApplicationService::new(database.clone()),
            donations: DonationService::new(database.clone()),
            management: ManagementService::new(database.clone(), auth.clone()),
            public: PublicService::new(database.clone()),
            registration,
            auth,
            storage,
            database,
        }
    }

    /// A fresh session context for one request
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.auth.clone())
    }

    /// Health check for the backend and state storage
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let backend_healthy = self.database.backend().health_check().await.is_ok();
        let storage_healthy = self.storage.test_connection().await.is_ok();

        ServiceHealthStatus {
            backend: self.database.backend().name(),
            backend_healthy,
            storage: if self.storage.is_redis() { "redis" } else { "memory" },
            storage_healthy,
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub backend: &'static str,
    pub backend_healthy: bool,
    pub storage: &'static str,
    pub storage_healthy: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.backend_healthy && self.storage_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.backend_healthy {
            issues.push(format!("{} backend unreachable", self.backend));
        }
        if !self.storage_healthy {
            issues.push(format!("{} state storage unreachable", self.storage));
        }

        issues
    }
}
