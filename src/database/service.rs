//! Database service layer
//!
//! This module provides a high-level interface to database operations

use std::sync::Arc;

use uuid::Uuid;

use crate::database::{Backend, Query, Repository};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct DatabaseService {
    backend: Arc<dyn Backend>,
    pub hostels: Repository<Hostel>,
    pub institutions: Repository<Institution>,
    pub students: Repository<Student>,
    pub applications: Repository<Application>,
    pub donors: Repository<Donor>,
    pub donations: Repository<Donation>,
    pub trustees: Repository<Trustee>,
    pub roles: Repository<UserRole>,
    pub scholarships: Repository<Scholarship>,
    pub tickets: Repository<Ticket>,
    pub contacts: Repository<ContactSubmission>,
    pub events: Repository<Event>,
    pub blog_posts: Repository<BlogPost>,
    pub podcasts: Repository<Podcast>,
    pub media: Repository<MediaItem>,
    pub press: Repository<PressRelease>,
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl DatabaseService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            hostels: Repository::new(backend.clone()),
            institutions: Repository::new(backend.clone()),
            students: Repository::new(backend.clone()),
            applications: Repository::new(backend.clone()),
            donors: Repository::new(backend.clone()),
            donations: Repository::new(backend.clone()),
            trustees: Repository::new(backend.clone()),
            roles: Repository::new(backend.clone()),
            scholarships: Repository::new(backend.clone()),
            tickets: Repository::new(backend.clone()),
            contacts: Repository::new(backend.clone()),
            events: Repository::new(backend.clone()),
            blog_posts: Repository::new(backend.clone()),
            podcasts: Repository::new(backend.clone()),
            media: Repository::new(backend.clone()),
            press: Repository::new(backend.clone()),
            backend,
        }
    }

    /// Raw backend, for account calls and health checks
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Take (`delta > 0`) or release (`delta < 0`) beds without crossing
    /// the hostel's capacity; `None` when the change does not fit
    pub async fn adjust_occupancy(&self, hostel_id: Uuid, delta: i32) -> Result<Option<Hostel>> {
        match self.backend.adjust_occupancy(hostel_id, delta).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Role row for a user, if any
    pub async fn find_role(&self, user_id: Uuid) -> Result<Option<UserRole>> {
        self.roles.find_one(Query::new().eq("user_id", user_id)).await
    }

    /// Student profile owned by a user
    pub async fn find_student_by_user(&self, user_id: Uuid) -> Result<Option<Student>> {
        self.students.find_one(Query::new().eq("user_id", user_id)).await
    }

    /// Donor profile owned by a user
    pub async fn find_donor_by_user(&self, user_id: Uuid) -> Result<Option<Donor>> {
        self.donors.find_one(Query::new().eq("user_id", user_id)).await
    }

    /// Hostels administered by a user
    pub async fn hostels_for_admin(&self, admin_id: Uuid) -> Result<Vec<Hostel>> {
        self.hostels.list(&Query::new().eq("admin_id", admin_id)).await
    }

    /// Institutions administered by a user
    pub async fn institutions_for_admin(&self, admin_id: Uuid) -> Result<Vec<Institution>> {
        self.institutions.list(&Query::new().eq("admin_id", admin_id)).await
    }
}
