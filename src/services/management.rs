//! Super-admin management screens
//!
//! Every managed resource supports list, create, update and delete over its
//! repository. Create and update answer with the refreshed list. Delete only
//! proceeds when the caller confirmed it.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::auth::AuthService;
use crate::database::{DatabaseService, Direction, Query, Record, Repository};
use crate::models::*;
use crate::utils::errors::{HostelBridgeError, Result, ValidationErrors};
use crate::utils::logging::log_admin_action;

/// Resources behind `/admin/{resource}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Scholarships,
    Hostels,
    Institutions,
    Tickets,
    Contacts,
    Events,
    Blogs,
    Podcasts,
    Media,
    Press,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Scholarships,
        Resource::Hostels,
        Resource::Institutions,
        Resource::Tickets,
        Resource::Contacts,
        Resource::Events,
        Resource::Blogs,
        Resource::Podcasts,
        Resource::Media,
        Resource::Press,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Scholarships => "scholarships",
            Resource::Hostels => "hostels",
            Resource::Institutions => "institutions",
            Resource::Tickets => "tickets",
            Resource::Contacts => "contacts",
            Resource::Events => "events",
            Resource::Blogs => "blogs",
            Resource::Podcasts => "podcasts",
            Resource::Media => "media",
            Resource::Press => "press",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = HostelBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| HostelBridgeError::NotFound {
                entity: "resource",
                id: s.to_string(),
            })
    }
}

/// A record type editable from the admin screens
pub trait Managed: Record {
    type Create: DeserializeOwned + Serialize;
    type Update: DeserializeOwned + Serialize;

    fn check_create(_request: &Self::Create, _errors: &mut ValidationErrors) {}

    fn check_update(_request: &Self::Update, _errors: &mut ValidationErrors) {}
}

fn non_blank(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if value.is_some_and(|v| v.trim().is_empty()) {
        errors.add(field, "This field is required");
    }
}

fn positive(errors: &mut ValidationErrors, field: &str, value: Option<i64>) {
    if value.is_some_and(|v| v <= 0) {
        errors.add(field, "Must be greater than zero");
    }
}

fn web_url(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    let valid = |v: &str| url::Url::parse(v).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
    if value.is_some_and(|v| !valid(v)) {
        errors.add(field, "Invalid URL");
    }
}

fn slug(errors: &mut ValidationErrors, value: Option<&str>) {
    let valid = |v: &str| {
        !v.is_empty()
            && !v.starts_with('-')
            && v.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };
    if value.is_some_and(|v| !valid(v)) {
        errors.add("slug", "Use lowercase letters, digits and hyphens");
    }
}

impl Managed for Scholarship {
    type Create = CreateScholarshipRequest;
    type Update = UpdateScholarshipRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
        positive(errors, "amount", Some(r.amount));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "title", r.title.as_deref());
        positive(errors, "amount", r.amount);
    }
}

impl Managed for Hostel {
    type Create = CreateHostelRequest;
    type Update = UpdateHostelRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "name", Some(&r.name));
        positive(errors, "capacity", Some(r.capacity as i64));
        if r.occupied_count < 0 || r.occupied_count > r.capacity {
            errors.add("occupied_count", "Must be between 0 and capacity");
        }
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "name", r.name.as_deref());
        positive(errors, "capacity", r.capacity.map(i64::from));
        if r.occupied_count.is_some_and(|o| o < 0) {
            errors.add("occupied_count", "Must not be negative");
        }
    }
}

impl Managed for Institution {
    type Create = CreateInstitutionRequest;
    type Update = UpdateInstitutionRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "name", Some(&r.name));
        if r.total_students < 0 || r.staff_count < 0 {
            errors.add("total_students", "Counts must not be negative");
        }
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "name", r.name.as_deref());
    }
}

impl Managed for Ticket {
    type Create = CreateTicketRequest;
    type Update = UpdateTicketRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "subject", Some(&r.subject));
        non_blank(errors, "description", Some(&r.description));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "subject", r.subject.as_deref());
    }
}

impl Managed for ContactSubmission {
    type Create = CreateContactRequest;
    type Update = UpdateContactRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "name", Some(&r.name));
        non_blank(errors, "message", Some(&r.message));
    }
}

impl Managed for Event {
    type Create = CreateEventRequest;
    type Update = UpdateEventRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "title", r.title.as_deref());
    }
}

impl Managed for BlogPost {
    type Create = CreateBlogPostRequest;
    type Update = UpdateBlogPostRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
        slug(errors, Some(&r.slug));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        non_blank(errors, "title", r.title.as_deref());
        slug(errors, r.slug.as_deref());
    }
}

impl Managed for Podcast {
    type Create = CreatePodcastRequest;
    type Update = UpdatePodcastRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
        web_url(errors, "audio_url", Some(&r.audio_url));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        web_url(errors, "audio_url", r.audio_url.as_deref());
    }
}

impl Managed for MediaItem {
    type Create = CreateMediaRequest;
    type Update = UpdateMediaRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
        web_url(errors, "url", Some(&r.url));
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        web_url(errors, "url", r.url.as_deref());
    }
}

impl Managed for PressRelease {
    type Create = CreatePressReleaseRequest;
    type Update = UpdatePressReleaseRequest;

    fn check_create(r: &Self::Create, errors: &mut ValidationErrors) {
        non_blank(errors, "title", Some(&r.title));
        web_url(errors, "url", r.url.as_deref());
    }

    fn check_update(r: &Self::Update, errors: &mut ValidationErrors) {
        web_url(errors, "url", r.url.as_deref());
    }
}

/// Run `$body` with `$repo` bound to the repository behind `$resource`
macro_rules! with_repository {
    ($database:expr, $resource:expr, |$repo:ident| $body:expr) => {
        match $resource {
            Resource::Scholarships => {
                let $repo = &$database.scholarships;
                $body
            }
            Resource::Hostels => {
                let $repo = &$database.hostels;
                $body
            }
            Resource::Institutions => {
                let $repo = &$database.institutions;
                $body
            }
            Resource::Tickets => {
                let $repo = &$database.tickets;
                $body
            }
            Resource::Contacts => {
                let $repo = &$database.contacts;
                $body
            }
            Resource::Events => {
                let $repo = &$database.events;
                $body
            }
            Resource::Blogs => {
                let $repo = &$database.blog_posts;
                $body
            }
            Resource::Podcasts => {
                let $repo = &$database.podcasts;
                $body
            }
            Resource::Media => {
                let $repo = &$database.media;
                $body
            }
            Resource::Press => {
                let $repo = &$database.press;
                $body
            }
        }
    };
}

fn parse_body<T: DeserializeOwned>(resource: Resource, body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| HostelBridgeError::InvalidInput(format!("Invalid {} payload: {}", resource, e)))
}

async fn list_all<T: Managed>(repo: &Repository<T>) -> Result<Value> {
    let rows = repo
        .list(&Query::new().order_by("created_at", Direction::Desc))
        .await?;
    Ok(serde_json::to_value(rows)?)
}

async fn create_one<T: Managed>(repo: &Repository<T>, resource: Resource, body: Value) -> Result<Uuid> {
    let request: T::Create = parse_body(resource, body)?;
    let mut errors = ValidationErrors::new();
    T::check_create(&request, &mut errors);
    errors.into_result()?;
    Ok(repo.create(&request).await?.id())
}

async fn update_one<T: Managed>(repo: &Repository<T>, resource: Resource, id: Uuid, body: Value) -> Result<()> {
    let request: T::Update = parse_body(resource, body)?;
    let mut errors = ValidationErrors::new();
    T::check_update(&request, &mut errors);
    if serde_json::to_value(&request)?.as_object().is_some_and(|o| o.is_empty()) {
        errors.add("body", "Nothing to update");
    }
    errors.into_result()?;
    repo.update(id, &request).await?;
    Ok(())
}

/// A user with an assigned role, as shown on the users screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub assigned_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct ManagementService {
    database: DatabaseService,
    auth: AuthService,
}

impl ManagementService {
    pub fn new(database: DatabaseService, auth: AuthService) -> Self {
        Self { database, auth }
    }

    /// All rows of a resource, newest first
    pub async fn list(&self, resource: Resource) -> Result<Value> {
        with_repository!(self.database, resource, |repo| list_all(repo).await)
    }

    pub async fn create(&self, admin: Uuid, resource: Resource, body: Value) -> Result<Value> {
        let id = with_repository!(self.database, resource, |repo| create_one(repo, resource, body).await)?;
        log_admin_action(admin, &format!("create_{}", resource), Some(&id.to_string()), None);
        self.list(resource).await
    }

    pub async fn update(&self, admin: Uuid, resource: Resource, id: Uuid, body: Value) -> Result<Value> {
        with_repository!(self.database, resource, |repo| update_one(repo, resource, id, body).await)?;
        log_admin_action(admin, &format!("update_{}", resource), Some(&id.to_string()), None);
        self.list(resource).await
    }

    /// Delete a row; without confirmation nothing is removed
    pub async fn delete(&self, admin: Uuid, resource: Resource, id: Uuid, confirmed: bool) -> Result<Value> {
        if !confirmed {
            return Err(HostelBridgeError::ConfirmationRequired {
                entity: resource.as_str(),
                id: id.to_string(),
            });
        }

        let removed = with_repository!(self.database, resource, |repo| repo.delete(id).await)?;
        if !removed {
            return Err(HostelBridgeError::NotFound {
                entity: resource.as_str(),
                id: id.to_string(),
            });
        }

        log_admin_action(admin, &format!("delete_{}", resource), Some(&id.to_string()), None);
        self.list(resource).await
    }

    /// Role assignments with the account email, newest first
    pub async fn users(&self) -> Result<Vec<ManagedUser>> {
        let roles = self
            .database
            .roles
            .list(&Query::new().order_by("created_at", Direction::Desc))
            .await?;

        let accounts = futures::future::try_join_all(
            roles
                .iter()
                .map(|r| self.database.backend().find_account(r.user_id)),
        )
        .await?;

        Ok(roles
            .into_iter()
            .zip(accounts)
            .map(|(role, account)| ManagedUser {
                user_id: role.user_id,
                email: account.map(|a| a.email),
                role: role.role,
                assigned_at: role.created_at,
            })
            .collect())
    }

    pub async fn assign_role(&self, admin: Uuid, user_id: Uuid, role: Role) -> Result<Vec<ManagedUser>> {
        if self.database.backend().find_account(user_id).await?.is_none() {
            return Err(HostelBridgeError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }

        self.auth.assign_role(user_id, role).await?;
        log_admin_action(admin, "assign_role", Some(&user_id.to_string()), Some(role.as_str()));
        self.users().await
    }

    /// Remove a user's role; admins cannot remove their own
    pub async fn remove_role(&self, admin: Uuid, user_id: Uuid, confirmed: bool) -> Result<Vec<ManagedUser>> {
        if !confirmed {
            return Err(HostelBridgeError::ConfirmationRequired {
                entity: "user role",
                id: user_id.to_string(),
            });
        }
        if admin == user_id {
            return Err(HostelBridgeError::InvalidInput(
                "You cannot remove your own role".to_string(),
            ));
        }

        if !self.auth.remove_role(user_id).await? {
            return Err(HostelBridgeError::NotFound {
                entity: "user role",
                id: user_id.to_string(),
            });
        }
        log_admin_action(admin, "remove_role", Some(&user_id.to_string()), None);
        self.users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::database::MemoryBackend;
    use crate::state::StateStorage;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> (AuthService, ManagementService) {
        let settings = Settings::in_memory("0123456789abcdef0123456789abcdef");
        let database = DatabaseService::new(Arc::new(MemoryBackend::new()));
        let auth = AuthService::new(
            database.clone(),
            StateStorage::in_memory(settings.redis.clone()),
            &settings.auth,
        );
        (auth.clone(), ManagementService::new(database, auth))
    }

    fn scholarship() -> Value {
        json!({
            "title": "Merit Scholarship",
            "description": "For toppers",
            "amount": 25000,
            "deadline": "2030-03-31",
            "eligibility": null,
            "status": "open"
        })
    }

    #[test]
    fn test_resource_names() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
        assert!("users".parse::<Resource>().is_err());
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let (_, service) = service();
        let admin = Uuid::new_v4();

        let list = service.create(admin, Resource::Scholarships, scholarship()).await.unwrap();
        let rows = list.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["amount"], json!(25000));
        assert_eq!(rows[0]["deadline"], json!("2030-03-31"));

        let id: Uuid = serde_json::from_value(rows[0]["id"].clone()).unwrap();
        let list = service
            .update(admin, Resource::Scholarships, id, json!({ "amount": 30000 }))
            .await
            .unwrap();
        assert_eq!(list[0]["amount"], json!(30000));
        assert_eq!(list[0]["title"], json!("Merit Scholarship"));

        let list = service.delete(admin, Resource::Scholarships, id, true).await.unwrap();
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_confirmation_removes_nothing() {
        let (_, service) = service();
        let admin = Uuid::new_v4();
        let list = service.create(admin, Resource::Scholarships, scholarship()).await.unwrap();
        let id: Uuid = serde_json::from_value(list[0]["id"].clone()).unwrap();

        assert_matches!(
            service.delete(admin, Resource::Scholarships, id, false).await,
            Err(HostelBridgeError::ConfirmationRequired { .. })
        );
        assert_eq!(service.list(Resource::Scholarships).await.unwrap().as_array().unwrap().len(), 1);

        assert_matches!(
            service.delete(admin, Resource::Scholarships, Uuid::new_v4(), true).await,
            Err(HostelBridgeError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_payload_validation() {
        let (_, service) = service();
        let admin = Uuid::new_v4();

        let mut bad = scholarship();
        bad["amount"] = json!(0);
        assert_matches!(
            service.create(admin, Resource::Scholarships, bad).await,
            Err(HostelBridgeError::Validation(fields)) if fields.contains("amount")
        );
        assert_matches!(
            service.create(admin, Resource::Scholarships, json!({ "title": "x" })).await,
            Err(HostelBridgeError::InvalidInput(_))
        );

        let media = json!({ "title": "Campus tour", "media_type": "video", "url": "ftp://files" });
        assert_matches!(
            service.create(admin, Resource::Media, media).await,
            Err(HostelBridgeError::Validation(fields)) if fields.contains("url")
        );
    }

    #[tokio::test]
    async fn test_user_role_management() {
        let (auth, service) = service();
        let admin = auth.sign_up("admin@example.org", "correct-horse").await.unwrap();
        let user = auth.sign_up("ravi@example.org", "correct-horse").await.unwrap();

        let users = service.assign_role(admin.id, user.id, Role::Trustee).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email.as_deref(), Some("ravi@example.org"));
        assert_eq!(users[0].role, Role::Trustee);

        let users = service.assign_role(admin.id, user.id, Role::Donor).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Donor);

        assert_matches!(
            service.assign_role(admin.id, Uuid::new_v4(), Role::Donor).await,
            Err(HostelBridgeError::NotFound { .. })
        );
        assert_matches!(
            service.remove_role(admin.id, user.id, false).await,
            Err(HostelBridgeError::ConfirmationRequired { .. })
        );
        assert!(service.remove_role(admin.id, user.id, true).await.unwrap().is_empty());
    }
}
