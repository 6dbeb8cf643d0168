//! Registration wizards
//!
//! Drives student and hostel registration drafts through their steps and
//! performs the final submission. Submission writes several rows through the
//! backend, which has no cross-call transactions, so the writes run as a saga:
//! every completed write records how to undo it, and a failure undoes them in
//! reverse order before the error is returned.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::auth::AuthService;
use crate::database::{DatabaseService, Table};
use crate::models::{CreateHostelRequest, CreateStudentRequest, OrganizationStatus};
use crate::state::{RegistrationReceipt, StateStorage, WizardDraft, WizardKind, WizardManager};
use crate::utils::errors::{HostelBridgeError, Result};
use crate::utils::logging::log_registration_step;

/// Client view of a draft: secret fields masked, current step described
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub draft: WizardDraft,
    pub step_id: String,
    pub step_title: String,
    pub total_steps: u8,
}

/// Undo action for one completed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compensation {
    Account(Uuid),
    Row(Table, Uuid),
}

/// Completed writes of one submission, undone newest first on failure
struct Saga<'a> {
    auth: &'a AuthService,
    database: &'a DatabaseService,
    draft_id: Uuid,
    completed: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    fn new(auth: &'a AuthService, database: &'a DatabaseService, draft_id: Uuid) -> Self {
        Self {
            auth,
            database,
            draft_id,
            completed: Vec::new(),
        }
    }

    fn record(&mut self, compensation: Compensation) {
        self.completed.push(compensation);
    }

    /// Undo every recorded write. Undo failures are logged; the original
    /// error is what the caller reports.
    async fn compensate(self) {
        for compensation in self.completed.into_iter().rev() {
            let outcome = match compensation {
                Compensation::Row(table, id) => self.database.backend().delete(table, id).await,
                Compensation::Account(id) => self.auth.delete_account(id).await,
            };
            match outcome {
                Ok(_) => info!(draft_id = %self.draft_id, ?compensation, "Compensated registration write"),
                Err(e) => error!(
                    draft_id = %self.draft_id,
                    ?compensation,
                    error = %e,
                    "Failed to compensate registration write"
                ),
            }
        }
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    database: DatabaseService,
    auth: AuthService,
    storage: StateStorage,
    wizards: Arc<WizardManager>,
    draft_ttl: Duration,
}

impl std::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationService")
            .field("draft_ttl", &self.draft_ttl)
            .finish_non_exhaustive()
    }
}

impl RegistrationService {
    pub fn new(
        database: DatabaseService,
        auth: AuthService,
        storage: StateStorage,
        wizards: Arc<WizardManager>,
        draft_ttl_seconds: u64,
    ) -> Self {
        Self {
            database,
            auth,
            storage,
            wizards,
            draft_ttl: Duration::seconds(draft_ttl_seconds as i64),
        }
    }

    pub fn wizards(&self) -> &WizardManager {
        &self.wizards
    }

    /// Start a new draft at step 1
    pub async fn start(&self, kind: WizardKind) -> Result<DraftView> {
        let draft = WizardDraft::new(kind, self.draft_ttl);
        self.storage.save_draft(&draft).await?;
        log_registration_step(draft.draft_id, kind.as_str(), draft.step, "started");
        self.view(&draft)
    }

    /// Load a live draft of the given kind
    pub async fn load(&self, kind: WizardKind, draft_id: Uuid) -> Result<WizardDraft> {
        match self.storage.load_draft(draft_id).await? {
            Some(draft) if draft.wizard == kind && !draft.is_expired() => Ok(draft),
            _ => Err(HostelBridgeError::NotFound {
                entity: "registration draft",
                id: draft_id.to_string(),
            }),
        }
    }

    pub async fn resume(&self, kind: WizardKind, draft_id: Uuid) -> Result<DraftView> {
        let draft = self.load(kind, draft_id).await?;
        self.view(&draft)
    }

    /// Validate the current step's data and advance.
    ///
    /// Secret fields are checked but never written to the stored draft; they
    /// must accompany the final submit.
    pub async fn next(&self, kind: WizardKind, draft_id: Uuid, data: &Map<String, Value>) -> Result<DraftView> {
        let mut draft = self.load(kind, draft_id).await?;
        let step = draft.step;

        if let Err(e) = self.wizards.next(&mut draft, data) {
            log_registration_step(draft_id, kind.as_str(), step, "rejected");
            return Err(e);
        }

        draft.touch(self.draft_ttl);
        self.save_without_secrets(&draft).await?;
        log_registration_step(draft_id, kind.as_str(), step, "accepted");
        self.view(&draft)
    }

    /// Step back, keeping the collected data
    pub async fn back(&self, kind: WizardKind, draft_id: Uuid) -> Result<DraftView> {
        let mut draft = self.load(kind, draft_id).await?;
        self.wizards.back(&mut draft);
        draft.touch(self.draft_ttl);
        self.save_without_secrets(&draft).await?;
        log_registration_step(draft_id, kind.as_str(), draft.step, "back");
        self.view(&draft)
    }

    /// Submit the draft.
    ///
    /// `final_step` carries the last step's fields (including passwords) and is
    /// applied in memory only. Every step is re-validated before any write.
    pub async fn submit(
        &self,
        kind: WizardKind,
        draft_id: Uuid,
        final_step: Option<&Map<String, Value>>,
    ) -> Result<RegistrationReceipt> {
        let mut draft = self.load(kind, draft_id).await?;
        let step = draft.step;

        if let Some(data) = final_step {
            let wizard = self.wizards.get(kind)?;
            if draft.step != wizard.step_count() {
                return Err(HostelBridgeError::InvalidStateTransition {
                    from: format!("{}:{}", kind, draft.step),
                    to: "submit".to_string(),
                });
            }
            self.wizards.next(&mut draft, data)?;
        }

        if let Err(e) = self.wizards.validate_all(&draft) {
            log_registration_step(draft_id, kind.as_str(), step, "rejected");
            return Err(e);
        }

        let receipt = match kind {
            WizardKind::Student => self.register_student(&draft).await,
            WizardKind::Hostel => self.register_hostel(&draft).await,
        };
        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(e) => {
                log_registration_step(draft_id, kind.as_str(), step, "failed");
                return Err(e);
            }
        };

        self.storage.save_receipt(&receipt).await?;
        if let Err(e) = self.storage.delete_draft(draft_id).await {
            // The draft expires on its own
            warn!(draft_id = %draft_id, error = %e, "Failed to delete submitted draft");
        }

        log_registration_step(draft_id, kind.as_str(), step, "submitted");
        Ok(receipt)
    }

    /// Receipt for a submitted draft
    pub async fn receipt(&self, draft_id: Uuid) -> Result<RegistrationReceipt> {
        self.storage
            .load_receipt(draft_id)
            .await?
            .ok_or_else(|| HostelBridgeError::NotFound {
                entity: "registration",
                id: draft_id.to_string(),
            })
    }

    async fn register_student(&self, draft: &WizardDraft) -> Result<RegistrationReceipt> {
        let email: String = draft.require("email")?;
        let password: String = draft.require("password")?;

        let mut saga = Saga::new(&self.auth, &self.database, draft.draft_id);
        let result = async {
            let user = self.auth.sign_up(&email, &password).await?;
            saga.record(Compensation::Account(user.id));

            let request = CreateStudentRequest {
                user_id: user.id,
                first_name: draft.require("first_name")?,
                middle_name: draft.get_data("middle_name")?,
                last_name: draft.require("last_name")?,
                email: user.email.clone(),
                phone: draft.require("phone")?,
                date_of_birth: draft.require("date_of_birth")?,
                gender: draft.require("gender")?,
                address: draft.require("address")?,
                city: draft.require("city")?,
                state: draft.require("state")?,
                pincode: draft.require("pincode")?,
                education_level: draft.require("education_level")?,
                school_name: draft.require("school_name")?,
                board: draft.require("board")?,
                percentage: draft.get_data("percentage")?,
                guardian_name: draft.require("guardian_name")?,
                guardian_phone: draft.require("guardian_phone")?,
                annual_family_income: draft.get_data("annual_family_income")?,
            };
            let student = self.database.students.create(&request).await?;
            saga.record(Compensation::Row(Table::Students, student.id));

            let role = self.auth.assign_role(user.id, WizardKind::Student.role()).await?;
            saga.record(Compensation::Row(Table::UserRoles, role.id));

            Ok::<_, HostelBridgeError>(self.receipt_for(draft, user.id, student.full_name(), user.email))
        }
        .await;

        if result.is_err() {
            saga.compensate().await;
        }
        result
    }

    async fn register_hostel(&self, draft: &WizardDraft) -> Result<RegistrationReceipt> {
        let email: String = draft.require("email")?;
        let password: String = draft.require("password")?;
        let admin_name: String = draft.require("admin_name")?;

        let mut saga = Saga::new(&self.auth, &self.database, draft.draft_id);
        let result = async {
            let user = self.auth.sign_up(&email, &password).await?;
            saga.record(Compensation::Account(user.id));

            let request = CreateHostelRequest {
                name: draft.require("hostel_name")?,
                hostel_type: draft.require("hostel_type")?,
                capacity: draft.require("capacity")?,
                occupied_count: 0,
                facilities: draft.require("facilities")?,
                address: draft.get_data("address")?,
                city: draft.get_data("city")?,
                state: draft.get_data("state")?,
                pincode: draft.get_data("pincode")?,
                description: draft.get_data("description")?,
                status: OrganizationStatus::Pending,
                admin_id: Some(user.id),
            };
            let hostel = self.database.hostels.create(&request).await?;
            saga.record(Compensation::Row(Table::Hostels, hostel.id));

            let role = self.auth.assign_role(user.id, WizardKind::Hostel.role()).await?;
            saga.record(Compensation::Row(Table::UserRoles, role.id));

            Ok::<_, HostelBridgeError>(self.receipt_for(draft, user.id, admin_name.clone(), user.email))
        }
        .await;

        if result.is_err() {
            saga.compensate().await;
        }
        result
    }

    fn receipt_for(&self, draft: &WizardDraft, user_id: Uuid, name: String, email: String) -> RegistrationReceipt {
        let role = draft.wizard.role();
        info!(user_id = %user_id, role = %role, draft_id = %draft.draft_id, "Registration completed");
        RegistrationReceipt {
            draft_id: draft.draft_id,
            user_id,
            name,
            email,
            role,
            redirect: role.dashboard_route(),
            registered_at: Utc::now(),
        }
    }

    async fn save_without_secrets(&self, draft: &WizardDraft) -> Result<()> {
        let wizard = self.wizards.get(draft.wizard)?;
        let mut stored = draft.clone();
        for field in wizard.secret_fields() {
            stored.form_data.remove(field);
        }
        self.storage.save_draft(&stored).await
    }

    fn view(&self, draft: &WizardDraft) -> Result<DraftView> {
        let wizard = self.wizards.get(draft.wizard)?;
        let step = wizard.step(draft.step).ok_or_else(|| HostelBridgeError::InvalidStateTransition {
            from: format!("{}:{}", draft.wizard, draft.step),
            to: "view".to_string(),
        })?;
        Ok(DraftView {
            draft: draft.redacted(&wizard.secret_fields()),
            step_id: step.id.clone(),
            step_title: step.title.clone(),
            total_steps: wizard.step_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::database::{Backend, MemoryBackend, Query};
    use crate::models::{Account, CreateAccountRequest, Role};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    /// Memory backend that refuses inserts into one table
    struct FailingBackend {
        inner: Arc<MemoryBackend>,
        fail_on: Table,
    }

    #[async_trait]
    impl Backend for FailingBackend {
        async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
            self.inner.select(table, query).await
        }
        async fn insert(&self, table: Table, row: Value) -> Result<Value> {
            if table == self.fail_on {
                return Err(HostelBridgeError::ServiceUnavailable(format!("{} insert refused", table)));
            }
            self.inner.insert(table, row).await
        }
        async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value> {
            self.inner.update(table, id, patch).await
        }
        async fn delete(&self, table: Table, id: Uuid) -> Result<bool> {
            self.inner.delete(table, id).await
        }
        async fn count(&self, table: Table, query: &Query) -> Result<i64> {
            self.inner.count(table, query).await
        }
        async fn create_account(&self, request: CreateAccountRequest) -> Result<Account> {
            self.inner.create_account(request).await
        }
        async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
            self.inner.find_account_by_email(email).await
        }
        async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
            self.inner.find_account(id).await
        }
        async fn adjust_occupancy(&self, hostel_id: Uuid, delta: i32) -> Result<Option<Value>> {
            self.inner.adjust_occupancy(hostel_id, delta).await
        }
        async fn delete_account(&self, id: Uuid) -> Result<bool> {
            self.inner.delete_account(id).await
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn service_over(backend: Arc<dyn Backend>) -> (DatabaseService, RegistrationService) {
        let settings = Settings::in_memory("0123456789abcdef0123456789abcdef");
        let database = DatabaseService::new(backend);
        let storage = StateStorage::in_memory(settings.redis.clone());
        let auth = AuthService::new(database.clone(), storage.clone(), &settings.auth);
        let service = RegistrationService::new(
            database.clone(),
            auth,
            storage,
            Arc::new(WizardManager::new()),
            settings.wizard.draft_ttl_seconds,
        );
        (database, service)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn student_steps() -> Vec<Map<String, Value>> {
        vec![
            object(json!({
                "first_name": "Asha",
                "last_name": "Patil",
                "date_of_birth": "2006-04-12",
                "gender": "female"
            })),
            object(json!({
                "email": "Asha.Patil@example.org",
                "phone": "9876543210",
                "address": "12 MG Road",
                "city": "Pune",
                "state": "Maharashtra",
                "pincode": "411001"
            })),
            object(json!({
                "education_level": "higher_secondary",
                "school_name": "Fergusson College",
                "board": "HSC",
                "percentage": "86.4"
            })),
            object(json!({
                "guardian_name": "Suresh Patil",
                "guardian_phone": "9123456780",
                "annual_family_income": 240000
            })),
            object(json!({
                "password": "correct-horse",
                "confirm_password": "correct-horse",
                "agree_terms": true
            })),
        ]
    }

    async fn run_student_wizard(service: &RegistrationService) -> (Uuid, Result<RegistrationReceipt>) {
        let steps = student_steps();
        let view = service.start(WizardKind::Student).await.unwrap();
        let draft_id = view.draft.draft_id;
        for data in &steps[..4] {
            service.next(WizardKind::Student, draft_id, data).await.unwrap();
        }
        let result = service.submit(WizardKind::Student, draft_id, Some(&steps[4])).await;
        (draft_id, result)
    }

    #[tokio::test]
    async fn test_student_registration_writes_account_profile_and_role() {
        let memory = Arc::new(MemoryBackend::new());
        let (database, service) = service_over(memory.clone());

        let (draft_id, result) = run_student_wizard(&service).await;
        let receipt = result.unwrap();
        assert_eq!(receipt.name, "Asha Patil");
        assert_eq!(receipt.email, "asha.patil@example.org");
        assert_eq!(receipt.role, Role::Student);
        assert_eq!(receipt.redirect, "/student/dashboard");

        assert_eq!(memory.account_count().await, 1);
        let student = database.find_student_by_user(receipt.user_id).await.unwrap().unwrap();
        assert_eq!(student.percentage, Some(86.4));
        assert_eq!(student.annual_family_income, Some(240000));
        let role = database.find_role(receipt.user_id).await.unwrap().unwrap();
        assert_eq!(role.role, Role::Student);

        assert_eq!(service.receipt(draft_id).await.unwrap(), receipt);
        assert_matches!(
            service.resume(WizardKind::Student, draft_id).await,
            Err(HostelBridgeError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_passwords_are_not_stored_in_drafts() {
        let (_, service) = service_over(Arc::new(MemoryBackend::new()));
        let steps = student_steps();
        let draft_id = service.start(WizardKind::Student).await.unwrap().draft.draft_id;
        for data in &steps {
            service.next(WizardKind::Student, draft_id, data).await.unwrap();
        }

        let stored = service.load(WizardKind::Student, draft_id).await.unwrap();
        assert_eq!(stored.step, 5);
        assert!(!stored.form_data.contains_key("password"));
        assert_eq!(stored.form_data["agree_terms"], json!(true));

        // Without the final step's data the passwords are missing
        let err = service.submit(WizardKind::Student, draft_id, None).await.unwrap_err();
        assert_matches!(err, HostelBridgeError::Validation(fields) if fields.contains("password"));
    }

    #[tokio::test]
    async fn test_failed_profile_insert_leaves_nothing_behind() {
        let memory = Arc::new(MemoryBackend::new());
        let backend = Arc::new(FailingBackend {
            inner: memory.clone(),
            fail_on: Table::Students,
        });
        let (database, service) = service_over(backend);

        let (draft_id, result) = run_student_wizard(&service).await;
        assert_matches!(result, Err(HostelBridgeError::ServiceUnavailable(_)));

        assert_eq!(memory.account_count().await, 0);
        assert_eq!(database.roles.count(&Query::new()).await.unwrap(), 0);
        // The draft survives so the visitor can retry
        assert!(service.load(WizardKind::Student, draft_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_role_insert_compensates_in_reverse() {
        let memory = Arc::new(MemoryBackend::new());
        let backend = Arc::new(FailingBackend {
            inner: memory.clone(),
            fail_on: Table::UserRoles,
        });
        let (database, service) = service_over(backend);

        let (_, result) = run_student_wizard(&service).await;
        assert!(result.is_err());
        assert_eq!(memory.account_count().await, 0);
        assert_eq!(database.students.count(&Query::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_hostel_registration() {
        let (database, service) = service_over(Arc::new(MemoryBackend::new()));
        let draft_id = service.start(WizardKind::Hostel).await.unwrap().draft.draft_id;

        let steps = [
            json!({ "hostel_name": "Sunrise Girls Hostel", "hostel_type": "girls", "capacity": "120" }),
            json!({ "address": "4 Station Road", "city": "Nashik", "state": "Maharashtra", "pincode": "422001" }),
            json!({ "facilities": ["wifi", "mess", "library"] }),
        ];
        for data in steps {
            service.next(WizardKind::Hostel, draft_id, &object(data)).await.unwrap();
        }

        let account = object(json!({
            "admin_name": "Kavita Joshi",
            "email": "kavita@example.org",
            "phone": "9988776655",
            "password": "correct-horse",
            "confirm_password": "correct-horse",
            "agree_terms": "on"
        }));
        let receipt = service.submit(WizardKind::Hostel, draft_id, Some(&account)).await.unwrap();
        assert_eq!(receipt.name, "Kavita Joshi");
        assert_eq!(receipt.role, Role::HostelAdmin);

        let hostels = database.hostels_for_admin(receipt.user_id).await.unwrap();
        assert_eq!(hostels.len(), 1);
        assert_eq!(hostels[0].capacity, 120);
        assert_eq!(hostels[0].occupied_count, 0);
        assert_eq!(hostels[0].status, OrganizationStatus::Pending);
        assert_eq!(hostels[0].facilities.len(), 3);
    }

    #[tokio::test]
    async fn test_draft_kind_must_match_and_back_keeps_data() {
        let (_, service) = service_over(Arc::new(MemoryBackend::new()));
        let draft_id = service.start(WizardKind::Student).await.unwrap().draft.draft_id;

        assert_matches!(
            service.resume(WizardKind::Hostel, draft_id).await,
            Err(HostelBridgeError::NotFound { .. })
        );

        let first = &student_steps()[0];
        let view = service.next(WizardKind::Student, draft_id, first).await.unwrap();
        assert_eq!(view.draft.step, 2);
        assert_eq!(view.step_id, "contact");

        let view = service.back(WizardKind::Student, draft_id).await.unwrap();
        assert_eq!(view.draft.step, 1);
        assert_eq!(view.draft.form_data["first_name"], json!("Asha"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_before_any_write() {
        let memory = Arc::new(MemoryBackend::new());
        let (database, service) = service_over(memory.clone());

        run_student_wizard(&service).await.1.unwrap();
        let (_, second) = run_student_wizard(&service).await;
        assert_matches!(second, Err(HostelBridgeError::AlreadyRegistered { .. }));
        assert_eq!(memory.account_count().await, 1);
        assert_eq!(database.students.count(&Query::new()).await.unwrap(), 1);
    }
}
