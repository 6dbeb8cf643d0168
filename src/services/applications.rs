//! Student applications to hostels and institutions

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{DatabaseService, Direction, Query};
use crate::models::*;
use crate::utils::errors::{HostelBridgeError, Result, ValidationErrors};
use crate::utils::logging::log_user_action;

/// Body of a new application
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyRequest {
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Statuses that still hold a place in a reviewer's queue
const OPEN_STATUSES: [ApplicationStatus; 2] = [ApplicationStatus::Pending, ApplicationStatus::UnderReview];

/// An application must name exactly one of a hostel or an institution
pub fn check_single_target(hostel_id: Option<Uuid>, institution_id: Option<Uuid>) -> Result<()> {
    let mut errors = ValidationErrors::new();
    match (hostel_id, institution_id) {
        (Some(_), None) | (None, Some(_)) => {}
        _ => errors.add("target", "Choose exactly one hostel or institution"),
    }
    errors.into_result()
}

#[derive(Debug, Clone)]
pub struct ApplicationService {
    database: DatabaseService,
}

impl ApplicationService {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    /// File an application for the student profile owned by `user_id`
    pub async fn apply(&self, user_id: Uuid, request: ApplyRequest) -> Result<Application> {
        check_single_target(request.hostel_id, request.institution_id)?;

        let student = self
            .database
            .find_student_by_user(user_id)
            .await?
            .ok_or_else(|| HostelBridgeError::NotFound {
                entity: "student profile",
                id: user_id.to_string(),
            })?;

        let mut open = Query::new()
            .eq("student_id", student.id)
            .one_of("status", OPEN_STATUSES);
        if let Some(hostel_id) = request.hostel_id {
            let hostel = self.database.hostels.get(hostel_id).await?;
            if hostel.status != OrganizationStatus::Active {
                return Err(HostelBridgeError::InvalidInput(format!(
                    "{} is not accepting applications",
                    hostel.name
                )));
            }
            open = open.eq("hostel_id", hostel_id);
        }
        if let Some(institution_id) = request.institution_id {
            let institution = self.database.institutions.get(institution_id).await?;
            if institution.status != OrganizationStatus::Active {
                return Err(HostelBridgeError::InvalidInput(format!(
                    "{} is not accepting applications",
                    institution.name
                )));
            }
            open = open.eq("institution_id", institution_id);
        }

        if self.database.applications.count(&open).await? > 0 {
            return Err(HostelBridgeError::InvalidInput(
                "You already have an open application there".to_string(),
            ));
        }

        let application = self
            .database
            .applications
            .create(&CreateApplicationRequest {
                student_id: student.id,
                hostel_id: request.hostel_id,
                institution_id: request.institution_id,
                status: ApplicationStatus::Pending,
                notes: request.notes,
            })
            .await?;

        log_user_action(user_id, "application_submitted", Some(&application.id.to_string()));
        Ok(application)
    }

    /// Applications of the student owned by `user_id`, newest first
    pub async fn for_student(&self, user_id: Uuid) -> Result<Vec<Application>> {
        let Some(student) = self.database.find_student_by_user(user_id).await? else {
            return Ok(Vec::new());
        };
        let query = Query::new()
            .eq("student_id", student.id)
            .order_by("created_at", Direction::Desc);
        self.database.applications.list(&query).await
    }

    /// Applications to the hostels administered by `admin_id`
    pub async fn for_hostel_admin(&self, admin_id: Uuid) -> Result<Vec<Application>> {
        let hostels = self.database.hostels_for_admin(admin_id).await?;
        let query = Query::new()
            .one_of("hostel_id", hostels.iter().map(|h| h.id))
            .order_by("created_at", Direction::Desc);
        self.database.applications.list(&query).await
    }

    /// Applications to the institutions administered by `admin_id`
    pub async fn for_institution_admin(&self, admin_id: Uuid) -> Result<Vec<Application>> {
        let institutions = self.database.institutions_for_admin(admin_id).await?;
        let query = Query::new()
            .one_of("institution_id", institutions.iter().map(|i| i.id))
            .order_by("created_at", Direction::Desc);
        self.database.applications.list(&query).await
    }

    async fn ensure_reviewer(&self, reviewer: Uuid, role: Role, application: &Application) -> Result<()> {
        let owns = match role {
            Role::SuperAdmin => true,
            Role::HostelAdmin => match application.hostel_id {
                Some(hostel_id) => self
                    .database
                    .hostels
                    .find_by_id(hostel_id)
                    .await?
                    .is_some_and(|h| h.admin_id == Some(reviewer)),
                None => false,
            },
            Role::InstitutionAdmin => match application.institution_id {
                Some(institution_id) => self
                    .database
                    .institutions
                    .find_by_id(institution_id)
                    .await?
                    .is_some_and(|i| i.admin_id == Some(reviewer)),
                None => false,
            },
            _ => false,
        };

        if owns {
            Ok(())
        } else {
            Err(HostelBridgeError::PermissionDenied(format!(
                "{} may not review application {}",
                reviewer, application.id
            )))
        }
    }

    /// Move an application to a new status.
    ///
    /// Approving a hostel application takes a bed with a conditional write,
    /// so concurrent approvals cannot overbook; it is refused when the hostel
    /// is full. If the status write fails the bed is released again.
    pub async fn set_status(
        &self,
        reviewer: Uuid,
        role: Role,
        application_id: Uuid,
        request: UpdateApplicationStatusRequest,
    ) -> Result<Application> {
        let application = self.database.applications.get(application_id).await?;
        self.ensure_reviewer(reviewer, role, &application).await?;

        if !application.status.can_transition_to(request.status) {
            return Err(HostelBridgeError::InvalidStateTransition {
                from: application.status.as_str().to_string(),
                to: request.status.as_str().to_string(),
            });
        }

        let mut bed_taken = None;
        if request.status == ApplicationStatus::Approved {
            if let Some(hostel_id) = application.hostel_id {
                let hostel = self.database.hostels.get(hostel_id).await?;
                if self.database.adjust_occupancy(hostel_id, 1).await?.is_none() {
                    return Err(HostelBridgeError::InvalidInput(format!("{} has no free beds", hostel.name)));
                }
                bed_taken = Some(hostel_id);
            }
        }

        let updated = match self.database.applications.update(application_id, &request).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(hostel_id) = bed_taken {
                    match self.database.adjust_occupancy(hostel_id, -1).await {
                        Ok(Some(_)) => {}
                        Ok(None) => warn!(hostel_id = %hostel_id, "No bed to release"),
                        Err(undo) => warn!(hostel_id = %hostel_id, error = %undo, "Failed to release bed"),
                    }
                }
                return Err(e);
            }
        };

        info!(
            application_id = %application_id,
            reviewer = %reviewer,
            from = application.status.as_str(),
            to = updated.status.as_str(),
            "Application status changed"
        );
        Ok(updated)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Fixture {
        database: DatabaseService,
        service: ApplicationService,
        student_user: Uuid,
        admin: Uuid,
        hostel: Hostel,
    }

    fn student_request(user_id: Uuid) -> CreateStudentRequest {
        CreateStudentRequest {
            user_id,
            first_name: "Asha".into(),
            middle_name: None,
            last_name: "Patil".into(),
            email: "asha@example.org".into(),
            phone: "9876543210".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2006, 4, 12).unwrap(),
            gender: "female".into(),
            address: "12 MG Road".into(),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411001".into(),
            education_level: "higher_secondary".into(),
            school_name: "Fergusson College".into(),
            board: "HSC".into(),
            percentage: None,
            guardian_name: "Suresh Patil".into(),
            guardian_phone: "9123456780".into(),
            annual_family_income: None,
        }
    }

    async fn fixture(capacity: i32, occupied: i32) -> Fixture {
        let database = DatabaseService::new(Arc::new(MemoryBackend::new()));
        let student_user = Uuid::new_v4();
        let admin = Uuid::new_v4();

        database.students.create(&student_request(student_user)).await.unwrap();

        let hostel = database
            .hostels
            .create(&CreateHostelRequest {
                name: "Sunrise Hostel".into(),
                hostel_type: "girls".into(),
                capacity,
                occupied_count: occupied,
                facilities: vec![],
                address: None,
                city: None,
                state: None,
                pincode: None,
                description: None,
                status: OrganizationStatus::Active,
                admin_id: Some(admin),
            })
            .await
            .unwrap();

        Fixture {
            service: ApplicationService::new(database.clone()),
            database,
            student_user,
            admin,
            hostel,
        }
    }

    fn to_hostel(hostel_id: Uuid) -> ApplyRequest {
        ApplyRequest {
            hostel_id: Some(hostel_id),
            ..Default::default()
        }
    }

    fn approve() -> UpdateApplicationStatusRequest {
        UpdateApplicationStatusRequest {
            status: ApplicationStatus::Approved,
            notes: Some("Welcome".into()),
        }
    }

    #[tokio::test]
    async fn test_apply_requires_single_target_and_refuses_duplicates() {
        let f = fixture(10, 0).await;

        let both = ApplyRequest {
            hostel_id: Some(f.hostel.id),
            institution_id: Some(Uuid::new_v4()),
            notes: None,
        };
        assert_matches!(f.service.apply(f.student_user, both).await, Err(HostelBridgeError::Validation(_)));
        assert_matches!(
            f.service.apply(f.student_user, ApplyRequest::default()).await,
            Err(HostelBridgeError::Validation(_))
        );

        let application = f.service.apply(f.student_user, to_hostel(f.hostel.id)).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_matches!(
            f.service.apply(f.student_user, to_hostel(f.hostel.id)).await,
            Err(HostelBridgeError::InvalidInput(_))
        );

        assert_eq!(f.service.for_student(f.student_user).await.unwrap().len(), 1);
        assert_eq!(f.service.for_hostel_admin(f.admin).await.unwrap().len(), 1);
        assert!(f.service.for_hostel_admin(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approval_takes_a_bed() {
        let f = fixture(2, 1).await;
        let application = f.service.apply(f.student_user, to_hostel(f.hostel.id)).await.unwrap();

        let approved = f
            .service
            .set_status(f.admin, Role::HostelAdmin, application.id, approve())
            .await
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert_eq!(approved.notes.as_deref(), Some("Welcome"));
        assert_eq!(f.database.hostels.get(f.hostel.id).await.unwrap().occupied_count, 2);

        let reject = UpdateApplicationStatusRequest {
            status: ApplicationStatus::Rejected,
            notes: None,
        };
        assert_matches!(
            f.service.set_status(f.admin, Role::HostelAdmin, application.id, reject).await,
            Err(HostelBridgeError::InvalidStateTransition { .. })
        );
    }

    #[tokio::test]
    async fn test_full_hostel_refuses_approval() {
        let f = fixture(1, 1).await;
        let application = f.service.apply(f.student_user, to_hostel(f.hostel.id)).await.unwrap();

        assert_matches!(
            f.service.set_status(f.admin, Role::HostelAdmin, application.id, approve()).await,
            Err(HostelBridgeError::InvalidInput(_))
        );
        let unchanged = f.database.applications.get(application.id).await.unwrap();
        assert_eq!(unchanged.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn test_only_the_owning_admin_reviews() {
        let f = fixture(5, 0).await;
        let application = f.service.apply(f.student_user, to_hostel(f.hostel.id)).await.unwrap();

        assert_matches!(
            f.service
                .set_status(Uuid::new_v4(), Role::HostelAdmin, application.id, approve())
                .await,
            Err(HostelBridgeError::PermissionDenied(_))
        );
        assert_matches!(
            f.service
                .set_status(f.admin, Role::InstitutionAdmin, application.id, approve())
                .await,
            Err(HostelBridgeError::PermissionDenied(_))
        );
        assert!(f
            .service
            .set_status(Uuid::new_v4(), Role::SuperAdmin, application.id, approve())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_approvals_cannot_overbook() {
        let f = fixture(1, 0).await;
        let other_student = Uuid::new_v4();
        f.database.students.create(&student_request(other_student)).await.unwrap();

        let first = f.service.apply(f.student_user, to_hostel(f.hostel.id)).await.unwrap();
        let second = f.service.apply(other_student, to_hostel(f.hostel.id)).await.unwrap();

        let (a, b) = tokio::join!(
            f.service.set_status(f.admin, Role::HostelAdmin, first.id, approve()),
            f.service.set_status(f.admin, Role::HostelAdmin, second.id, approve()),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(f.database.hostels.get(f.hostel.id).await.unwrap().occupied_count, 1);
    }
}
