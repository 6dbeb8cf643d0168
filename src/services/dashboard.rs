//! Role dashboards
//!
//! Each dashboard reads the rows scoped to the signed-in user, runs the
//! independent reads concurrently inside the caller's view scope, and
//! reduces them with the functions in [`super::aggregate`].

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::{average, count_where, distinct_non_null, rate, sum};
use crate::database::{DatabaseService, Direction, Query};
use crate::models::*;
use crate::state::ViewScope;
use crate::utils::errors::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub under_review: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn from_applications(applications: &[Application]) -> Self {
        let count = |status: ApplicationStatus| count_where(applications, |a| a.status == status);
        Self {
            pending: count(ApplicationStatus::Pending),
            under_review: count(ApplicationStatus::UnderReview),
            approved: count(ApplicationStatus::Approved),
            rejected: count(ApplicationStatus::Rejected),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub profile: Option<Student>,
    pub applications: Vec<Application>,
    pub status_counts: StatusCounts,
    pub open_scholarships: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostelDashboard {
    pub hostels: Vec<Hostel>,
    pub total_capacity: i64,
    pub occupied: i64,
    pub available: i64,
    pub occupancy_rate: f64,
    pub pending_applications: usize,
    pub total_donations: i64,
    pub donor_count: usize,
    pub trustee_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstitutionDashboard {
    pub institutions: Vec<Institution>,
    pub total_students: i64,
    pub total_staff: i64,
    pub department_count: usize,
    pub applications: usize,
    pub pending_applications: usize,
    pub total_donations: i64,
    pub trustee_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrusteeDashboard {
    pub trustees: Vec<Trustee>,
    pub hostels: Vec<Hostel>,
    pub institutions: Vec<Institution>,
    pub average_compliance: Option<f64>,
    pub donations_received: i64,
    pub donation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonorDashboard {
    pub donor: Option<Donor>,
    pub donations: Vec<Donation>,
    pub total_donated: i64,
    pub donation_count: usize,
    pub hostels_supported: usize,
    pub institutions_supported: usize,
    pub impact_level: ImpactLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub hostels: i64,
    pub institutions: i64,
    pub students: i64,
    pub donors: i64,
    pub applications: i64,
    pub total_donations: i64,
    pub open_tickets: i64,
    pub users_per_role: BTreeMap<Role, usize>,
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    items.iter().map(id).collect()
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    database: DatabaseService,
}

impl DashboardService {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    pub async fn student(&self, user_id: Uuid, scope: &ViewScope) -> Result<StudentDashboard> {
        let db = &self.database;
        let open = Query::new().eq("status", ScholarshipStatus::Open);
        let (profile, scholarships) = futures::try_join!(
            scope.run(db.find_student_by_user(user_id)),
            scope.run(db.scholarships.list(&open)),
        )?;

        let applications = match &profile {
            Some(student) => {
                let query = Query::new()
                    .eq("student_id", student.id)
                    .order_by("created_at", Direction::Desc);
                scope.run(db.applications.list(&query)).await?
            }
            None => Vec::new(),
        };

        let today = Utc::now().date_naive();
        Ok(StudentDashboard {
            status_counts: StatusCounts::from_applications(&applications),
            open_scholarships: count_where(&scholarships, |s| s.deadline >= today),
            profile,
            applications,
        })
    }

    pub async fn hostel_admin(&self, user_id: Uuid, scope: &ViewScope) -> Result<HostelDashboard> {
        let db = &self.database;
        let hostels = scope.run(db.hostels_for_admin(user_id)).await?;
        let hostel_ids = ids(&hostels, |h| h.id);

        let linked = Query::new().one_of("hostel_id", hostel_ids);
        let (applications, donations, trustees) = futures::try_join!(
            scope.run(db.applications.list(&linked)),
            scope.run(db.donations.list(&linked)),
            scope.run(db.trustees.list(&linked)),
        )?;

        let total_capacity = sum(&hostels, |h| h.capacity as i64);
        let occupied = sum(&hostels, |h| h.occupied_count as i64);

        Ok(HostelDashboard {
            total_capacity,
            occupied,
            available: sum(&hostels, |h| h.available_beds() as i64),
            occupancy_rate: rate(occupied, total_capacity),
            pending_applications: count_where(&applications, |a| a.status == ApplicationStatus::Pending),
            total_donations: sum(&donations, |d| d.amount),
            donor_count: distinct_non_null(&donations, |d| Some(d.donor_id)),
            trustee_count: trustees.len(),
            hostels,
        })
    }

    pub async fn institution_admin(&self, user_id: Uuid, scope: &ViewScope) -> Result<InstitutionDashboard> {
        let db = &self.database;
        let institutions = scope.run(db.institutions_for_admin(user_id)).await?;
        let institution_ids = ids(&institutions, |i| i.id);

        let linked = Query::new().one_of("institution_id", institution_ids);
        let (applications, donations, trustees) = futures::try_join!(
            scope.run(db.applications.list(&linked)),
            scope.run(db.donations.list(&linked)),
            scope.run(db.trustees.list(&linked)),
        )?;

        Ok(InstitutionDashboard {
            total_students: sum(&institutions, |i| i.total_students as i64),
            total_staff: sum(&institutions, |i| i.staff_count as i64),
            department_count: institutions.iter().map(|i| i.departments.len()).sum(),
            applications: applications.len(),
            pending_applications: count_where(&applications, |a| a.status == ApplicationStatus::Pending),
            total_donations: sum(&donations, |d| d.amount),
            trustee_count: trustees.len(),
            institutions,
        })
    }

    pub async fn trustee(&self, user_id: Uuid, scope: &ViewScope) -> Result<TrusteeDashboard> {
        let db = &self.database;
        let trustees = scope
            .run(db.trustees.list(&Query::new().eq("user_id", user_id)))
            .await?;

        let hostel_ids: Vec<Uuid> = trustees.iter().filter_map(|t| t.hostel_id).collect();
        let institution_ids: Vec<Uuid> = trustees.iter().filter_map(|t| t.institution_id).collect();

        let hostel_query = Query::new().one_of("id", hostel_ids.clone());
        let institution_query = Query::new().one_of("id", institution_ids.clone());
        let hostel_donations = Query::new().one_of("hostel_id", hostel_ids);
        let institution_donations = Query::new().one_of("institution_id", institution_ids);
        let (hostels, institutions, hostel_donations, institution_donations) = futures::try_join!(
            scope.run(db.hostels.list(&hostel_query)),
            scope.run(db.institutions.list(&institution_query)),
            scope.run(db.donations.list(&hostel_donations)),
            scope.run(db.donations.list(&institution_donations)),
        )?;

        let donations: Vec<Donation> = hostel_donations.into_iter().chain(institution_donations).collect();

        Ok(TrusteeDashboard {
            average_compliance: average(&trustees, |t| t.compliance_score),
            donations_received: sum(&donations, |d| d.amount),
            donation_count: donations.len(),
            trustees,
            hostels,
            institutions,
        })
    }

    pub async fn donor(&self, user_id: Uuid, scope: &ViewScope) -> Result<DonorDashboard> {
        let db = &self.database;
        let donor = scope.run(db.find_donor_by_user(user_id)).await?;

        let donations = match &donor {
            Some(donor) => {
                let query = Query::new()
                    .eq("donor_id", donor.id)
                    .order_by("created_at", Direction::Desc);
                scope.run(db.donations.list(&query)).await?
            }
            None => Vec::new(),
        };

        let total_donated = sum(&donations, |d| d.amount);
        Ok(DonorDashboard {
            total_donated,
            donation_count: donations.len(),
            hostels_supported: distinct_non_null(&donations, |d| d.hostel_id),
            institutions_supported: distinct_non_null(&donations, |d| d.institution_id),
            impact_level: ImpactLevel::for_total(total_donated),
            donor,
            donations,
        })
    }

    pub async fn super_admin(&self, scope: &ViewScope) -> Result<AdminDashboard> {
        let db = &self.database;
        let all = Query::new();
        let open_tickets = Query::new().eq("status", TicketStatus::Open);

        let (hostels, institutions, students, donors, applications, donations, open_tickets, roles) = futures::try_join!(
            scope.run(db.hostels.count(&all)),
            scope.run(db.institutions.count(&all)),
            scope.run(db.students.count(&all)),
            scope.run(db.donors.count(&all)),
            scope.run(db.applications.count(&all)),
            scope.run(db.donations.list(&all)),
            scope.run(db.tickets.count(&open_tickets)),
            scope.run(db.roles.list(&all)),
        )?;

        let mut users_per_role = BTreeMap::new();
        for role in Role::ALL {
            users_per_role.insert(role, count_where(&roles, |r| r.role == role));
        }

        Ok(AdminDashboard {
            hostels,
            institutions,
            students,
            donors,
            applications,
            total_donations: sum(&donations, |d| d.amount),
            open_tickets,
            users_per_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use std::sync::Arc;

    fn service() -> (DatabaseService, DashboardService) {
        let database = DatabaseService::new(Arc::new(MemoryBackend::new()));
        (database.clone(), DashboardService::new(database))
    }

    async fn hostel(db: &DatabaseService, admin_id: Uuid, capacity: i32, occupied: i32) -> Hostel {
        db.hostels
            .create(&CreateHostelRequest {
                name: "Sunrise Hostel".to_string(),
                hostel_type: "girls".to_string(),
                capacity,
                occupied_count: occupied,
                facilities: vec!["wifi".to_string()],
                address: None,
                city: Some("Pune".to_string()),
                state: None,
                pincode: None,
                description: None,
                status: OrganizationStatus::Active,
                admin_id: Some(admin_id),
            })
            .await
            .unwrap()
    }

    async fn donate(db: &DatabaseService, donor_id: Uuid, hostel_id: Option<Uuid>, amount: i64) {
        db.donations
            .create(&CreateDonationRequest {
                donor_id,
                hostel_id,
                institution_id: None,
                amount,
                purpose: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_donor_dashboard_aggregates() {
        let (db, dashboards) = service();
        let user_id = Uuid::new_v4();
        let donor = db
            .donors
            .create(&CreateDonorRequest {
                user_id,
                name: "Meera Shah".to_string(),
                email: "meera@example.org".to_string(),
                total_donated: 0,
                impact_level: ImpactLevel::Bronze,
            })
            .await
            .unwrap();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        donate(&db, donor.id, Some(a), 500).await;
        donate(&db, donor.id, Some(a), 1000).await;
        donate(&db, donor.id, Some(b), 2000).await;
        donate(&db, donor.id, None, 0).await;

        let dashboard = dashboards.donor(user_id, &ViewScope::new()).await.unwrap();
        assert_eq!(dashboard.total_donated, 3500);
        assert_eq!(dashboard.donation_count, 4);
        assert_eq!(dashboard.hostels_supported, 2);
        assert_eq!(dashboard.impact_level, ImpactLevel::Bronze);
    }

    #[tokio::test]
    async fn test_hostel_dashboard_is_scoped_to_admin() {
        let (db, dashboards) = service();
        let admin = Uuid::new_v4();
        let mine = hostel(&db, admin, 100, 40).await;
        hostel(&db, admin, 20, 5).await;
        let other = hostel(&db, Uuid::new_v4(), 50, 50).await;

        let donor_id = Uuid::new_v4();
        donate(&db, donor_id, Some(mine.id), 1500).await;
        donate(&db, Uuid::new_v4(), Some(mine.id), 500).await;
        donate(&db, donor_id, Some(other.id), 9000).await;

        let dashboard = dashboards.hostel_admin(admin, &ViewScope::new()).await.unwrap();
        assert_eq!(dashboard.hostels.len(), 2);
        assert_eq!(dashboard.total_capacity, 120);
        assert_eq!(dashboard.occupied, 45);
        assert_eq!(dashboard.available, 75);
        assert_eq!(dashboard.occupancy_rate, 37.5);
        assert_eq!(dashboard.total_donations, 2000);
        assert_eq!(dashboard.donor_count, 2);
    }

    #[tokio::test]
    async fn test_empty_dashboards() {
        let (_, dashboards) = service();
        let scope = ViewScope::new();
        let user = Uuid::new_v4();

        let hostel = dashboards.hostel_admin(user, &scope).await.unwrap();
        assert_eq!(hostel.occupancy_rate, 0.0);
        let trustee = dashboards.trustee(user, &scope).await.unwrap();
        assert_eq!(trustee.average_compliance, None);
        let admin = dashboards.super_admin(&scope).await.unwrap();
        assert_eq!(admin.users_per_role.len(), Role::ALL.len());
    }

    #[tokio::test]
    async fn test_cancelled_scope_discards_fetch() {
        let (_, dashboards) = service();
        let scope = ViewScope::new();
        scope.cancel();
        let result = dashboards.super_admin(&scope).await;
        assert!(matches!(result, Err(crate::utils::errors::HostelBridgeError::Cancelled)));
    }
}
