//! Donations and donor totals

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::aggregate::sum;
use super::applications::check_single_target;
use crate::database::{DatabaseService, Direction, Query};
use crate::models::*;
use crate::utils::errors::{HostelBridgeError, Result, ValidationErrors};
use crate::utils::logging::log_user_action;

/// Largest single donation accepted
pub const MAX_DONATION_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonateRequest {
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub amount: i64,
    pub purpose: Option<String>,
    /// Display name for a first-time donor; defaults to the account email
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DonationService {
    database: DatabaseService,
}

impl DonationService {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    /// Record a donation by the signed-in donor and refresh their totals
    pub async fn donate(&self, user: &AuthUser, request: DonateRequest) -> Result<Donation> {
        let mut errors = ValidationErrors::new();
        if request.amount <= 0 {
            errors.add("amount", "Amount must be greater than zero");
        } else if request.amount > MAX_DONATION_AMOUNT {
            errors.add("amount", "Amount exceeds the maximum single donation");
        }
        errors.into_result()?;
        check_single_target(request.hostel_id, request.institution_id)?;

        if let Some(hostel_id) = request.hostel_id {
            self.database.hostels.get(hostel_id).await?;
        }
        if let Some(institution_id) = request.institution_id {
            self.database.institutions.get(institution_id).await?;
        }

        let donor = match self.database.find_donor_by_user(user.id).await? {
            Some(donor) => donor,
            None => {
                let name = request.name.clone().unwrap_or_else(|| user.email.clone());
                self.database
                    .donors
                    .create(&CreateDonorRequest {
                        user_id: user.id,
                        name,
                        email: user.email.clone(),
                        total_donated: 0,
                        impact_level: ImpactLevel::for_total(0),
                    })
                    .await?
            }
        };

        let donation = self
            .database
            .donations
            .create(&CreateDonationRequest {
                donor_id: donor.id,
                hostel_id: request.hostel_id,
                institution_id: request.institution_id,
                amount: request.amount,
                purpose: request.purpose,
            })
            .await?;

        let totals = self.refresh_totals(donor.id).await?;
        info!(
            donor_id = %donor.id,
            amount = donation.amount,
            total = totals.total_donated,
            impact = ?totals.impact_level,
            "Donation recorded"
        );
        log_user_action(user.id, "donation", Some(&donation.amount.to_string()));
        Ok(donation)
    }

    /// Recompute a donor's total and impact level from their donations
    pub async fn refresh_totals(&self, donor_id: Uuid) -> Result<Donor> {
        let donations = self
            .database
            .donations
            .list(&Query::new().eq("donor_id", donor_id))
            .await?;
        let total_donated = sum(&donations, |d| d.amount);

        self.database
            .donors
            .update(
                donor_id,
                &UpdateDonorTotalsRequest {
                    total_donated,
                    impact_level: ImpactLevel::for_total(total_donated),
                },
            )
            .await
    }

    /// Donations made by the signed-in user, newest first
    pub async fn for_donor(&self, user_id: Uuid) -> Result<Vec<Donation>> {
        let Some(donor) = self.database.find_donor_by_user(user_id).await? else {
            return Ok(Vec::new());
        };
        let query = Query::new()
            .eq("donor_id", donor.id)
            .order_by("created_at", Direction::Desc);
        self.database.donations.list(&query).await
    }

    /// Donor profile, failing when the user has never donated
    pub async fn donor(&self, user_id: Uuid) -> Result<Donor> {
        self.database
            .find_donor_by_user(user_id)
            .await?
            .ok_or_else(|| HostelBridgeError::NotFound {
                entity: "donor",
                id: user_id.to_string(),
            })
    }
}
