//! Donor, donation and trustee models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{Record, Table};

/// Donor tier derived from the lifetime donated amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl ImpactLevel {
    pub fn for_total(total_donated: i64) -> Self {
        match total_donated {
            t if t >= 200_000 => ImpactLevel::Platinum,
            t if t >= 50_000 => ImpactLevel::Gold,
            t if t >= 10_000 => ImpactLevel::Silver,
            _ => ImpactLevel::Bronze,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub total_donated: i64,
    pub impact_level: ImpactLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Donor {
    const TABLE: Table = Table::Donors;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonorRequest {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub total_donated: i64,
    pub impact_level: ImpactLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDonorTotalsRequest {
    pub total_donated: i64,
    pub impact_level: ImpactLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub amount: i64,
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Donation {
    const TABLE: Table = Table::Donations;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDonationRequest {
    pub donor_id: Uuid,
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub amount: i64,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trustee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub designation: String,
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub compliance_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Record for Trustee {
    const TABLE: Table = Table::Trustees;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrusteeRequest {
    pub user_id: Uuid,
    pub name: String,
    pub designation: String,
    pub hostel_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub compliance_score: Option<f64>,
}
