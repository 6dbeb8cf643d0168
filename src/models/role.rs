//! Roles and role assignments

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{Record, Table};
use crate::utils::errors::HostelBridgeError;

/// Role tag on a user, one per portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    HostelAdmin,
    InstitutionAdmin,
    Trustee,
    Donor,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::HostelAdmin,
        Role::InstitutionAdmin,
        Role::Trustee,
        Role::Donor,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::HostelAdmin => "hostel_admin",
            Role::InstitutionAdmin => "institution_admin",
            Role::Trustee => "trustee",
            Role::Donor => "donor",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Path prefix of the portal this role owns
    pub fn portal_prefix(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::HostelAdmin => "/hostel",
            Role::InstitutionAdmin => "/institution",
            Role::Trustee => "/trustee",
            Role::Donor => "/donor",
            Role::SuperAdmin => "/admin",
        }
    }

    /// Landing route after sign-in
    pub fn dashboard_route(&self) -> String {
        format!("{}/dashboard", self.portal_prefix())
    }

    pub fn portal_name(&self) -> &'static str {
        match self {
            Role::Student => "Student Portal",
            Role::HostelAdmin => "Hostel Admin Portal",
            Role::InstitutionAdmin => "Institution Admin Portal",
            Role::Trustee => "Trustee Portal",
            Role::Donor => "Donor Portal",
            Role::SuperAdmin => "Super Admin Portal",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HostelBridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| HostelBridgeError::InvalidInput(format!("Unknown role: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Record for UserRole {
    const TABLE: Table = Table::UserRoles;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
