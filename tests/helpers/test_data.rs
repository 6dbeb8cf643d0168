//! Generated registration data
//!
//! Each function returns one JSON object per wizard step. Names come from
//! `fake`; fields with strict formats use fixed valid values.

use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::TEST_PASSWORD;

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// A unique address under a reserved domain
pub fn unique_email(prefix: &str) -> String {
    format!("{}.{}@example.org", prefix, Uuid::new_v4().simple())
}

pub struct StudentData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Steps 1 to 4; the account step is sent with the final submit
    pub steps: Vec<Value>,
    pub account: Value,
}

impl StudentData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn student_data() -> StudentData {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let email = unique_email("student");
    let guardian: String = LastName().fake();

    let steps = vec![
        json!({
            "first_name": first_name,
            "last_name": last_name,
            "date_of_birth": "2008-04-12",
            "gender": "female"
        }),
        json!({
            "email": email,
            "phone": "+91 98765 43210",
            "address": "12 MG Road",
            "city": "Pune",
            "state": "Maharashtra",
            "pincode": "411001"
        }),
        json!({
            "education_level": "secondary",
            "school_name": "Government High School",
            "board": "SSC",
            "percentage": 82.5
        }),
        json!({
            "guardian_name": format!("Ramesh {}", guardian),
            "guardian_phone": "9876501234",
            "annual_family_income": 180000
        }),
    ];

    StudentData {
        first_name,
        last_name,
        email,
        steps,
        account: account_step(),
    }
}

pub fn account_step() -> Value {
    json!({
        "password": TEST_PASSWORD,
        "confirm_password": TEST_PASSWORD,
        "agree_terms": true
    })
}

pub struct HostelData {
    pub hostel_name: String,
    pub admin_name: String,
    pub email: String,
    /// Steps 1 to 3; the administrator step is sent with the final submit
    pub steps: Vec<Value>,
    pub admin: Value,
}

pub fn hostel_data(capacity: u32) -> HostelData {
    let last_name: String = LastName().fake();
    let first_name: String = FirstName().fake();
    let hostel_name = format!("{} Girls Hostel", last_name);
    let admin_name = format!("{} {}", first_name, last_name);
    let email = unique_email("warden");

    let steps = vec![
        json!({ "hostel_name": hostel_name, "hostel_type": "girls", "capacity": capacity }),
        json!({ "address": "4 Station Road", "city": "Nashik", "state": "Maharashtra", "pincode": "422001" }),
        json!({ "facilities": ["wifi", "mess", "library"] }),
    ];

    let mut admin = object(json!({
        "admin_name": admin_name,
        "email": email,
        "phone": "9123456780"
    }));
    admin.extend(object(account_step()));

    HostelData {
        hostel_name,
        admin_name,
        email,
        steps,
        admin: Value::Object(admin),
    }
}
