//! Public site operations: portal list, listings and visitor submissions

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::{DatabaseService, Direction, Query};
use crate::models::*;
use crate::utils::errors::{Result, ValidationErrors};
use crate::utils::helpers::{is_valid_email, is_valid_phone, normalize_email};

/// One entry on the portal selection page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portal {
    pub role: Role,
    pub name: &'static str,
    pub path: &'static str,
    pub dashboard: String,
}

pub fn portals() -> Vec<Portal> {
    Role::ALL
        .into_iter()
        .map(|role| Portal {
            role,
            name: role.portal_name(),
            path: role.portal_prefix(),
            dashboard: role.dashboard_route(),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketForm {
    pub subject: String,
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
    pub email: String,
}

fn default_priority() -> TicketPriority {
    TicketPriority::Medium
}

fn require_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let length = value.trim().chars().count();
    if length == 0 {
        errors.add(field, "This field is required");
    } else if length > max {
        errors.add(field, format!("Must be at most {} characters", max));
    }
}

#[derive(Debug, Clone)]
pub struct PublicService {
    database: DatabaseService,
}

impl PublicService {
    pub fn new(database: DatabaseService) -> Self {
        Self { database }
    }

    pub async fn submit_contact(&self, form: ContactForm) -> Result<ContactSubmission> {
        let email = normalize_email(&form.email);
        let phone = form.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &form.name, 128);
        if !is_valid_email(&email) {
            errors.add("email", "Invalid email format");
        }
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            errors.add("phone", "Invalid phone number");
        }
        require_text(&mut errors, "subject", &form.subject, 255);
        require_text(&mut errors, "message", &form.message, 5000);
        errors.into_result()?;

        let submission = self
            .database
            .contacts
            .create(&CreateContactRequest {
                name: form.name.trim().to_string(),
                email,
                phone,
                subject: form.subject.trim().to_string(),
                message: form.message.trim().to_string(),
            })
            .await?;
        info!(contact_id = %submission.id, "Contact form submitted");
        Ok(submission)
    }

    pub async fn open_ticket(&self, form: TicketForm) -> Result<Ticket> {
        let email = normalize_email(&form.email);

        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "subject", &form.subject, 255);
        require_text(&mut errors, "description", &form.description, 5000);
        if !is_valid_email(&email) {
            errors.add("email", "Invalid email format");
        }
        errors.into_result()?;

        let ticket = self
            .database
            .tickets
            .create(&CreateTicketRequest {
                subject: form.subject.trim().to_string(),
                description: form.description.trim().to_string(),
                priority: form.priority,
                status: TicketStatus::Open,
                requester_email: email,
                assigned_to: None,
            })
            .await?;
        info!(ticket_id = %ticket.id, priority = ?ticket.priority, "Support ticket opened");
        Ok(ticket)
    }

    /// Open scholarships whose deadline has not passed, soonest first
    pub async fn open_scholarships(&self) -> Result<Vec<Scholarship>> {
        let today = Utc::now().date_naive();
        let query = Query::new()
            .eq("status", ScholarshipStatus::Open)
            .order_by("deadline", Direction::Asc);
        let scholarships = self.database.scholarships.list(&query).await?;
        Ok(scholarships.into_iter().filter(|s| s.deadline >= today).collect())
    }

    /// Events that have not started yet, soonest first
    pub async fn upcoming_events(&self) -> Result<Vec<Event>> {
        let now = Utc::now();
        let query = Query::new().order_by("event_date", Direction::Asc);
        let events = self.database.events.list(&query).await?;
        Ok(events.into_iter().filter(|e| e.event_date >= now).collect())
    }

    /// Published posts, newest first
    pub async fn published_posts(&self) -> Result<Vec<BlogPost>> {
        let query = Query::new()
            .eq("published", true)
            .order_by("created_at", Direction::Desc);
        self.database.blog_posts.list(&query).await
    }
}
