//! Public pages: health, portal list, listings and visitor forms

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use super::AppState;
use crate::models::{BlogPost, ContactSubmission, Event, Scholarship, Ticket};
use crate::services::public::{self as site, Portal};
use crate::services::{ContactForm, TicketForm};
use crate::utils::errors::Result;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": if status.is_healthy() { "ok" } else { "degraded" },
            "version": crate::VERSION,
            "services": status,
            "issues": status.get_issues(),
        })),
    )
}

pub async fn portals() -> Json<Vec<Portal>> {
    Json(site::portals())
}

pub async fn contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactSubmission>)> {
    let submission = state.services.public.submit_contact(form).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn open_ticket(
    State(state): State<AppState>,
    Json(form): Json<TicketForm>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let ticket = state.services.public.open_ticket(form).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn scholarships(State(state): State<AppState>) -> Result<Json<Vec<Scholarship>>> {
    Ok(Json(state.services.public.open_scholarships().await?))
}

pub async fn events(State(state): State<AppState>) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.services.public.upcoming_events().await?))
}

pub async fn blog(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(state.services.public.published_posts().await?))
}
