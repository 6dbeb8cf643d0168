//! Portal actions: student applications, application review and donations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AppState;
use crate::middleware::CurrentSession;
use crate::models::{Application, Donation, Role, UpdateApplicationStatusRequest};
use crate::services::{ApplyRequest, DonateRequest};
use crate::utils::errors::Result;

pub async fn student_applications(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<Application>>> {
    let user = session.require_role(Role::Student)?;
    Ok(Json(state.services.applications.for_student(user.id).await?))
}

pub async fn apply(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<Application>)> {
    let user = session.require_role(Role::Student)?;
    let application = state.services.applications.apply(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn hostel_applications(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<Application>>> {
    let user = session.require_role(Role::HostelAdmin)?;
    Ok(Json(state.services.applications.for_hostel_admin(user.id).await?))
}

pub async fn institution_applications(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<Application>>> {
    let user = session.require_role(Role::InstitutionAdmin)?;
    Ok(Json(state.services.applications.for_institution_admin(user.id).await?))
}

async fn review(
    state: &AppState,
    session: &CurrentSession,
    role: Role,
    application_id: Uuid,
    request: UpdateApplicationStatusRequest,
) -> Result<Json<Application>> {
    let user = session.require_role(role)?;
    let application = state
        .services
        .applications
        .set_status(user.id, role, application_id, request)
        .await?;
    Ok(Json(application))
}

pub async fn review_hostel_application(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(application_id): Path<Uuid>,
    Json(request): Json<UpdateApplicationStatusRequest>,
) -> Result<Json<Application>> {
    review(&state, &session, Role::HostelAdmin, application_id, request).await
}

pub async fn review_institution_application(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(application_id): Path<Uuid>,
    Json(request): Json<UpdateApplicationStatusRequest>,
) -> Result<Json<Application>> {
    review(&state, &session, Role::InstitutionAdmin, application_id, request).await
}

pub async fn donations(State(state): State<AppState>, session: CurrentSession) -> Result<Json<Vec<Donation>>> {
    let user = session.require_role(Role::Donor)?;
    Ok(Json(state.services.donations.for_donor(user.id).await?))
}

pub async fn donate(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(request): Json<DonateRequest>,
) -> Result<(StatusCode, Json<Donation>)> {
    let user = session.require_role(Role::Donor)?;
    let donation = state.services.donations.donate(&user, request).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}
