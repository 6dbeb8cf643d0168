//! Portal dashboards
//!
//! Each dashboard follows its session while it loads: signing out elsewhere
//! cancels the pending fetches and the request fails with `Cancelled`.

use axum::{extract::State, Json};

use super::AppState;
use crate::middleware::CurrentSession;
use crate::models::Role;
use crate::services::dashboard::{
    AdminDashboard, DonorDashboard, HostelDashboard, InstitutionDashboard, StudentDashboard, TrusteeDashboard,
};
use crate::utils::errors::Result;

pub async fn student(State(state): State<AppState>, session: CurrentSession) -> Result<Json<StudentDashboard>> {
    let user = session.require_role(Role::Student)?;
    let _listener = session.0.listen();
    let dashboard = state.services.dashboards.student(user.id, session.0.scope()).await?;
    Ok(Json(dashboard))
}

pub async fn hostel_admin(State(state): State<AppState>, session: CurrentSession) -> Result<Json<HostelDashboard>> {
    let user = session.require_role(Role::HostelAdmin)?;
    let _listener = session.0.listen();
    let dashboard = state
        .services
        .dashboards
        .hostel_admin(user.id, session.0.scope())
        .await?;
    Ok(Json(dashboard))
}

pub async fn institution_admin(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<InstitutionDashboard>> {
    let user = session.require_role(Role::InstitutionAdmin)?;
    let _listener = session.0.listen();
    let dashboard = state
        .services
        .dashboards
        .institution_admin(user.id, session.0.scope())
        .await?;
    Ok(Json(dashboard))
}

pub async fn trustee(State(state): State<AppState>, session: CurrentSession) -> Result<Json<TrusteeDashboard>> {
    let user = session.require_role(Role::Trustee)?;
    let _listener = session.0.listen();
    let dashboard = state.services.dashboards.trustee(user.id, session.0.scope()).await?;
    Ok(Json(dashboard))
}

pub async fn donor(State(state): State<AppState>, session: CurrentSession) -> Result<Json<DonorDashboard>> {
    let user = session.require_role(Role::Donor)?;
    let _listener = session.0.listen();
    let dashboard = state.services.dashboards.donor(user.id, session.0.scope()).await?;
    Ok(Json(dashboard))
}

pub async fn super_admin(State(state): State<AppState>, session: CurrentSession) -> Result<Json<AdminDashboard>> {
    session.require_role(Role::SuperAdmin)?;
    let _listener = session.0.listen();
    let dashboard = state.services.dashboards.super_admin(session.0.scope()).await?;
    Ok(Json(dashboard))
}
