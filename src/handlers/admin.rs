//! Super-admin management screens
//!
//! Every write answers with the refreshed list so the screen can redraw.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::{AppState, Confirm};
use crate::middleware::CurrentSession;
use crate::models::{Role, UpdateRoleRequest};
use crate::services::{ManagedUser, Resource};
use crate::utils::errors::Result;

pub async fn list(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(resource): Path<String>,
) -> Result<Json<Value>> {
    session.require_role(Role::SuperAdmin)?;
    let resource: Resource = resource.parse()?;
    Ok(Json(state.services.management.list(resource).await?))
}

pub async fn create(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let admin = session.require_role(Role::SuperAdmin)?;
    let resource: Resource = resource.parse()?;
    let rows = state.services.management.create(admin.id, resource, body).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

pub async fn update(
    State(state): State<AppState>,
    session: CurrentSession,
    Path((resource, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let admin = session.require_role(Role::SuperAdmin)?;
    let resource: Resource = resource.parse()?;
    Ok(Json(state.services.management.update(admin.id, resource, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    session: CurrentSession,
    Path((resource, id)): Path<(String, Uuid)>,
    Query(confirm): Query<Confirm>,
) -> Result<Json<Value>> {
    let admin = session.require_role(Role::SuperAdmin)?;
    let resource: Resource = resource.parse()?;
    let rows = state
        .services
        .management
        .delete(admin.id, resource, id, confirm.confirm)
        .await?;
    Ok(Json(rows))
}

pub async fn users(State(state): State<AppState>, session: CurrentSession) -> Result<Json<Vec<ManagedUser>>> {
    session.require_role(Role::SuperAdmin)?;
    Ok(Json(state.services.management.users().await?))
}

pub async fn assign_role(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Vec<ManagedUser>>> {
    let admin = session.require_role(Role::SuperAdmin)?;
    let users = state
        .services
        .management
        .assign_role(admin.id, user_id, request.role)
        .await?;
    Ok(Json(users))
}

pub async fn remove_role(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(user_id): Path<Uuid>,
    Query(confirm): Query<Confirm>,
) -> Result<Json<Vec<ManagedUser>>> {
    let admin = session.require_role(Role::SuperAdmin)?;
    let users = state
        .services
        .management
        .remove_role(admin.id, user_id, confirm.confirm)
        .await?;
    Ok(Json(users))
}
