//! Registration wizard handlers
//!
//! `kind` in the path selects the wizard (`student` or `hostel`); `draft` is
//! the id returned when the wizard was started.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::AppState;
use crate::services::DraftView;
use crate::state::{RegistrationReceipt, WizardKind};
use crate::utils::errors::{HostelBridgeError, Result};

fn wizard_kind(state: &AppState, kind: &str) -> Result<WizardKind> {
    if !state.settings.features.public_registration {
        return Err(HostelBridgeError::PermissionDenied(
            "public registration is disabled".to_string(),
        ));
    }
    kind.parse()
}

pub async fn start(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<(StatusCode, Json<DraftView>)> {
    let kind = wizard_kind(&state, &kind)?;
    let view = state.services.registration.start(kind).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn resume(
    State(state): State<AppState>,
    Path((kind, draft_id)): Path<(String, Uuid)>,
) -> Result<Json<DraftView>> {
    let kind = wizard_kind(&state, &kind)?;
    Ok(Json(state.services.registration.resume(kind, draft_id).await?))
}

pub async fn next(
    State(state): State<AppState>,
    Path((kind, draft_id)): Path<(String, Uuid)>,
    Json(data): Json<Map<String, Value>>,
) -> Result<Json<DraftView>> {
    let kind = wizard_kind(&state, &kind)?;
    Ok(Json(state.services.registration.next(kind, draft_id, &data).await?))
}

pub async fn back(
    State(state): State<AppState>,
    Path((kind, draft_id)): Path<(String, Uuid)>,
) -> Result<Json<DraftView>> {
    let kind = wizard_kind(&state, &kind)?;
    Ok(Json(state.services.registration.back(kind, draft_id).await?))
}

/// Final submission; the body carries the last step's fields
pub async fn submit(
    State(state): State<AppState>,
    Path((kind, draft_id)): Path<(String, Uuid)>,
    body: Option<Json<Map<String, Value>>>,
) -> Result<(StatusCode, Json<RegistrationReceipt>)> {
    let kind = wizard_kind(&state, &kind)?;
    let final_step = body.map(|Json(data)| data);
    let receipt = state
        .services
        .registration
        .submit(kind, draft_id, final_step.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn success(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<RegistrationReceipt>> {
    Ok(Json(state.services.registration.receipt(draft_id).await?))
}
