//! Account handlers: sign-up, sign-in, sign-out and the current session

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::middleware::CurrentSession;
use crate::models::AuthUser;
use crate::services::auth::PORTALS_ROUTE;
use crate::services::{SessionSnapshot, SignInResponse};
use crate::utils::errors::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpResponse {
    pub user: AuthUser,
    /// New accounts have no role yet
    pub redirect: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    let user = state
        .services
        .auth
        .sign_up(&credentials.email, &credentials.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user,
            redirect: PORTALS_ROUTE.to_string(),
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignInResponse>> {
    let response = state
        .services
        .auth
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(response))
}

pub async fn sign_out(session: CurrentSession) -> Result<StatusCode> {
    session.0.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(session: CurrentSession) -> Json<SessionSnapshot> {
    Json(session.0.snapshot())
}
