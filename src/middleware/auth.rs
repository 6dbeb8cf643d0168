//! Authentication middleware
//!
//! Resolves the request's session from its bearer token and applies the
//! portal route guard: every role owns one path prefix, and only that role
//! may enter it. Everyone else is redirected.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::handlers::AppState;
use crate::models::Role;
use crate::services::auth::PORTALS_ROUTE;
use crate::services::{SessionContext, SessionSnapshot};
use crate::state::ScopeGuard;
use crate::utils::errors::HostelBridgeError;

/// Outcome of evaluating the guard for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// The session is still resolving; no decision yet
    Pending,
    Redirect(String),
}

/// Portal prefix to role table
#[derive(Debug, Clone)]
pub struct RouteGuard {
    rules: Vec<(&'static str, Role)>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            rules: Role::ALL.into_iter().map(|role| (role.portal_prefix(), role)).collect(),
        }
    }

    /// Role a path is gated to; prefixes match whole path segments
    pub fn required_role(&self, path: &str) -> Option<Role> {
        self.rules.iter().find_map(|(prefix, role)| {
            let rest = path.strip_prefix(prefix)?;
            (rest.is_empty() || rest.starts_with('/')).then_some(*role)
        })
    }

    pub fn decide(&self, path: &str, session: &SessionSnapshot) -> GuardDecision {
        let Some(required) = self.required_role(path) else {
            return GuardDecision::Allow;
        };
        if session.loading {
            return GuardDecision::Pending;
        }
        if session.user.is_none() {
            return GuardDecision::Redirect(PORTALS_ROUTE.to_string());
        }

        match session.role {
            Some(role) if role == required => GuardDecision::Allow,
            Some(role) => GuardDecision::Redirect(role.dashboard_route()),
            None => GuardDecision::Redirect(PORTALS_ROUTE.to_string()),
        }
    }
}

/// Bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn redirect(to: &str) -> Response {
    let mut response = (
        StatusCode::SEE_OTHER,
        Json(json!({
            "error": "redirect",
            "message": "This portal is not available to the current session",
            "redirect": to,
        })),
    )
        .into_response();
    if let Ok(location) = HeaderValue::from_str(to) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response
}

/// Resolve the session, apply the guard and hand the session to handlers.
///
/// The session's view scope lives as long as the request; fetches still
/// running when the response is produced are cancelled.
pub async fn session_guard(State(state): State<AppState>, mut request: Request<Body>, next: Next) -> Response {
    let session = state.services.session();
    let snapshot = session.resolve(bearer_token(request.headers())).await;
    let path = request.uri().path().to_string();

    match state.guard.decide(&path, &snapshot) {
        GuardDecision::Allow => {}
        GuardDecision::Pending => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "loading", "message": "Session is still loading" })),
            )
                .into_response();
        }
        GuardDecision::Redirect(to) => {
            debug!(path = %path, redirect = %to, role = ?snapshot.role, "Route guard redirect");
            return redirect(&to);
        }
    }

    let _scope = ScopeGuard::new(session.scope().clone());
    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}

/// The request's resolved session
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

impl CurrentSession {
    pub fn require_role(&self, role: Role) -> crate::utils::errors::Result<crate::models::AuthUser> {
        self.0.require_role(role)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = HostelBridgeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or(HostelBridgeError::NotAuthenticated)
    }
}
