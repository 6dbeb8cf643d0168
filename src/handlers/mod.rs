//! HTTP handlers
//!
//! One module per area of the site. Portal routes sit behind the session
//! guard; everything else is public.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod portal;
pub mod public;
pub mod registration;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Settings;
use crate::middleware::{log_requests, session_guard, RouteGuard};
use crate::services::ServiceFactory;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    pub guard: Arc<RouteGuard>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(services: ServiceFactory, settings: Settings) -> Self {
        Self {
            services: Arc::new(services),
            guard: Arc::new(RouteGuard::new()),
            settings: Arc::new(settings),
        }
    }
}

/// `?confirm=true` on destructive requests
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Confirm {
    #[serde(default)]
    pub confirm: bool,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let public: Router<AppState> = Router::new()
        .route("/health", get(public::health))
        .route("/portals", get(public::portals))
        .route("/contact", post(public::contact))
        .route("/support/tickets", post(public::open_ticket))
        .route("/scholarships", get(public::scholarships))
        .route("/events", get(public::events))
        .route("/blog", get(public::blog));

    let auth: Router<AppState> = Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/session", get(auth::session));

    let registration: Router<AppState> = Router::new()
        .route("/register/:kind", post(registration::start))
        .route("/register/:kind/:draft", get(registration::resume))
        .route("/register/:kind/:draft/next", post(registration::next))
        .route("/register/:kind/:draft/back", post(registration::back))
        .route("/register/:kind/:draft/submit", post(registration::submit))
        .route("/registration-success/:draft", get(registration::success));

    let portals: Router<AppState> = Router::new()
        .route("/student/dashboard", get(dashboard::student))
        .route(
            "/student/applications",
            get(portal::student_applications).post(portal::apply),
        )
        .route("/hostel/dashboard", get(dashboard::hostel_admin))
        .route("/hostel/applications", get(portal::hostel_applications))
        .route(
            "/hostel/applications/:id",
            patch(portal::review_hostel_application),
        )
        .route("/institution/dashboard", get(dashboard::institution_admin))
        .route("/institution/applications", get(portal::institution_applications))
        .route(
            "/institution/applications/:id",
            patch(portal::review_institution_application),
        )
        .route("/trustee/dashboard", get(dashboard::trustee))
        .route("/donor/dashboard", get(dashboard::donor))
        .route("/donor/donations", get(portal::donations).post(portal::donate))
        .route("/admin/dashboard", get(dashboard::super_admin))
        .route("/admin/users", get(admin::users))
        .route(
            "/admin/users/:user_id",
            put(admin::assign_role).delete(admin::remove_role),
        )
        .route("/admin/:resource", get(admin::list).post(admin::create))
        .route("/admin/:resource/:id", put(admin::update).delete(admin::delete));

    let mut app: Router<AppState> = Router::new()
        .merge(public)
        .merge(auth)
        .merge(registration)
        .merge(portals)
        .layer(middleware::from_fn_with_state(state.clone(), session_guard));

    if state.settings.features.request_logging {
        app = app.layer(middleware::from_fn(log_requests));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.settings.server.allowed_origins))
        .with_state(state)
}
