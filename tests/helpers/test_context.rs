//! Test application context
//!
//! Builds the full router over the in-memory backend and state storage and
//! sends requests through it with `oneshot`.

use std::sync::{Arc, Once};

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use HostelBridge::config::Settings;
use HostelBridge::database::{DatabaseService, MemoryBackend};
use HostelBridge::models::{AuthUser, Role};
use HostelBridge::{create_router, AppState, ServiceFactory, StateStorage};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();
    });
}

/// Response with its body decoded as JSON (`Null` when empty)
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }
}

pub struct TestApp {
    pub router: Router,
    pub services: Arc<ServiceFactory>,
    pub backend: Arc<MemoryBackend>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(Settings::in_memory(TEST_JWT_SECRET))
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_test_logging();

        let backend = Arc::new(MemoryBackend::new());
        let database = DatabaseService::new(backend.clone());
        let storage = StateStorage::in_memory(settings.redis.clone());
        let services = ServiceFactory::new(database, storage, &settings);

        let state = AppState::new(services, settings);
        let services = state.services.clone();

        Self {
            router: create_router(state),
            services,
            backend,
        }
    }

    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, path, token, Some(body)).await
    }

    /// Create an account, optionally give it a role, and sign it in
    pub async fn user_with_role(&self, email: &str, role: Option<Role>) -> (AuthUser, String) {
        let auth = &self.services.auth;
        let user = auth.sign_up(email, TEST_PASSWORD).await.unwrap();
        if let Some(role) = role {
            auth.assign_role(user.id, role).await.unwrap();
        }
        let session = auth.sign_in(email, TEST_PASSWORD).await.unwrap();
        (user, session.token)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
