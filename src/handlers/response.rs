//! Error responses
//!
//! Every failure leaves a handler as `{ "error": kind, "message": text }`,
//! plus per-field messages for validation failures. Internal details are
//! logged and never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::utils::errors::{ErrorSeverity, HostelBridgeError};

impl HostelBridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HostelBridgeError::Validation(_)
            | HostelBridgeError::InvalidInput(_)
            | HostelBridgeError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            HostelBridgeError::NotAuthenticated
            | HostelBridgeError::Token(_)
            | HostelBridgeError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            HostelBridgeError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            HostelBridgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            HostelBridgeError::AlreadyRegistered { .. } | HostelBridgeError::ConfirmationRequired { .. } => {
                StatusCode::CONFLICT
            }
            HostelBridgeError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            HostelBridgeError::Cancelled | HostelBridgeError::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HostelBridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                error!(error = %self, kind = self.kind(), status = status.as_u16(), "Request failed")
            }
            ErrorSeverity::Warning => warn!(error = %self, kind = self.kind(), "Request refused"),
            ErrorSeverity::Info => debug!(error = %self, kind = self.kind(), "Request rejected"),
        }

        let mut body = json!({
            "error": self.kind(),
            "message": self.user_message(),
        });
        if let HostelBridgeError::Validation(errors) = &self {
            body["fields"] = json!(errors.fields);
        }

        (status, Json(body)).into_response()
    }
}
