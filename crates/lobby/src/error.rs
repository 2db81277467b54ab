//! Error types for the gateway.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lobby_directory::DirectoryError;
use lobby_hub::HubError;
use lobby_protocol::ProtocolError;
use lobby_session::SessionError;
use lobby_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lobby` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. `#[from]` on each
/// variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Binding or serving the listener failed.
    #[error("server i/o: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GatewayError: what an HTTP handler can fail with
// ---------------------------------------------------------------------------

/// A failed API request, rendered as `{"error": <code>, "message": <text>}`.
///
/// | Cause | Status |
/// |---|---|
/// | unreadable body, `InvalidInput` | 400 |
/// | `Conflict` | 409 |
/// | `NotFound`, `InvalidCredentials`, no live session | 401 |
/// | `StoreUnavailable`, `BackendUnavailable` | 500 |
///
/// Both credential failures get the same body. Infrastructure failures
/// get a generic body and the cause goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl GatewayError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "invalid_request", detail.clone())
            }
            Self::Directory(DirectoryError::InvalidInput(detail)) => {
                (StatusCode::BAD_REQUEST, "invalid_input", detail.clone())
            }
            Self::Directory(DirectoryError::Conflict(_)) => (
                StatusCode::CONFLICT,
                "conflict",
                "username already exists".into(),
            ),
            Self::Directory(DirectoryError::NotFound | DirectoryError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid username or password".into(),
            ),
            Self::Directory(
                DirectoryError::StoreUnavailable(_) | DirectoryError::BackendUnavailable(_),
            ) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "backend_unavailable",
                "service temporarily unavailable".into(),
            ),
            Self::Session(_) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "not logged in".into(),
            ),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = Json(serde_json::json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}
