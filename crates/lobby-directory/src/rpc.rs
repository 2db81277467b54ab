//! JSON-over-HTTP RPC for the directory.
//!
//! ```text
//! POST /rpc/UserService/Register   {"user": {"username": "...", "password": "..."}}
//! POST /rpc/UserService/Login      {"user": {"username": "...", "password": "..."}}
//!
//! reply: {"success": bool, "message": "...", "code": "ok" | <DirectoryError::code>}
//! ```
//!
//! Business failures (conflict, wrong password) are replied with `200` and
//! `success: false`; a failing credential store replies `503`. Either way
//! the body carries the code, and [`RemoteDirectory`] turns it back into
//! the matching [`DirectoryError`].

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use lobby_protocol::Credentials;
use serde::{Deserialize, Serialize};

use crate::{Directory, DirectoryError, StoreError};

pub const REGISTER_PATH: &str = "/rpc/UserService/Register";
pub const LOGIN_PATH: &str = "/rpc/UserService/Login";

/// Request body for both RPC methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    pub user: Credentials,
}

/// Reply body for both RPC methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReply {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub code: String,
}

impl UserReply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: "ok".into(),
        }
    }

    fn failed(err: &DirectoryError) -> Self {
        let message = match err {
            DirectoryError::InvalidInput(detail) => detail.clone(),
            other => other.to_string(),
        };
        Self {
            success: false,
            message,
            code: err.code().into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

/// Builds the RPC router for a directory.
pub fn router<D: Directory>(directory: Arc<D>) -> Router {
    Router::new()
        .route(REGISTER_PATH, post(register::<D>))
        .route(LOGIN_PATH, post(login::<D>))
        .with_state(directory)
}

async fn register<D: Directory>(
    State(directory): State<Arc<D>>,
    Json(request): Json<UserRequest>,
) -> (StatusCode, Json<UserReply>) {
    reply(directory.register(&request.user).await.map(|()| "registered"))
}

async fn login<D: Directory>(
    State(directory): State<Arc<D>>,
    Json(request): Json<UserRequest>,
) -> (StatusCode, Json<UserReply>) {
    reply(
        directory
            .authenticate(&request.user)
            .await
            .map(|_| "authenticated"),
    )
}

fn reply(result: Result<&'static str, DirectoryError>) -> (StatusCode, Json<UserReply>) {
    match result {
        Ok(message) => (StatusCode::OK, Json(UserReply::ok(message))),
        Err(err) if err.is_unavailable() => {
            tracing::error!(error = %err, "directory call failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(UserReply::failed(&err)))
        }
        Err(err) => (StatusCode::OK, Json(UserReply::failed(&err))),
    }
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// Configuration for [`RemoteDirectory`].
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Where the directory listens, e.g. `http://127.0.0.1:50051`.
    pub base_url: String,

    /// Per-request deadline, covering connect, send and reading the reply.
    ///
    /// Default: 5 seconds.
    pub timeout: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:50051".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// A [`Directory`] reached over RPC.
#[derive(Debug, Clone)]
pub struct RemoteDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteDirectory {
    /// # Errors
    /// [`DirectoryError::BackendUnavailable`] if the HTTP client cannot be
    /// built.
    pub fn new(config: RpcClientConfig) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DirectoryError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn call(&self, path: &str, credentials: &Credentials) -> Result<(), DirectoryError> {
        let url = format!("{}{path}", self.base_url);
        let request = UserRequest {
            user: credentials.clone(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DirectoryError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        let reply: UserReply = response.json().await.map_err(|e| {
            DirectoryError::BackendUnavailable(format!("unreadable reply ({status}): {e}"))
        })?;

        tracing::debug!(%path, %status, code = %reply.code, "directory rpc");
        interpret(reply, &credentials.username)
    }
}

impl Directory for RemoteDirectory {
    async fn register(&self, credentials: &Credentials) -> Result<(), DirectoryError> {
        self.call(REGISTER_PATH, credentials).await
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<String, DirectoryError> {
        self.call(LOGIN_PATH, credentials).await?;
        Ok(credentials.username.clone())
    }
}

/// Turns a reply back into the result the directory produced.
fn interpret(reply: UserReply, username: &str) -> Result<(), DirectoryError> {
    if reply.success {
        return Ok(());
    }
    Err(match reply.code.as_str() {
        "invalid_input" => DirectoryError::InvalidInput(reply.message),
        "conflict" => DirectoryError::Conflict(username.to_owned()),
        "not_found" => DirectoryError::NotFound,
        "invalid_credentials" => DirectoryError::InvalidCredentials,
        "store_unavailable" => DirectoryError::StoreUnavailable(StoreError::Backend(reply.message)),
        other => DirectoryError::BackendUnavailable(format!(
            "unexpected reply code {other:?}: {}",
            reply.message
        )),
    })
}
