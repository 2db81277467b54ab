//! HTTP routes and the state they share.
//!
//! ```text
//! POST /api/register     {username, password}  → 200 | 400 | 409 | 500
//! POST /api/login        {username, password}  → 200 + session cookie | 400 | 401 | 500
//! GET  /api/check-login                        → 200 {username} | 401
//! POST /api/logout                             → 200, always
//! GET  /ws                                     → upgrade | 401
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lobby_directory::{Directory, DirectoryError};
use lobby_hub::Hub;
use lobby_protocol::Credentials;
use lobby_session::SessionRegistry;
use lobby_transport::WebSocketConnection;
use serde_json::{Value, json};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{GatewayConfig, GatewayError};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Everything a request handler or connection task can reach.
///
/// Cloned into every request; all fields are shared handles.
pub(crate) struct AppState<D> {
    pub(crate) sessions: Arc<SessionRegistry>,
    pub(crate) hub: Hub<WebSocketConnection>,
    pub(crate) directory: Arc<D>,
    pub(crate) config: Arc<GatewayConfig>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            hub: self.hub.clone(),
            directory: Arc::clone(&self.directory),
            config: Arc::clone(&self.config),
        }
    }
}

impl<D: Directory> AppState<D> {
    /// Runs a directory call under the configured deadline.
    async fn within_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, DirectoryError>>,
    ) -> Result<T, DirectoryError> {
        let deadline = self.config.directory_timeout;
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(DirectoryError::BackendUnavailable(format!(
                "directory did not answer within {deadline:?}"
            ))),
        }
    }

    /// Resolves the session cookie to a username, sliding its expiry.
    pub(crate) async fn current_user(&self, jar: &CookieJar) -> Result<String, GatewayError> {
        let token = jar.get(SESSION_COOKIE).map(Cookie::value);
        Ok(self.sessions.require(token).await?)
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = time::Duration::try_from(self.sessions.config().ttl)
            .unwrap_or(time::Duration::MAX);
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure)
            .max_age(max_age)
            .build()
    }
}

/// Builds the full application router.
pub(crate) fn router<D: Directory>(state: AppState<D>) -> Router {
    let public_dir = state.config.public_dir.clone();

    let router = Router::new()
        .route("/api/register", post(register::<D>))
        .route("/api/login", post(login::<D>))
        .route("/api/check-login", get(check_login::<D>))
        .route("/api/logout", post(logout::<D>))
        .route("/ws", get(crate::handler::upgrade::<D>))
        .with_state(state);

    let router = match public_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn register<D: Directory>(
    State(state): State<AppState<D>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(credentials) = body?;
    state
        .within_deadline(state.directory.register(&credentials))
        .await?;
    Ok(Json(json!({ "message": "registered" })))
}

async fn login<D: Directory>(
    State(state): State<AppState<D>>,
    jar: CookieJar,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<Value>), GatewayError> {
    let Json(credentials) = body?;
    let username = state
        .within_deadline(state.directory.authenticate(&credentials))
        .await?;

    let token = state.sessions.issue(username.as_str()).await;
    let jar = jar.add(state.session_cookie(token));
    Ok((jar, Json(json!({ "message": "logged in", "username": username }))))
}

async fn check_login<D: Directory>(
    State(state): State<AppState<D>>,
    jar: CookieJar,
) -> Result<Json<Value>, GatewayError> {
    let username = state.current_user(&jar).await?;
    Ok(Json(json!({ "username": username })))
}

async fn logout<D: Directory>(
    State(state): State<AppState<D>>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value()).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "message": "logged out" })))
}
