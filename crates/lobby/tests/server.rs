//! Integration tests for the Lobby gateway: HTTP API, session cookie, and
//! the full WebSocket flow.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::{SinkExt, StreamExt};
use lobby::SESSION_COOKIE;
use lobby::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tower::ServiceExt;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn memory_directory() -> DirectoryService<MemoryCredentialStore> {
    DirectoryService::new(MemoryCredentialStore::new())
}

fn app() -> Router {
    LobbyServerBuilder::new().into_router(memory_directory())
}

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

impl Reply {
    /// The session token from a `Set-Cookie: session_id=...` header.
    fn token(&self) -> String {
        let cookie = self.set_cookie.as_deref().expect("no session cookie set");
        cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("session_id="))
            .expect("malformed session cookie")
            .to_owned()
    }
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::COOKIE, format!("{SESSION_COOKIE}={token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply {
        status,
        set_cookie,
        body,
    }
}

fn creds(username: &str, password: &str) -> Option<Value> {
    Some(json!({ "username": username, "password": password }))
}

// =========================================================================
// HTTP API
// =========================================================================

#[tokio::test]
async fn test_register_login_check_logout_flow() {
    let app = app();

    let reply = call(&app, "POST", "/api/register", creds("alice", "secret1"), None).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = call(&app, "POST", "/api/register", creds("alice", "other12"), None).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"], "conflict");

    let login = call(&app, "POST", "/api/login", creds("alice", "secret1"), None).await;
    assert_eq!(login.status, StatusCode::OK);
    let cookie = login.set_cookie.clone().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
    let token = login.token();
    assert_eq!(token.len(), 64);

    let reply = call(&app, "GET", "/api/check-login", None, Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "username": "alice" }));

    let reply = call(&app, "POST", "/api/login", creds("alice", "wrongpass"), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.set_cookie.is_none());

    let reply = call(&app, "POST", "/api/logout", None, Some(&token)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let cleared = reply.set_cookie.unwrap();
    assert!(cleared.starts_with("session_id=;") || cleared.starts_with("session_id=\"\""));
    assert!(cleared.contains("Max-Age=0"));

    let reply = call(&app, "GET", "/api/check-login", None, Some(&token)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_user_and_wrong_password_look_identical() {
    let app = app();
    call(&app, "POST", "/api/register", creds("alice", "secret1"), None).await;

    let wrong = call(&app, "POST", "/api/login", creds("alice", "wrongpass"), None).await;
    let unknown = call(&app, "POST", "/api/login", creds("nobody", "secret1"), None).await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn test_register_short_password_is_bad_request() {
    let app = app();
    let reply = call(&app, "POST", "/api/register", creds("alice", "12345"), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "invalid_input");
}

#[tokio::test]
async fn test_register_malformed_body_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_login_without_cookie_is_unauthorized() {
    let reply = call(&app(), "GET", "/api/check-login", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "unauthorized");
}

#[tokio::test]
async fn test_check_login_unknown_token_is_unauthorized() {
    let reply = call(&app(), "GET", "/api/check-login", None, Some("deadbeef")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let reply = call(&app(), "POST", "/api/logout", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_ws_without_session_is_unauthorized() {
    let reply = call(&app(), "GET", "/ws", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

/// A directory that never answers.
struct StalledDirectory;

impl Directory for StalledDirectory {
    async fn register(&self, _credentials: &Credentials) -> Result<(), DirectoryError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<String, DirectoryError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(credentials.username.clone())
    }
}

#[tokio::test(start_paused = true)]
async fn test_login_stalled_directory_times_out_as_server_error() {
    let app = LobbyServerBuilder::new()
        .directory_timeout(Duration::from_millis(50))
        .into_router(StalledDirectory);

    let reply = call(&app, "POST", "/api/login", creds("alice", "secret1"), None).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["error"], "backend_unavailable");
    assert!(reply.set_cookie.is_none());
}

#[tokio::test]
async fn test_public_dir_serves_static_files() {
    let dir = std::env::temp_dir().join(format!("lobby-public-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>lobby</h1>").unwrap();

    let app = LobbyServerBuilder::new()
        .public_dir(&dir)
        .into_router(memory_directory());
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>lobby</h1>");

    let _ = std::fs::remove_dir_all(&dir);
}

// =========================================================================
// WebSocket flow against a live server
// =========================================================================

async fn start_server() -> String {
    let server = LobbyServer::builder()
        .bind("127.0.0.1:0")
        .build(memory_directory())
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// Registers and logs in over real HTTP; returns the session token.
async fn sign_in(addr: &str, username: &str) -> String {
    let client = reqwest::Client::new();
    let body = json!({ "username": username, "password": "secret1" });

    let response = client
        .post(format!("http://{addr}/api/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .post(format!("http://{addr}/api/login"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("login should set a cookie");
    cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("session_id="))
        .unwrap()
        .to_owned()
}

async fn connect(addr: &str, token: &str) -> ClientWs {
    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request.headers_mut().insert(
        header::COOKIE,
        format!("{SESSION_COOKIE}={token}").parse().unwrap(),
    );
    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("should connect");
    ws
}

async fn next_event(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("read failed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn test_ws_chat_is_attributed_to_session_user() {
    let addr = start_server().await;
    let bob_token = sign_in(&addr, "bob").await;
    let carol_token = sign_in(&addr, "carol").await;

    let mut bob = connect(&addr, &bob_token).await;
    assert_eq!(
        next_event(&mut bob).await,
        json!({ "type": "userJoined", "username": "bob" })
    );

    let mut carol = connect(&addr, &carol_token).await;
    assert_eq!(
        next_event(&mut carol).await,
        json!({ "type": "userJoined", "username": "carol" })
    );
    assert_eq!(
        next_event(&mut bob).await,
        json!({ "type": "userJoined", "username": "carol" })
    );

    // The claimed username is ignored.
    send_json(
        &mut bob,
        json!({ "type": "message", "username": "mallory", "content": "hi" }),
    )
    .await;

    let expected = json!({ "type": "message", "username": "bob", "content": "hi" });
    assert_eq!(next_event(&mut bob).await, expected);
    assert_eq!(next_event(&mut carol).await, expected);
}

#[tokio::test]
async fn test_ws_forged_and_garbage_frames_are_skipped() {
    let addr = start_server().await;
    let bob_token = sign_in(&addr, "bob").await;
    let carol_token = sign_in(&addr, "carol").await;

    let mut bob = connect(&addr, &bob_token).await;
    next_event(&mut bob).await;
    let mut carol = connect(&addr, &carol_token).await;
    next_event(&mut carol).await;

    send_json(&mut bob, json!({ "type": "userLeft", "username": "carol" })).await;
    bob.send(Message::Text("not json".into())).await.unwrap();
    send_json(&mut bob, json!({ "type": "message", "content": "still here" })).await;

    assert_eq!(
        next_event(&mut carol).await,
        json!({ "type": "message", "username": "bob", "content": "still here" })
    );
}

#[tokio::test]
async fn test_ws_close_announces_left() {
    let addr = start_server().await;
    let bob_token = sign_in(&addr, "bob").await;
    let carol_token = sign_in(&addr, "carol").await;

    let mut bob = connect(&addr, &bob_token).await;
    next_event(&mut bob).await;
    let mut carol = connect(&addr, &carol_token).await;
    next_event(&mut carol).await;
    next_event(&mut bob).await; // carol joined

    carol.close(None).await.unwrap();

    assert_eq!(
        next_event(&mut bob).await,
        json!({ "type": "userLeft", "username": "carol" })
    );
}

#[tokio::test]
async fn test_ws_invalid_session_rejects_handshake_with_401() {
    let addr = start_server().await;

    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    request.headers_mut().insert(
        header::COOKIE,
        format!("{SESSION_COOKIE}=not-a-session").parse().unwrap(),
    );
    let err = tokio_tungstenite::connect_async(request)
        .await
        .expect_err("handshake should be refused");

    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}
