//! Per-connection handler: session check, upgrade, and the read loop.
//!
//! Each upgraded socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Resolve the session cookie → username (401 before any upgrade)
//!   2. Upgrade and split the socket; the write half goes to the hub
//!   3. Loop: read frames → forward chat content under the session's name
//!   4. On close or read error → leave the hub

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use lobby_directory::Directory;
use lobby_protocol::{Codec, InboundMessage, JsonCodec};
use lobby_transport::{Connection, ConnectionId};

use crate::GatewayError;
use crate::routes::AppState;

/// `GET /ws`.
///
/// The session is checked before the upgrade is looked at, so a client
/// without a live session gets a plain 401 and never a socket.
pub(crate) async fn upgrade<D: Directory>(
    State(state): State<AppState<D>>,
    jar: CookieJar,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, GatewayError> {
    let username = state.current_user(&jar).await?;

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    Ok(upgrade.on_upgrade(move |socket| handle_socket(socket, username, state)))
}

/// Handles a single upgraded connection from join to close.
async fn handle_socket<D: Directory>(socket: WebSocket, username: String, state: AppState<D>) {
    let (conn, mut reader) = lobby_transport::split(socket);
    let conn = Arc::new(conn);

    let conn_id = match state.hub.join(Arc::clone(&conn), username.as_str()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(%username, error = %e, "could not join hub");
            if let Err(e) = conn.close().await {
                tracing::debug!(%username, error = %e, "close after failed join");
            }
            return;
        }
    };

    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, %username, "connection closed by peer");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, %username, error = %e, "read failed");
                break;
            }
        };

        if !relay(&state, conn_id, &username, &data) {
            break;
        }
    }

    if let Err(e) = state.hub.leave(conn_id).await {
        tracing::warn!(%conn_id, %username, error = %e, "leave failed");
    }
}

/// Forwards one inbound frame. Returns `false` once the hub is gone.
///
/// Whatever `username` the frame claims is dropped during decoding; the
/// message goes out under the session's name. Frames that are not chat
/// messages, or not decodable at all, are skipped.
fn relay<D>(state: &AppState<D>, conn_id: ConnectionId, username: &str, data: &[u8]) -> bool {
    let message: InboundMessage = match JsonCodec.decode(data) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(%conn_id, %username, error = %e, "skipping undecodable frame");
            return true;
        }
    };

    let kind = message.kind;
    let Some(content) = message.into_chat() else {
        tracing::debug!(%conn_id, %username, ?kind, "skipping non-chat frame");
        return true;
    };

    match state.hub.send(username, content) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(%conn_id, %username, error = %e, "broadcast failed");
            false
        }
    }
}
