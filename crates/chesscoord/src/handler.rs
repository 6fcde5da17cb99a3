//! Per-connection handler: identify, then route `{route, action, value,
//! id}` messages to the session manager.
//!
//! Each accepted connection gets its own Tokio task running this loop.
//! The flow is:
//!   1. Receive the opening `auth.identify` message → resolve identity.
//!   2. Loop: receive messages → route `invites.acceptinvite` to game
//!      creation, everything else to [`GameSessionManager`].

use std::sync::Arc;
use std::time::Duration;

use chesscoord_protocol::{InboundMessage, InviteOptions, PlayerHandle};
use chesscoord_transport::{Connection, Endpoint, WebSocketConnection};

use crate::identity::Authenticator;
use crate::server::ServerState;
use crate::CoordError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A>>,
) -> Result<(), CoordError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");
    let endpoint = Arc::new(Endpoint::new(conn));

    let identity = match identify(&endpoint, &state).await {
        Some(identity) => identity,
        None => return Ok(()),
    };
    tracing::info!(%conn_id, %identity, "player identified");

    loop {
        let msg = match tokio::time::timeout(Duration::from_secs(30), endpoint.recv()).await {
            Ok(Ok(Some(msg))) => msg,
            Ok(Ok(None)) => {
                tracing::info!(%identity, "connection closed cleanly");
                state.manager.lock().await.on_endpoint_closed(&endpoint, true).await;
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%identity, error = %e, "recv error, treating as not-by-choice disconnect");
                state.manager.lock().await.on_endpoint_closed(&endpoint, false).await;
                break;
            }
            Err(_) => {
                tracing::debug!(%identity, "idle timeout, treating as not-by-choice disconnect");
                state.manager.lock().await.on_endpoint_closed(&endpoint, false).await;
                break;
            }
        };

        dispatch(&endpoint, &identity, &state, msg).await;
    }

    Ok(())
}

/// Resolves the connection's identity from its first message. Any
/// failure (bad credential, wrong shape, timeout) just closes the
/// connection — there's no protocol-level reply for a failed handshake.
async fn identify<A: Authenticator>(
    endpoint: &Arc<Endpoint<WebSocketConnection>>,
    state: &Arc<ServerState<A>>,
) -> Option<PlayerHandle> {
    let msg = match tokio::time::timeout(Duration::from_secs(5), endpoint.recv()).await {
        Ok(Ok(Some(msg))) => msg,
        _ => return None,
    };
    if msg.route != "auth" || msg.action != "identify" {
        tracing::debug!("first message was not auth.identify, closing");
        return None;
    }
    let credential = msg.value.get("credential").and_then(serde_json::Value::as_str)?;
    state.auth.authenticate(credential).await.ok()
}

/// Routes one decoded message per §6: `route == "invites"` (only
/// `acceptinvite`) creates a game; `route == "game"` goes to the session
/// manager's tagged-union dispatch.
async fn dispatch<A: Authenticator>(
    endpoint: &Arc<Endpoint<WebSocketConnection>>,
    identity: &PlayerHandle,
    state: &Arc<ServerState<A>>,
    msg: InboundMessage,
) {
    if msg.route == "invites" {
        if msg.action == "acceptinvite" {
            handle_accept_invite(endpoint, identity, state, msg).await;
        }
        return;
    }
    state.manager.lock().await.handle_incoming_message(endpoint, Some(identity), msg).await;
}

/// §4.1.1: the invite bookkeeping itself (listing, reserving, locating
/// the owner's own live connection) is an out-of-scope collaborator;
/// this edge only has the accepter's own endpoint, so the owner endpoint
/// is always passed through as absent. A deployment with a connection
/// registry would look the owner up by `invite.owner_handle` instead.
async fn handle_accept_invite<A: Authenticator>(
    endpoint: &Arc<Endpoint<WebSocketConnection>>,
    identity: &PlayerHandle,
    state: &Arc<ServerState<A>>,
    msg: InboundMessage,
) {
    let invite: InviteOptions = match serde_json::from_value(msg.value) {
        Ok(invite) => invite,
        Err(e) => {
            tracing::debug!(error = %e, "malformed acceptinvite payload");
            return;
        }
    };
    let mut manager = state.manager.lock().await;
    match manager
        .create_game_from_invite(invite, None, identity.clone(), Arc::clone(endpoint))
        .await
    {
        Ok(game_id) => tracing::info!(%game_id, %identity, "game created from accepted invite"),
        Err(e) => tracing::warn!(error = %e, %identity, "could not create game from invite"),
    }
}
