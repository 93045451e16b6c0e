use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::middleware::AppState;
use crate::models::{Identity, Room, User};
use crate::ws::frames::{InboundFrame, OutboundFrame};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Upgrade handler for `/ws/chat/:room_id?token=…`.
pub async fn chat_ws(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state, room_id, params.token))
}

/// One chat connection: connecting -> joined -> closed.
///
/// Identity and room access are checked before anything joins the hub; a
/// failed check closes the socket without ever creating group membership.
async fn handle_chat_socket(
    socket: WebSocket,
    state: AppState,
    room_id: String,
    token: Option<String>,
) {
    let user = match state.identity.resolve(token.as_deref()).await {
        Identity::Known(user) => user,
        Identity::Anonymous => {
            debug!(room_id = %room_id, "ws chat: anonymous peer rejected");
            let _ = socket.close().await;
            return;
        }
    };

    let room = match state.db.get_room(&room_id).await {
        Ok(Some(room)) if room.user_can_access(&user) => room,
        Ok(_) => {
            debug!(room_id = %room_id, user_id = %user.id, "ws chat: access denied");
            let _ = socket.close().await;
            return;
        }
        Err(e) => {
            warn!(room_id = %room_id, error = %e, "ws chat: room lookup failed");
            let _ = socket.close().await;
            return;
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let group = room.group_name();
    info!(room_id = %room.room_id, user_id = %user.id, session_id = %session_id, "ws chat: connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<String>();

    // Write loop: drains the hub-facing channel into the transport.
    let write_task = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            if ws_tx.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    state.hub.join(&group, &session_id, client_tx.clone()).await;

    // Confirmation goes to this session only, not the group.
    if let Ok(frame) =
        serde_json::to_string(&OutboundFrame::connection_established("Connected to chat room"))
    {
        let _ = client_tx.send(frame);
    }

    while let Some(incoming) = ws_rx.next().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let frame = match serde_json::from_str::<InboundFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "ws chat: unparseable frame ignored");
                continue;
            }
        };

        handle_frame(&state, &room, &user, &group, &session_id, frame).await;
    }

    // Teardown runs on every exit path, clean or not.
    state.hub.leave_all(&session_id).await;
    write_task.abort();
    info!(room_id = %room.room_id, session_id = %session_id, "ws chat: disconnected");
}

async fn handle_frame(
    state: &AppState,
    room: &Room,
    user: &User,
    group: &str,
    session_id: &str,
    frame: InboundFrame,
) {
    match frame {
        InboundFrame::ChatMessage { message } => {
            if let Err(e) = state
                .pipeline
                .submit_message(&room.room_id, user, &message)
                .await
            {
                warn!(room_id = %room.room_id, error = %e, "ws chat: message rejected");
            }
        }
        InboundFrame::Typing { is_typing } => {
            let frame = OutboundFrame::Typing {
                user_email: user.email.clone(),
                is_typing,
            };
            // Everyone in the room except the typist.
            state.hub.send_except(group, &frame, session_id).await;
        }
        InboundFrame::MarkRead => {
            // Re-fetch: the room may have been assigned since connect.
            match state.db.get_room(&room.room_id).await {
                Ok(Some(fresh)) => {
                    if let Err(e) = state.rooms.mark_read(&fresh, user).await {
                        warn!(room_id = %room.room_id, error = %e, "ws chat: mark_read failed");
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(room_id = %room.room_id, error = %e, "ws chat: mark_read lookup failed");
                }
            }
        }
        // mark_all_read belongs to the notification session.
        InboundFrame::MarkAllRead | InboundFrame::Unknown => {}
    }
}
