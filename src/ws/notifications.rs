use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::middleware::AppState;
use crate::models::Identity;
use crate::ws::chat::WsParams;
use crate::ws::frames::{InboundFrame, OutboundFrame};
use crate::ws::hub::notification_group;

/// Upgrade handler for `/ws/notifications?token=…`. Staff only; the session
/// joins exactly one per-identity group.
pub async fn notifications_ws(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_notification_socket(socket, state, params.token))
}

async fn handle_notification_socket(socket: WebSocket, state: AppState, token: Option<String>) {
    let user = match state.identity.resolve(token.as_deref()).await {
        Identity::Known(user) if user.is_staff => user,
        Identity::Known(user) => {
            debug!(user_id = %user.id, "ws notifications: non-staff rejected");
            let _ = socket.close().await;
            return;
        }
        Identity::Anonymous => {
            debug!("ws notifications: anonymous peer rejected");
            let _ = socket.close().await;
            return;
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let group = notification_group(&user.id);
    info!(user_id = %user.id, session_id = %session_id, "ws notifications: connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<String>();

    let write_task = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            if ws_tx.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    state.hub.join(&group, &session_id, client_tx.clone()).await;

    if let Ok(frame) =
        serde_json::to_string(&OutboundFrame::connection_established("Connected to notifications"))
    {
        let _ = client_tx.send(frame);
    }

    while let Some(incoming) = ws_rx.next().await {
        let text = match incoming {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        match serde_json::from_str::<InboundFrame>(&text) {
            Ok(InboundFrame::MarkAllRead) => {
                if let Err(e) = state.notifier.mark_all_read(&user.id).await {
                    warn!(user_id = %user.id, error = %e, "ws notifications: mark_all_read failed");
                }
            }
            // The notification session recognizes nothing else.
            Ok(_) => {}
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "ws notifications: unparseable frame ignored");
            }
        }
    }

    state.hub.leave_all(&session_id).await;
    write_task.abort();
    info!(user_id = %user.id, session_id = %session_id, "ws notifications: disconnected");
}
