use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::api::middleware::{ApiError, ApiResult, AppState};
use crate::models::{MessageResponse, SendMessageRequest, User};

/// List a room's messages in conversation order. Fetching also flips the
/// counterparty's unread flags for the reading participant.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(room_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let room = state
        .db
        .get_room(&room_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Room {} not found", room_id)))?;

    if !room.user_can_access(&user) {
        return Err(ApiError::Forbidden("No access to this room".to_string()));
    }

    state.rooms.mark_read(&room, &user).await?;

    let messages = state.db.list_messages(&room.id).await?;
    let messages: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(room_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .pipeline
        .submit_message(&room_id, &user, &request.message)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
