use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::api::middleware::{ApiError, ApiResult, AppState};
use crate::models::{CreateRoomRequest, User};

/// Create a support room, or return the customer's existing open room.
pub async fn create_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateRoomRequest>,
) -> ApiResult<impl IntoResponse> {
    let (room, created) = state.rooms.create_room(&user, request.subject).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(room)))
}

/// Customers see their own rooms; staff see rooms assigned to them.
pub async fn list_rooms(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let rooms = if user.is_staff {
        state.db.list_rooms_for_agent(&user.id).await?
    } else {
        state.db.list_rooms_for_customer(&user.id).await?
    };
    Ok(Json(rooms))
}

/// Pending queue, staff only.
pub async fn list_pending_rooms(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    if !user.is_staff {
        return Err(ApiError::Forbidden("Staff capability required".to_string()));
    }
    let rooms = state.db.list_pending_rooms().await?;
    Ok(Json(rooms))
}

pub async fn accept_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(room_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let room = state.rooms.accept_room(&room_id, &user).await?;
    Ok(Json(room))
}

pub async fn close_room(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(room_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let room = state.rooms.close_room(&room_id, &user).await?;
    Ok(Json(room))
}
