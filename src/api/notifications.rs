use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::api::middleware::{ApiError, ApiResult, AppState};
use crate::models::User;

/// Unread notifications for the authenticated agent. Staff only.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    if !user.is_staff {
        return Err(ApiError::Forbidden("Staff capability required".to_string()));
    }
    let notifications = state.db.list_unread_notifications(&user.id).await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !user.is_staff {
        return Err(ApiError::Forbidden("Staff capability required".to_string()));
    }

    let notification = state
        .db
        .get_notification_by_id(&id)
        .await?
        .filter(|n| n.agent_id == user.id)
        .ok_or_else(|| ApiError::NotFound(format!("Notification {} not found", id)))?;

    state.db.mark_notification_read(&notification.id).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}
