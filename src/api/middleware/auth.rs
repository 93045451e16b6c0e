use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::api::middleware::error::ApiError;
use crate::database::Database;
use crate::models::Identity;
use crate::services::{
    IdentityService, MessagePipeline, NotificationDispatcher, RoomService,
};
use crate::ws::hub::Hub;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: Arc<Hub>,
    pub identity: IdentityService,
    pub rooms: Arc<RoomService>,
    pub pipeline: Arc<MessagePipeline>,
    pub notifier: Arc<NotificationDispatcher>,
}

/// Extract and resolve the bearer token from the Authorization header.
/// Anonymous resolution means no access for the request/response surface.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match state.identity.resolve(token).await {
        Identity::Known(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Identity::Anonymous => Err(ApiError::Unauthorized),
    }
}
