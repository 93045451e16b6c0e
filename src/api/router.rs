use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api;
use crate::api::middleware::{require_auth, AppState};
use crate::ws;

pub fn build_router(state: AppState) -> Router {
    // Request/response surface behind bearer auth
    let protected = Router::new()
        .route(
            "/api/support/rooms",
            post(api::rooms::create_room).get(api::rooms::list_rooms),
        )
        .route(
            "/api/support/rooms/pending",
            get(api::rooms::list_pending_rooms),
        )
        .route(
            "/api/support/rooms/:room_id/accept",
            post(api::rooms::accept_room),
        )
        .route(
            "/api/support/rooms/:room_id/close",
            post(api::rooms::close_room),
        )
        .route(
            "/api/support/rooms/:room_id/messages",
            get(api::messages::list_messages).post(api::messages::send_message),
        )
        .route(
            "/api/support/notifications",
            get(api::notifications::list_notifications),
        )
        .route(
            "/api/support/notifications/:id/read",
            post(api::notifications::mark_notification_read),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // WebSocket endpoints authenticate inside the upgrade handler (the
    // credential arrives as a query parameter, not a header).
    Router::new()
        .merge(protected)
        .route("/ws/chat/:room_id", get(ws::chat::chat_ws))
        .route("/ws/notifications", get(ws::notifications::notifications_ws))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
