pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod rooms;
pub mod router;
