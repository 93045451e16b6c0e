use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewRequest,
    Message,
    Assigned,
    Resolved,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewRequest => "new_request",
            NotificationKind::Message => "message",
            NotificationKind::Assigned => "assigned",
            NotificationKind::Resolved => "resolved",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NotificationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "new_request" => NotificationKind::NewRequest,
            "assigned" => NotificationKind::Assigned,
            "resolved" => NotificationKind::Resolved,
            _ => NotificationKind::Message,
        }
    }
}

/// Durable notification record targeting one agent. The realtime push is a
/// side effect; this row persists whether or not anyone was connected.
/// `room_id` holds the room's public identifier, for context only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub agent_id: String,
    pub room_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl Notification {
    pub fn new(agent_id: String, room_id: String, kind: NotificationKind, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id,
            room_id,
            kind,
            message,
            is_read: false,
            created_at: crate::models::now_rfc3339(),
        }
    }
}
