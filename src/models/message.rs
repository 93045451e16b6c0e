use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Customer,
    Agent,
    Bot,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Customer => "customer",
            SenderType::Agent => "agent",
            SenderType::Bot => "bot",
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for SenderType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "customer" => SenderType::Customer,
            "agent" => SenderType::Agent,
            _ => SenderType::Bot,
        }
    }
}

/// A chat message belonging to exactly one room. `sender_id` is absent for
/// automated (bot) messages. Canonical conversation order is `created_at`
/// ascending within a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub sender_id: Option<String>,
    pub sender_type: SenderType,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

impl ChatMessage {
    pub fn new(room_id: String, sender_id: String, sender_type: SenderType, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            sender_id: Some(sender_id),
            sender_type,
            body,
            is_read: false,
            created_at: crate::models::now_rfc3339(),
        }
    }

    pub fn bot(room_id: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            sender_id: None,
            sender_type: SenderType::Bot,
            body,
            is_read: false,
            created_at: crate::models::now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Message row as returned by the HTTP list/send endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub room_id: String,
    pub sender_id: Option<String>,
    pub sender_type: SenderType,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<ChatMessage> for MessageResponse {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            room_id: m.room_id,
            sender_id: m.sender_id,
            sender_type: m.sender_type,
            message: m.body,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}
