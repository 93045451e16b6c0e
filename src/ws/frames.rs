use serde::{Deserialize, Serialize};

use crate::models::{NotificationKind, SenderType};

/// Frames a connected client may send. Unrecognized tags deserialize to
/// `Unknown` and are ignored, keeping forward-compatible clients working.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    ChatMessage { message: String },
    Typing { is_typing: bool },
    MarkRead,
    MarkAllRead,
    #[serde(other)]
    Unknown,
}

/// Frames delivered to connected clients through the fan-out hub.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    ConnectionEstablished {
        message: String,
    },
    ChatMessage {
        message: String,
        sender_type: SenderType,
        sender_email: String,
        timestamp: String,
        message_id: String,
    },
    Typing {
        user_email: String,
        is_typing: bool,
    },
    Notification {
        notification_type: NotificationKind,
        message: String,
        room_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

impl OutboundFrame {
    pub fn connection_established(message: &str) -> Self {
        OutboundFrame::ConnectionEstablished {
            message: message.to_string(),
        }
    }
}
