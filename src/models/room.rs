use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Pending,
    Active,
    Resolved,
    Closed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Pending => "pending",
            RoomStatus::Active => "active",
            RoomStatus::Resolved => "resolved",
            RoomStatus::Closed => "closed",
        }
    }

    /// Resolved and closed rooms never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoomStatus::Resolved | RoomStatus::Closed)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Convert from string (for SQLx row mapping)
impl From<String> for RoomStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "active" => RoomStatus::Active,
            "resolved" => RoomStatus::Resolved,
            "closed" => RoomStatus::Closed,
            _ => RoomStatus::Pending,
        }
    }
}

/// A single ongoing support conversation between one customer and at most
/// one agent. `room_id` is the opaque public identifier used on the wire;
/// `id` is the storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub room_id: String,
    pub customer_id: String,
    pub agent_id: Option<String>,
    pub status: RoomStatus,
    pub subject: String,
    pub created_at: String,
    pub updated_at: String,
    pub resolved_at: Option<String>,
}

impl Room {
    pub fn new(customer_id: String, subject: String) -> Self {
        let now = crate::models::now_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            room_id: format!("room_{}", &Uuid::new_v4().simple().to_string()[..12]),
            customer_id,
            agent_id: None,
            status: RoomStatus::Pending,
            subject,
            created_at: now.clone(),
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Access is granted to the room's customer, its assigned agent, and
    /// anyone holding the staff capability.
    pub fn user_can_access(&self, user: &User) -> bool {
        self.customer_id == user.id
            || self.agent_id.as_deref() == Some(user.id.as_str())
            || user.is_staff
    }

    /// Fan-out bus group name for this room.
    pub fn group_name(&self) -> String {
        format!("chat_{}", self.room_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub subject: Option<String>,
}
