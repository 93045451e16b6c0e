use std::sync::Arc;

use tracing::{info, warn};

use crate::api::middleware::error::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{now_rfc3339, ChatMessage, NotificationKind, Room, RoomStatus, SenderType, User};
use crate::services::notifier::NotificationDispatcher;

const GREETING: &str = "Hello! I'm here to help. How can I assist you today?";
const CLOSING: &str = "This support conversation has been closed. Thank you!";

/// Room lifecycle and access control. Status transitions notify interested
/// parties through explicit dispatcher calls after the write succeeds.
pub struct RoomService {
    db: Database,
    notifier: Arc<NotificationDispatcher>,
}

impl RoomService {
    pub fn new(db: Database, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { db, notifier }
    }

    /// Create a pending room for the customer, or hand back their existing
    /// open room unchanged. At most one pending/active room exists per
    /// customer; the check lives here, not in a database constraint.
    ///
    /// Returns the room and whether it was newly created.
    pub async fn create_room(
        &self,
        customer: &User,
        subject: Option<String>,
    ) -> ApiResult<(Room, bool)> {
        if let Some(existing) = self.db.find_open_room_for_customer(&customer.id).await? {
            info!(room_id = %existing.room_id, customer_id = %customer.id, "room: reusing open room");
            return Ok((existing, false));
        }

        let subject = subject.unwrap_or_else(|| "Support Request".to_string());
        let room = Room::new(customer.id.clone(), subject);
        self.db.create_room(&room).await?;

        let greeting = ChatMessage::bot(room.id.clone(), GREETING.to_string());
        self.db.create_message(&greeting).await?;

        // The room exists once its row is written; a failed staff fan-out
        // must not undo the creation.
        if let Err(e) = self
            .notifier
            .notify_all_staff(
                NotificationKind::NewRequest,
                &format!("New support request from {}", customer.email),
                &room,
            )
            .await
        {
            warn!(room_id = %room.room_id, error = %e, "room: staff fan-out failed");
        }

        info!(room_id = %room.room_id, customer_id = %customer.id, "room: created");
        Ok((room, true))
    }

    /// pending -> active: the accepting staff member becomes the assigned
    /// agent. Rejected from any other state.
    pub async fn accept_room(&self, room_id: &str, agent: &User) -> ApiResult<Room> {
        if !agent.is_staff {
            return Err(ApiError::Forbidden("Staff capability required".to_string()));
        }

        let mut room = self
            .db
            .get_room(room_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Room {} not found", room_id)))?;

        if room.status != RoomStatus::Pending {
            return Err(ApiError::BadRequest("Room is not pending".to_string()));
        }

        let now = now_rfc3339();
        self.db.assign_agent(&room.id, &agent.id, &now).await?;
        room.agent_id = Some(agent.id.clone());
        room.status = RoomStatus::Active;
        room.updated_at = now;

        let announcement = ChatMessage::bot(
            room.id.clone(),
            format!("Support agent {} has joined the chat.", agent.username),
        );
        self.db.create_message(&announcement).await?;

        if let Ok(Some(customer)) = self.db.get_user_by_id(&room.customer_id).await {
            self.notifier
                .notify_customer(
                    &customer,
                    NotificationKind::Assigned,
                    format!("Support agent {} is now available to help", agent.username),
                    &room,
                )
                .await;
        }

        info!(room_id = %room.room_id, agent_id = %agent.id, "room: accepted");
        Ok(room)
    }

    /// Either party moves the room to resolved. Terminal states never
    /// transition again.
    pub async fn close_room(&self, room_id: &str, actor: &User) -> ApiResult<Room> {
        let mut room = self
            .db
            .get_room(room_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Room {} not found", room_id)))?;

        let is_party = room.customer_id == actor.id
            || room.agent_id.as_deref() == Some(actor.id.as_str());
        if !is_party {
            return Err(ApiError::Forbidden(
                "Only the customer or assigned agent can close this room".to_string(),
            ));
        }

        if room.status.is_terminal() {
            return Err(ApiError::BadRequest("Room is already closed".to_string()));
        }

        let now = now_rfc3339();
        self.db
            .resolve_room(&room.id, RoomStatus::Resolved, &now)
            .await?;
        room.status = RoomStatus::Resolved;
        room.resolved_at = Some(now.clone());
        room.updated_at = now;

        let closing = ChatMessage::bot(room.id.clone(), CLOSING.to_string());
        self.db.create_message(&closing).await?;

        if let Some(agent_id) = room.agent_id.as_deref() {
            if let Ok(Some(agent)) = self.db.get_user_by_id(agent_id).await {
                if let Err(e) = self
                    .notifier
                    .notify(
                        &agent,
                        NotificationKind::Resolved,
                        "Support conversation has been closed".to_string(),
                        &room,
                    )
                    .await
                {
                    warn!(room_id = %room.room_id, error = %e, "room: close notify failed");
                }
            }
        }
        if let Ok(Some(customer)) = self.db.get_user_by_id(&room.customer_id).await {
            self.notifier
                .notify_customer(
                    &customer,
                    NotificationKind::Resolved,
                    "Your support conversation has been resolved".to_string(),
                    &room,
                )
                .await;
        }

        info!(room_id = %room.room_id, actor_id = %actor.id, "room: closed");
        Ok(room)
    }

    /// Flip the counterparty's unread messages: a customer's mark_read
    /// flips agent-authored messages and vice versa. Bot messages are left
    /// untouched, as is everything when the user is not a participant.
    pub async fn mark_read(&self, room: &Room, user: &User) -> ApiResult<u64> {
        if room.agent_id.as_deref() == Some(user.id.as_str()) {
            self.db.mark_messages_read(&room.id, SenderType::Customer).await
        } else if room.customer_id == user.id {
            self.db.mark_messages_read(&room.id, SenderType::Agent).await
        } else {
            Ok(0)
        }
    }
}
