use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::middleware::error::{ApiError, ApiResult};
use crate::database::Database;
use crate::models::{ChatMessage, NotificationKind, Room, RoomStatus, SenderType, User};
use crate::services::notifier::NotificationDispatcher;
use crate::services::responder::{needs_escalation, ResponderService};
use crate::ws::frames::OutboundFrame;
use crate::ws::hub::Hub;

/// How much room history the responder sees.
const RESPONDER_CONTEXT_MESSAGES: i64 = 5;

/// Sender label used on broadcast bot messages, which carry no identity.
const BOT_SENDER_EMAIL: &str = "AI Assistant";

/// Accepts an inbound chat message: validate, persist, broadcast, then run
/// at most one post-persistence side-effect branch.
///
/// The broadcast only ever happens after the row is written, so peers never
/// see a message that is missing from history.
pub struct MessagePipeline {
    db: Database,
    hub: Arc<Hub>,
    responder: Arc<ResponderService>,
    notifier: Arc<NotificationDispatcher>,
}

impl MessagePipeline {
    pub fn new(
        db: Database,
        hub: Arc<Hub>,
        responder: Arc<ResponderService>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            db,
            hub,
            responder,
            notifier,
        }
    }

    pub async fn submit_message(
        &self,
        room_id: &str,
        sender: &User,
        body: &str,
    ) -> ApiResult<ChatMessage> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ApiError::BadRequest("Message is required".to_string()));
        }

        let room = self
            .db
            .get_room(room_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Room {} not found", room_id)))?;

        // Only the two parties may write; staff spectators cannot.
        let sender_type = if room.customer_id == sender.id {
            SenderType::Customer
        } else if room.agent_id.as_deref() == Some(sender.id.as_str()) {
            SenderType::Agent
        } else {
            return Err(ApiError::Forbidden(
                "Not a participant in this room".to_string(),
            ));
        };

        let message = ChatMessage::new(
            room.id.clone(),
            sender.id.clone(),
            sender_type,
            body.to_string(),
        );
        self.db.create_message(&message).await?;

        // The sender's own broadcast copy doubles as its write confirmation,
        // so no send_except here.
        self.broadcast_message(&room, &message, &sender.email).await;

        info!(
            room_id = %room.room_id,
            message_id = %message.id,
            sender_type = %sender_type,
            "pipeline: message accepted"
        );

        self.run_side_effects(&room, sender, sender_type, body).await;

        Ok(message)
    }

    /// At most one branch fires per submission, in priority order.
    async fn run_side_effects(
        &self,
        room: &Room,
        sender: &User,
        sender_type: SenderType,
        body: &str,
    ) {
        match (sender_type, room.status) {
            (SenderType::Customer, RoomStatus::Pending) => {
                self.bot_turn(room, sender, body).await;
            }
            (SenderType::Customer, RoomStatus::Active) => {
                let Some(agent_id) = room.agent_id.as_deref() else {
                    return;
                };
                match self.db.get_user_by_id(agent_id).await {
                    Ok(Some(agent)) => {
                        if let Err(e) = self
                            .notifier
                            .notify(
                                &agent,
                                NotificationKind::Message,
                                format!("New message from {}", sender.email),
                                room,
                            )
                            .await
                        {
                            warn!(room_id = %room.room_id, error = %e, "pipeline: agent notify failed");
                        }
                    }
                    Ok(None) => {
                        warn!(room_id = %room.room_id, agent_id, "pipeline: assigned agent missing");
                    }
                    Err(e) => {
                        warn!(room_id = %room.room_id, error = %e, "pipeline: agent lookup failed");
                    }
                }
            }
            (SenderType::Agent, _) => {
                // Best effort; the message itself is already durable.
                if let Ok(Some(customer)) = self.db.get_user_by_id(&room.customer_id).await {
                    self.notifier
                        .notify_customer(
                            &customer,
                            NotificationKind::Message,
                            format!("New message from {}", sender.email),
                            room,
                        )
                        .await;
                }
            }
            _ => {
                // Writes to resolved/closed rooms are archival: accepted,
                // but they trigger nothing.
                debug!(room_id = %room.room_id, status = %room.status, "pipeline: no side effects");
            }
        }
    }

    /// Bot reply for a pending room, then an independent escalation check
    /// against the customer's original words.
    async fn bot_turn(&self, room: &Room, customer: &User, customer_text: &str) {
        let mut context = match self
            .db
            .list_recent_messages(&room.id, RESPONDER_CONTEXT_MESSAGES)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(room_id = %room.room_id, error = %e, "pipeline: context fetch failed");
                Vec::new()
            }
        };
        // Newest-first from storage; the responder wants chronological.
        context.reverse();

        if let Some(reply) = self.responder.generate_reply(&context, customer_text).await {
            let bot_message = ChatMessage::bot(room.id.clone(), reply);
            match self.db.create_message(&bot_message).await {
                Ok(()) => {
                    self.broadcast_message(room, &bot_message, BOT_SENDER_EMAIL).await;
                }
                Err(e) => {
                    // Not persisted, so not broadcast either.
                    warn!(room_id = %room.room_id, error = %e, "pipeline: bot message write failed");
                    return;
                }
            }

            if needs_escalation(customer_text) {
                info!(room_id = %room.room_id, "pipeline: escalation keywords detected");
                if let Err(e) = self
                    .notifier
                    .notify_all_staff(
                        NotificationKind::NewRequest,
                        &format!("Customer needs help: {}", customer.email),
                        room,
                    )
                    .await
                {
                    warn!(room_id = %room.room_id, error = %e, "pipeline: escalation fan-out failed");
                }
            }
        }
    }

    async fn broadcast_message(&self, room: &Room, message: &ChatMessage, sender_email: &str) {
        let frame = OutboundFrame::ChatMessage {
            message: message.body.clone(),
            sender_type: message.sender_type,
            sender_email: sender_email.to_string(),
            timestamp: message.created_at.clone(),
            message_id: message.id.clone(),
        };
        self.hub.send(&room.group_name(), &frame).await;
    }
}
