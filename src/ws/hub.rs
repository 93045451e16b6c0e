use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::ws::frames::OutboundFrame;

/// Outbound handle for one connected session. The socket task drains the
/// receiving end into the transport.
pub type SessionSender = mpsc::UnboundedSender<String>;

/// Per-user notification stream group.
pub fn notification_group(user_id: &str) -> String {
    format!("notifications_{}", user_id)
}

/// Fan-out bus: named groups of currently-connected sessions.
///
/// Delivery is at-most-once per joined session and never retroactive; late
/// joiners fetch history through the room registry instead. Events are
/// enqueued under the lock, so within one group they reach every member in
/// the order `send` calls were issued.
#[derive(Default)]
pub struct Hub {
    groups: RwLock<HashMap<String, HashMap<String, SessionSender>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, group: &str, session_id: &str, sender: SessionSender) {
        let mut groups = self.groups.write().await;
        groups
            .entry(group.to_string())
            .or_default()
            .insert(session_id.to_string(), sender);
        debug!(group, session_id, "hub: session joined");
    }

    /// Remove a session from every group it joined. Called on transport
    /// teardown, whatever the cause.
    pub async fn leave_all(&self, session_id: &str) {
        let mut groups = self.groups.write().await;
        groups.retain(|group, members| {
            if members.remove(session_id).is_some() {
                debug!(group = %group, session_id = %session_id, "hub: session left");
            }
            !members.is_empty()
        });
    }

    /// Deliver a frame to every current member of a group. Returns the
    /// number of sessions reached.
    pub async fn send(&self, group: &str, frame: &OutboundFrame) -> usize {
        self.deliver(group, frame, None).await
    }

    /// Deliver to all members except one session (typing indicators echo
    /// to everyone but the sender).
    pub async fn send_except(&self, group: &str, frame: &OutboundFrame, excluded: &str) -> usize {
        self.deliver(group, frame, Some(excluded)).await
    }

    pub async fn member_count(&self, group: &str) -> usize {
        self.groups
            .read()
            .await
            .get(group)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    async fn deliver(&self, group: &str, frame: &OutboundFrame, excluded: Option<&str>) -> usize {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                warn!(group, error = %e, "hub: failed to serialize frame");
                return 0;
            }
        };

        let mut groups = self.groups.write().await;
        let Some(members) = groups.get_mut(group) else {
            return 0;
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (session_id, sender) in members.iter() {
            if excluded == Some(session_id.as_str()) {
                continue;
            }
            if sender.send(json.clone()).is_ok() {
                delivered += 1;
            } else {
                // Receiver dropped without a clean leave; prune it.
                dead.push(session_id.clone());
            }
        }
        for session_id in dead {
            members.remove(&session_id);
        }
        if members.is_empty() {
            groups.remove(group);
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn typing(email: &str) -> OutboundFrame {
        OutboundFrame::Typing {
            user_email: email.to_string(),
            is_typing: true,
        }
    }

    #[tokio::test]
    async fn send_reaches_all_group_members_in_order() {
        let hub = Hub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.join("chat_room_1", "a", tx_a).await;
        hub.join("chat_room_1", "b", tx_b).await;

        hub.send("chat_room_1", &typing("first@x.y")).await;
        hub.send("chat_room_1", &typing("second@x.y")).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let first = rx.try_recv().unwrap();
            let second = rx.try_recv().unwrap();
            assert!(first.contains("first@x.y"));
            assert!(second.contains("second@x.y"));
        }
    }

    #[tokio::test]
    async fn send_except_skips_the_sender_session() {
        let hub = Hub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.join("g", "a", tx_a).await;
        hub.join("g", "b", tx_b).await;

        let delivered = hub.send_except("g", &typing("a@x.y"), "a").await;

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn leave_all_removes_session_from_every_group() {
        let hub = Hub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.join("g1", "s", tx.clone()).await;
        hub.join("g2", "s", tx).await;

        hub.leave_all("s").await;

        assert_eq!(hub.send("g1", &typing("x@x.y")).await, 0);
        assert_eq!(hub.send("g2", &typing("x@x.y")).await, 0);
        assert!(rx.try_recv().is_err());
        // Repeating the teardown is harmless.
        hub.leave_all("s").await;
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_send() {
        let hub = Hub::new();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        hub.join("g", "dead", tx_dead).await;
        hub.join("g", "live", tx_live).await;
        drop(rx_dead);

        let delivered = hub.send("g", &typing("x@x.y")).await;

        assert_eq!(delivered, 1);
        assert!(rx_live.try_recv().is_ok());
        assert_eq!(hub.member_count("g").await, 1);
    }
}
