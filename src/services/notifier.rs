use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::middleware::error::ApiResult;
use crate::database::Database;
use crate::models::{Notification, NotificationKind, Room, User};
use crate::ws::frames::OutboundFrame;
use crate::ws::hub::{notification_group, Hub};

/// External push-delivery channel (FCM-style). Network failures and missing
/// device tokens are the provider's problem to report, never to raise.
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), String>;

    fn provider_name(&self) -> &'static str;
}

/// FCM legacy HTTP provider.
pub struct FcmPushProvider {
    client: reqwest::Client,
    endpoint: String,
    server_key: Option<String>,
}

impl FcmPushProvider {
    pub fn new(endpoint: String, server_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint,
            server_key,
        }
    }
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    async fn push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<(), String> {
        let server_key = self
            .server_key
            .as_deref()
            .ok_or_else(|| "push provider not configured".to_string())?;

        let payload = serde_json::json!({
            "to": device_token,
            "notification": {
                "title": title,
                "body": body,
            },
            "data": data,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", server_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("push request failed: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("push rejected with status {}", response.status()))
        }
    }

    fn provider_name(&self) -> &'static str {
        "fcm"
    }
}

/// Mock push provider for tests.
pub struct MockPushProvider {
    pub should_fail: bool,
}

impl MockPushProvider {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockPushProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushProvider for MockPushProvider {
    async fn push(
        &self,
        device_token: &str,
        _title: &str,
        _body: &str,
        _data: serde_json::Value,
    ) -> Result<(), String> {
        if self.should_fail {
            Err(format!("mock push failure for token {}", device_token))
        } else {
            Ok(())
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Writes durable notification records, then pushes them out on a
/// best-effort basis: hub group first, external push channel second.
/// Only the durable write can fail the call.
pub struct NotificationDispatcher {
    db: Database,
    hub: Arc<Hub>,
    push: Arc<dyn PushProvider>,
}

impl NotificationDispatcher {
    pub fn new(db: Database, hub: Arc<Hub>, push: Arc<dyn PushProvider>) -> Self {
        Self { db, hub, push }
    }

    pub async fn notify(
        &self,
        agent: &User,
        kind: NotificationKind,
        message: String,
        room: &Room,
    ) -> ApiResult<Notification> {
        let notification = Notification::new(
            agent.id.clone(),
            room.room_id.clone(),
            kind,
            message.clone(),
        );
        // Durability point: nothing is pushed unless the record exists.
        self.db.create_notification(&notification).await?;

        let frame = OutboundFrame::Notification {
            notification_type: kind,
            message: message.clone(),
            room_id: room.room_id.clone(),
            timestamp: Some(notification.created_at.clone()),
        };
        self.hub.send(&notification_group(&agent.id), &frame).await;

        self.push_best_effort(agent, kind, &message, room).await;

        Ok(notification)
    }

    /// Fan out to every active staff identity. One agent's failure never
    /// blocks delivery to the rest.
    pub async fn notify_all_staff(
        &self,
        kind: NotificationKind,
        message: &str,
        room: &Room,
    ) -> ApiResult<usize> {
        let staff = self.db.list_active_staff().await?;
        let mut delivered = 0;

        for agent in &staff {
            match self.notify(agent, kind, message.to_string(), room).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(agent_id = %agent.id, error = %e, "notify: staff fan-out entry failed");
                }
            }
        }

        Ok(delivered)
    }

    /// Best-effort customer delivery: realtime frame plus push, no durable
    /// record. Notification rows target agents only.
    pub async fn notify_customer(
        &self,
        customer: &User,
        kind: NotificationKind,
        message: String,
        room: &Room,
    ) {
        let frame = OutboundFrame::Notification {
            notification_type: kind,
            message: message.clone(),
            room_id: room.room_id.clone(),
            timestamp: None,
        };
        self.hub
            .send(&notification_group(&customer.id), &frame)
            .await;

        self.push_best_effort(customer, kind, &message, room).await;
    }

    pub async fn mark_all_read(&self, agent_id: &str) -> ApiResult<u64> {
        self.db.mark_all_notifications_read(agent_id).await
    }

    async fn push_best_effort(&self, user: &User, kind: NotificationKind, body: &str, room: &Room) {
        let Some(device_token) = user.fcm_token.as_deref() else {
            debug!(user_id = %user.id, "notify: no device token, skipping push");
            return;
        };

        let data = serde_json::json!({
            "room_id": room.room_id,
            "type": kind.as_str(),
        });
        if let Err(e) = self
            .push
            .push(device_token, "Support chat", body, data)
            .await
        {
            warn!(
                provider = self.push.provider_name(),
                user_id = %user.id,
                error = %e,
                "notify: push delivery failed"
            );
        }
    }
}
