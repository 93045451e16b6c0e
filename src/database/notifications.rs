use sqlx::Row;

use crate::api::middleware::error::ApiResult;
use crate::database::Database;
use crate::models::{Notification, NotificationKind};

impl Database {
    pub async fn create_notification(&self, notification: &Notification) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, agent_id, room_id, kind, message, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.agent_id)
        .bind(&notification.room_id)
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(if notification.is_read { 1 } else { 0 })
        .bind(&notification.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_notification_by_id(&self, id: &str) -> ApiResult<Option<Notification>> {
        let row = sqlx::query(
            "SELECT id, agent_id, room_id, kind, message, is_read, created_at
             FROM notifications
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| map_notification(&r)).transpose()
    }

    pub async fn list_unread_notifications(&self, agent_id: &str) -> ApiResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, agent_id, room_id, kind, message, is_read, created_at
             FROM notifications
             WHERE agent_id = ? AND is_read = 0
             ORDER BY created_at DESC",
        )
        .bind(agent_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_notification).collect()
    }

    pub async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    pub async fn mark_all_notifications_read(&self, agent_id: &str) -> ApiResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE agent_id = ? AND is_read = 0",
        )
        .bind(agent_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

fn map_notification(row: &sqlx::any::AnyRow) -> ApiResult<Notification> {
    let kind: String = row.try_get("kind")?;
    let is_read: i32 = row.try_get("is_read")?;

    Ok(Notification {
        id: row.try_get("id")?,
        agent_id: row.try_get("agent_id")?,
        room_id: row.try_get("room_id")?,
        kind: NotificationKind::from(kind),
        message: row.try_get("message")?,
        is_read: is_read != 0,
        created_at: row.try_get("created_at")?,
    })
}
