use sqlx::Row;

use crate::api::middleware::error::ApiResult;
use crate::database::Database;
use crate::models::{ChatMessage, SenderType};

impl Database {
    pub async fn create_message(&self, message: &ChatMessage) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, room_id, sender_id, sender_type, body, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.room_id)
        .bind(&message.sender_id)
        .bind(message.sender_type.as_str())
        .bind(&message.body)
        .bind(if message.is_read { 1 } else { 0 })
        .bind(&message.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// All messages of a room in canonical conversation order.
    pub async fn list_messages(&self, room_db_id: &str) -> ApiResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, room_id, sender_id, sender_type, body, is_read, created_at
             FROM chat_messages
             WHERE room_id = ?
             ORDER BY created_at",
        )
        .bind(room_db_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_message).collect()
    }

    /// The most recent `limit` messages, newest first. Callers reverse the
    /// result when they need chronological order (responder context).
    pub async fn list_recent_messages(
        &self,
        room_db_id: &str,
        limit: i64,
    ) -> ApiResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, room_id, sender_id, sender_type, body, is_read, created_at
             FROM chat_messages
             WHERE room_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(room_db_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_message).collect()
    }

    /// Flip the read flag on unread messages authored by `sender_type` in a
    /// room. Used by mark_read: an agent flips customer-authored messages
    /// and vice versa; bot messages are never touched.
    pub async fn mark_messages_read(
        &self,
        room_db_id: &str,
        sender_type: SenderType,
    ) -> ApiResult<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET is_read = 1
             WHERE room_id = ? AND sender_type = ? AND is_read = 0",
        )
        .bind(room_db_id)
        .bind(sender_type.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

fn map_message(row: &sqlx::any::AnyRow) -> ApiResult<ChatMessage> {
    let sender_type: String = row.try_get("sender_type")?;
    let is_read: i32 = row.try_get("is_read")?;

    Ok(ChatMessage {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        sender_id: row.try_get("sender_id").ok(),
        sender_type: SenderType::from(sender_type),
        body: row.try_get("body")?,
        is_read: is_read != 0,
        created_at: row.try_get("created_at")?,
    })
}
