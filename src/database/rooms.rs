use sqlx::Row;

use crate::api::middleware::error::ApiResult;
use crate::database::Database;
use crate::models::{Room, RoomStatus};

impl Database {
    pub async fn create_room(&self, room: &Room) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO support_rooms (id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&room.id)
        .bind(&room.room_id)
        .bind(&room.customer_id)
        .bind(&room.agent_id)
        .bind(room.status.as_str())
        .bind(&room.subject)
        .bind(&room.created_at)
        .bind(&room.updated_at)
        .bind(&room.resolved_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Look up a room by its opaque public identifier.
    pub async fn get_room(&self, room_id: &str) -> ApiResult<Option<Room>> {
        let row = sqlx::query(
            "SELECT id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at
             FROM support_rooms
             WHERE room_id = ?",
        )
        .bind(room_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| map_room(&r)).transpose()
    }

    /// The customer's currently open (pending or active) room, if any.
    /// Backs the single-open-room-per-customer invariant.
    pub async fn find_open_room_for_customer(&self, customer_id: &str) -> ApiResult<Option<Room>> {
        let row = sqlx::query(
            "SELECT id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at
             FROM support_rooms
             WHERE customer_id = ? AND status IN ('pending', 'active')
             ORDER BY created_at
             LIMIT 1",
        )
        .bind(customer_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| map_room(&r)).transpose()
    }

    pub async fn list_rooms_for_customer(&self, customer_id: &str) -> ApiResult<Vec<Room>> {
        let rows = sqlx::query(
            "SELECT id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at
             FROM support_rooms
             WHERE customer_id = ?
             ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_room).collect()
    }

    pub async fn list_rooms_for_agent(&self, agent_id: &str) -> ApiResult<Vec<Room>> {
        let rows = sqlx::query(
            "SELECT id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at
             FROM support_rooms
             WHERE agent_id = ?
             ORDER BY created_at DESC",
        )
        .bind(agent_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_room).collect()
    }

    pub async fn list_pending_rooms(&self) -> ApiResult<Vec<Room>> {
        let rows = sqlx::query(
            "SELECT id, room_id, customer_id, agent_id, status, subject, created_at, updated_at, resolved_at
             FROM support_rooms
             WHERE status = 'pending'
             ORDER BY created_at",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(map_room).collect()
    }

    /// pending -> active: assign the accepting agent.
    pub async fn assign_agent(&self, id: &str, agent_id: &str, now: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE support_rooms SET agent_id = ?, status = 'active', updated_at = ? WHERE id = ?",
        )
        .bind(agent_id)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Move a room into a terminal state, stamping the resolution time.
    pub async fn resolve_room(&self, id: &str, status: RoomStatus, now: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE support_rooms SET status = ?, resolved_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}

fn map_room(row: &sqlx::any::AnyRow) -> ApiResult<Room> {
    let status: String = row.try_get("status")?;

    Ok(Room {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        customer_id: row.try_get("customer_id")?,
        agent_id: row.try_get("agent_id").ok(),
        status: RoomStatus::from(status),
        subject: row.try_get("subject")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        resolved_at: row.try_get("resolved_at").ok(),
    })
}
