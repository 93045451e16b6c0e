use sqlx::{any::AnyPoolOptions, AnyPool, Row};

use crate::{api::middleware::error::ApiResult, models::User};

mod messages;
mod notifications;
mod rooms;
mod sessions;

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = AnyPoolOptions::new()
            .max_connections(20)
            .min_connections(1)
            .connect(database_url)
            .await?;

        // Enable foreign keys for SQLite
        if database_url.starts_with("sqlite") {
            sqlx::query("PRAGMA foreign_keys = ON")
                .execute(&pool)
                .await?;
        }

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    // User operations

    pub async fn create_user(&self, user: &User) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, username, is_staff, is_active, fcm_token, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(if user.is_staff { 1 } else { 0 })
        .bind(if user.is_active { 1 } else { 0 })
        .bind(&user.fcm_token)
        .bind(&user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, is_staff, is_active, fcm_token, created_at
             FROM users
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_user(&r)).transpose()
    }

    /// Staff users eligible to receive escalation and new-request fan-outs.
    pub async fn list_active_staff(&self) -> ApiResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, email, username, is_staff, is_active, fcm_token, created_at
             FROM users
             WHERE is_staff = 1 AND is_active = 1
             ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_user).collect()
    }
}

fn map_user(row: &sqlx::any::AnyRow) -> ApiResult<User> {
    let is_staff: i32 = row.try_get("is_staff")?;
    let is_active: i32 = row.try_get("is_active")?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        is_staff: is_staff != 0,
        is_active: is_active != 0,
        fcm_token: row.try_get("fcm_token").ok(),
        created_at: row.try_get("created_at")?,
    })
}
