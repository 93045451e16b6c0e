use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authentication session mapping an opaque bearer token to a user.
/// Issued by the external identity provider; the core only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
}

impl Session {
    pub fn new(user_id: String, duration_hours: i64) -> Self {
        let now = Utc::now();
        let expires_at = now + Duration::hours(duration_hours);

        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            token: generate_token(),
            expires_at: expires_at.to_rfc3339(),
            created_at: now.to_rfc3339(),
        }
    }

    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => expires_at.with_timezone(&Utc) < Utc::now(),
            // Unparseable expiry is treated as expired.
            Err(_) => true,
        }
    }
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
