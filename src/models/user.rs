use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub fcm_token: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn new(email: String, username: String, is_staff: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            username,
            is_staff,
            is_active: true,
            fcm_token: None,
            created_at: crate::models::now_rfc3339(),
        }
    }
}

/// A connecting peer's resolved identity. Verification failure of any kind
/// resolves to `Anonymous`, never to an error (see `IdentityService`).
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Known(User),
}
