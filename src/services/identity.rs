use tracing::{debug, error, warn};

use crate::database::Database;
use crate::models::Identity;

/// Resolves an opaque bearer credential to a user identity.
///
/// Every failure kind resolves to `Identity::Anonymous` rather than an
/// error; callers treat anonymous uniformly as "no access". The match below
/// keeps each failure observable in the logs instead of collapsing them
/// into a silent catch-all.
#[derive(Clone)]
pub struct IdentityService {
    db: Database,
}

impl IdentityService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, token: Option<&str>) -> Identity {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                debug!("identity: no credential supplied");
                return Identity::Anonymous;
            }
        };

        let session = match self.db.get_session_by_token(token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("identity: unknown token");
                return Identity::Anonymous;
            }
            Err(e) => {
                // Storage failure is unexpected; log loudly but still fail
                // open to anonymous, never to a default identity.
                error!(error = %e, "identity: session lookup failed");
                return Identity::Anonymous;
            }
        };

        if session.is_expired() {
            debug!(user_id = %session.user_id, "identity: session expired");
            return Identity::Anonymous;
        }

        match self.db.get_user_by_id(&session.user_id).await {
            Ok(Some(user)) if user.is_active => Identity::Known(user),
            Ok(Some(user)) => {
                warn!(user_id = %user.id, "identity: user is inactive");
                Identity::Anonymous
            }
            Ok(None) => {
                warn!(user_id = %session.user_id, "identity: session points at missing user");
                Identity::Anonymous
            }
            Err(e) => {
                error!(error = %e, "identity: user lookup failed");
                Identity::Anonymous
            }
        }
    }
}
