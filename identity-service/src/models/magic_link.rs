//! Magic link model - single-use, time-boxed sign-in credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Magic link entity. Only the hash of the opaque token is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MagicLink {
    pub id: Uuid,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, when the link is redeemed.
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MagicLink {
    /// Create an unused link issued at `now`, valid for `ttl_minutes`.
    pub fn new(api_key: String, token_hash: String, now: DateTime<Utc>, ttl_minutes: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            api_key,
            token_hash,
            expires_at: now + Duration::minutes(ttl_minutes),
            used_at: None,
            created_at: now,
        }
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Expiry is strict: a link is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_computed_from_issue_time() {
        let now = Utc::now();
        let link = MagicLink::new("key123".into(), "hash".into(), now, 5);

        assert_eq!(link.expires_at - link.created_at, Duration::minutes(5));
        assert!(!link.is_used());
        assert!(!link.is_expired_at(now));
        assert!(!link.is_expired_at(link.expires_at));
        assert!(link.is_expired_at(link.expires_at + Duration::seconds(1)));
    }
}
