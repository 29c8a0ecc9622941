//! Account user model - principals allowed to manage an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Owner,
    Admin,
    Member,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Owner => "owner",
            AccountRole::Admin => "admin",
            AccountRole::Member => "member",
        }
    }
}

/// Account user entity. Only ever holds a password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUser {
    pub id: Uuid,
    pub account_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountUser {
    pub fn new(
        account_id: Uuid,
        email: String,
        password_hash: String,
        role: AccountRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}
