//! Tenant model - isolated environment under one account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Account, LifecycleStatus};

/// Tenant entity. The slug is globally unique and always generated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tenant {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    #[schema(example = "calm-ocean-4821")]
    pub slug: String,
    pub status: LifecycleStatus,
    /// Opaque settings blob, stored as JSONB.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create the tenant for `account`, named `<account name>-<slug>`.
    pub fn for_account(account: &Account, slug: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account.id,
            name: format!("{}-{}", account.name, slug),
            slug,
            status: LifecycleStatus::Active,
            settings: None,
            created_at: now,
            updated_at: now,
        }
    }
}
