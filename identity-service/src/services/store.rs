//! Credential store boundary.
//!
//! The provisioning flow and the magic link lifecycle only talk to storage
//! through these traits. Correctness of concurrent callers rests on the
//! store: unique constraints, atomic commit and the conditional used-at
//! update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, AccountUser, MagicLink, Tenant};

/// Unique constraints the store enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    AccountEmail,
    TenantSlug,
    MagicLinkTokenHash,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0:?}")]
    UniqueViolation(UniqueKey),

    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Open the transaction that provisions an account, its tenant and owner.
    async fn begin_provisioning(&self) -> Result<Box<dyn ProvisioningTx>, StoreError>;

    async fn insert_magic_link(&self, link: &MagicLink) -> Result<(), StoreError>;

    async fn find_magic_link_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<MagicLink>, StoreError>;

    /// Set `used_at` only if it is still null. Returns whether this call won.
    async fn mark_magic_link_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// An open provisioning transaction. Dropping it without `commit` discards
/// every write.
#[async_trait]
pub trait ProvisioningTx: Send {
    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError>;

    async fn count_tenants_with_slug(&mut self, slug: &str) -> Result<i64, StoreError>;

    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), StoreError>;

    async fn insert_account_user(&mut self, user: &AccountUser) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
