//! In-process credential store for tests and local runs.
//!
//! Provisioning writes are staged on the transaction and applied under a
//! single lock at commit, after uniqueness has been re-checked, so a
//! concurrent commit can never leave partial rows behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{CredentialStore, ProvisioningTx, StoreError, UniqueKey};
use crate::models::{Account, AccountUser, MagicLink, Tenant};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    tenants: HashMap<Uuid, Tenant>,
    account_users: HashMap<Uuid, AccountUser>,
    magic_links: HashMap<Uuid, MagicLink>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(anyhow::anyhow!("In-memory store mutex poisoned: {}", e))
}

#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.accounts.values().cloned().collect())
    }

    pub fn tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.tenants.values().cloned().collect())
    }

    pub fn account_users(&self) -> Result<Vec<AccountUser>, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.account_users.values().cloned().collect())
    }

    pub fn magic_link(&self, id: Uuid) -> Result<Option<MagicLink>, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables.magic_links.get(&id).cloned())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn begin_provisioning(&self) -> Result<Box<dyn ProvisioningTx>, StoreError> {
        Ok(Box::new(InMemoryProvisioningTx {
            tables: Arc::clone(&self.tables),
            accounts: Vec::new(),
            tenants: Vec::new(),
            account_users: Vec::new(),
        }))
    }

    async fn insert_magic_link(&self, link: &MagicLink) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        if tables
            .magic_links
            .values()
            .any(|l| l.token_hash == link.token_hash)
        {
            return Err(StoreError::UniqueViolation(UniqueKey::MagicLinkTokenHash));
        }
        tables.magic_links.insert(link.id, link.clone());
        Ok(())
    }

    async fn find_magic_link_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<MagicLink>, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(tables
            .magic_links
            .values()
            .find(|l| l.token_hash == token_hash)
            .cloned())
    }

    async fn mark_magic_link_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().map_err(poisoned)?;
        match tables.magic_links.get_mut(&id) {
            Some(link) if link.used_at.is_none() => {
                link.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.tables.lock().map_err(poisoned)?;
        Ok(())
    }
}

struct InMemoryProvisioningTx {
    tables: Arc<Mutex<Tables>>,
    accounts: Vec<Account>,
    tenants: Vec<Tenant>,
    account_users: Vec<AccountUser>,
}

impl InMemoryProvisioningTx {
    fn email_taken(&self, tables: &Tables, email: &str) -> bool {
        tables.accounts.values().any(|a| a.email == email)
            || self.accounts.iter().any(|a| a.email == email)
    }

    fn slug_count(&self, tables: &Tables, slug: &str) -> usize {
        tables.tenants.values().filter(|t| t.slug == slug).count()
            + self.tenants.iter().filter(|t| t.slug == slug).count()
    }
}

#[async_trait]
impl ProvisioningTx for InMemoryProvisioningTx {
    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let taken = {
            let tables = self.tables.lock().map_err(poisoned)?;
            self.email_taken(&tables, &account.email)
        };
        if taken {
            return Err(StoreError::UniqueViolation(UniqueKey::AccountEmail));
        }
        self.accounts.push(account.clone());
        Ok(())
    }

    async fn count_tenants_with_slug(&mut self, slug: &str) -> Result<i64, StoreError> {
        let tables = self.tables.lock().map_err(poisoned)?;
        Ok(self.slug_count(&tables, slug) as i64)
    }

    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), StoreError> {
        let taken = {
            let tables = self.tables.lock().map_err(poisoned)?;
            self.slug_count(&tables, &tenant.slug) > 0
        };
        if taken {
            return Err(StoreError::UniqueViolation(UniqueKey::TenantSlug));
        }
        self.tenants.push(tenant.clone());
        Ok(())
    }

    async fn insert_account_user(&mut self, user: &AccountUser) -> Result<(), StoreError> {
        let owner_known = self.accounts.iter().any(|a| a.id == user.account_id)
            || self
                .tables
                .lock()
                .map_err(poisoned)?
                .accounts
                .contains_key(&user.account_id);
        if !owner_known {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "account_users.account_id references unknown account {}",
                user.account_id
            )));
        }
        self.account_users.push(user.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let mut tables = this.tables.lock().map_err(poisoned)?;

        // Another transaction may have committed since our writes were staged.
        for account in &this.accounts {
            if tables.accounts.values().any(|a| a.email == account.email) {
                return Err(StoreError::UniqueViolation(UniqueKey::AccountEmail));
            }
        }
        for tenant in &this.tenants {
            if tables.tenants.values().any(|t| t.slug == tenant.slug) {
                return Err(StoreError::UniqueViolation(UniqueKey::TenantSlug));
            }
        }

        for account in this.accounts {
            tables.accounts.insert(account.id, account);
        }
        for tenant in this.tenants {
            tables.tenants.insert(tenant.id, tenant);
        }
        for user in this.account_users {
            tables.account_users.insert(user.id, user);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountRole;

    #[tokio::test]
    async fn uncommitted_writes_are_invisible() {
        let store = InMemoryCredentialStore::new();
        let now = Utc::now();
        let account = Account::new("Acme".into(), "a@acme.test".into(), now);

        let mut tx = store.begin_provisioning().await.unwrap();
        tx.insert_account(&account).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.accounts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_rechecks_email_uniqueness() {
        let store = InMemoryCredentialStore::new();
        let now = Utc::now();

        let mut first = store.begin_provisioning().await.unwrap();
        let mut second = store.begin_provisioning().await.unwrap();
        first
            .insert_account(&Account::new("A".into(), "dup@acme.test".into(), now))
            .await
            .unwrap();
        second
            .insert_account(&Account::new("B".into(), "dup@acme.test".into(), now))
            .await
            .unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation(UniqueKey::AccountEmail)
        ));
        assert_eq!(store.accounts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn account_user_requires_known_account() {
        let store = InMemoryCredentialStore::new();
        let mut tx = store.begin_provisioning().await.unwrap();
        let user = AccountUser::new(
            Uuid::new_v4(),
            "a@acme.test".into(),
            "hash".into(),
            AccountRole::Owner,
            Utc::now(),
        );
        assert!(tx.insert_account_user(&user).await.is_err());
    }

    #[tokio::test]
    async fn used_at_is_set_once() {
        let store = InMemoryCredentialStore::new();
        let now = Utc::now();
        let link = MagicLink::new("key123".into(), "hash".into(), now, 5);
        store.insert_magic_link(&link).await.unwrap();

        assert!(store.mark_magic_link_used(link.id, now).await.unwrap());
        assert!(!store
            .mark_magic_link_used(link.id, now + chrono::Duration::seconds(1))
            .await
            .unwrap());
        assert_eq!(store.magic_link(link.id).unwrap().unwrap().used_at, Some(now));
    }
}
