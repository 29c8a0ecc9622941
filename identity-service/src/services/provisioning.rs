//! Account provisioning: one account, one tenant and one owner, or nothing.

use std::sync::Arc;

use rand::rngs::OsRng;

use super::clock::Clock;
use super::error::ServiceError;
use super::slug::{SlugGenerator, MAX_SLUG_ATTEMPTS};
use super::store::{CredentialStore, ProvisioningTx};
use crate::models::{Account, AccountRole, AccountUser, Tenant};
use crate::utils::password::unclaimed_owner_hash;

/// Everything a successful provisioning run created.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub account: Account,
    pub tenant: Tenant,
    pub owner: AccountUser,
}

#[derive(Clone)]
pub struct ProvisioningService {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    slugs: SlugGenerator,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>, slugs: SlugGenerator) -> Self {
        Self {
            store,
            clock,
            slugs,
        }
    }

    /// Create an account with its tenant and owner in a single transaction.
    ///
    /// The first failure rolls the transaction back; nothing is persisted.
    #[tracing::instrument(skip(self, email), fields(account_id, tenant_slug))]
    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
    ) -> Result<ProvisionedAccount, ServiceError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("name must not be empty".into()));
        }
        if email.is_empty() {
            return Err(ServiceError::InvalidInput("email must not be empty".into()));
        }

        let mut tx = self.store.begin_provisioning().await?;
        match self.provision(tx.as_mut(), name, email).await {
            Ok(provisioned) => {
                tx.commit().await?;
                tracing::info!(
                    account_id = %provisioned.account.id,
                    tenant_slug = %provisioned.tenant.slug,
                    "Account provisioned"
                );
                Ok(provisioned)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Provisioning rollback failed");
                }
                tracing::warn!(error = %err, "Account provisioning aborted");
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        tx: &mut dyn ProvisioningTx,
        name: &str,
        email: &str,
    ) -> Result<ProvisionedAccount, ServiceError> {
        let now = self.clock.now();

        let account = Account::new(name.to_string(), email.to_string(), now);
        tx.insert_account(&account).await?;
        tracing::Span::current().record("account_id", tracing::field::display(account.id));

        let slug = self.unique_slug(tx).await?;
        tracing::Span::current().record("tenant_slug", tracing::field::display(&slug));
        let tenant = Tenant::for_account(&account, slug, now);
        tx.insert_tenant(&tenant).await?;

        let password_hash = unclaimed_owner_hash().map_err(ServiceError::Storage)?;
        let owner = AccountUser::new(
            account.id,
            account.email.clone(),
            password_hash,
            AccountRole::Owner,
            now,
        );
        tx.insert_account_user(&owner).await?;

        Ok(ProvisionedAccount {
            account,
            tenant,
            owner,
        })
    }

    async fn unique_slug(&self, tx: &mut dyn ProvisioningTx) -> Result<String, ServiceError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = self.slugs.generate(&mut OsRng);
            if tx.count_tenants_with_slug(&candidate).await? == 0 {
                return Ok(candidate);
            }
            tracing::debug!(attempt, "Tenant slug collision, retrying");
        }
        Err(ServiceError::SlugExhausted {
            attempts: MAX_SLUG_ATTEMPTS,
        })
    }
}
