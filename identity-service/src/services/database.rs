//! PostgreSQL credential store.
//!
//! Uniqueness is enforced by named constraints; violations are mapped back
//! to the key that collided so callers can tell an email conflict from a
//! slug race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;
use uuid::Uuid;

use super::store::{CredentialStore, ProvisioningTx, StoreError, UniqueKey};
use crate::models::{Account, AccountUser, MagicLink, Tenant};

/// PostgreSQL-backed [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("accounts_email_key") => {
                    return StoreError::UniqueViolation(UniqueKey::AccountEmail)
                }
                Some("tenants_slug_key") => {
                    return StoreError::UniqueViolation(UniqueKey::TenantSlug)
                }
                Some("magic_links_token_hash_key") => {
                    return StoreError::UniqueViolation(UniqueKey::MagicLinkTokenHash)
                }
                _ => {}
            }
        }
    }
    StoreError::Backend(anyhow::anyhow!(err))
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn begin_provisioning(&self) -> Result<Box<dyn ProvisioningTx>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgProvisioningTx { tx }))
    }

    async fn insert_magic_link(&self, link: &MagicLink) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO magic_links (id, api_key, token_hash, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(link.id)
        .bind(&link.api_key)
        .bind(&link.token_hash)
        .bind(link.expires_at)
        .bind(link.used_at)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_magic_link_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<MagicLink>, StoreError> {
        sqlx::query_as::<_, MagicLink>(
            r#"
            SELECT id, api_key, token_hash, expires_at, used_at, created_at
            FROM magic_links
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn mark_magic_link_used(
        &self,
        id: Uuid,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE magic_links SET used_at = $1 WHERE id = $2 AND used_at IS NULL")
                .bind(used_at)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            StoreError::Backend(anyhow::anyhow!("Database health check failed: {}", e))
        })
    }
}

struct PgProvisioningTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProvisioningTx for PgProvisioningTx {
    async fn insert_account(&mut self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, email, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.status.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn count_tenants_with_slug(&mut self, slug: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count)
    }

    async fn insert_tenant(&mut self, tenant: &Tenant) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, account_id, name, slug, status, settings, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(tenant.id)
        .bind(tenant.account_id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(tenant.status.as_str())
        .bind(&tenant.settings)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_account_user(&mut self, user: &AccountUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO account_users (id, account_id, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(user.account_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
