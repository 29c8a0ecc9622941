//! Magic link issuance and validation.
//!
//! Issued -> Used on the first successful validation. Expiry is evaluated
//! lazily against the clock; an expired link is never marked used.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::error::ServiceError;
use super::store::CredentialStore;
use super::token::TokenGenerator;
use crate::models::MagicLink;

/// Result of issuing a link. `token` is the only copy of the raw secret.
#[derive(Debug, Clone)]
pub struct IssuedMagicLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub link: MagicLink,
}

/// Bounds on the lifetime a caller may request, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlBounds {
    pub min_minutes: i64,
    pub max_minutes: i64,
}

impl Default for TtlBounds {
    fn default() -> Self {
        Self {
            min_minutes: 1,
            max_minutes: 60,
        }
    }
}

#[derive(Clone)]
pub struct MagicLinkService {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    tokens: TokenGenerator,
    ttl: TtlBounds,
}

impl MagicLinkService {
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>, ttl: TtlBounds) -> Self {
        Self {
            store,
            clock,
            tokens: TokenGenerator,
            ttl,
        }
    }

    /// Issue a new link for `api_key`, valid for `ttl_minutes`.
    #[tracing::instrument(skip(self, api_key), fields(magic_link_id))]
    pub async fn issue(
        &self,
        api_key: &str,
        ttl_minutes: i64,
        callback_base_url: &str,
    ) -> Result<IssuedMagicLink, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::InvalidApiKey);
        }
        if ttl_minutes < self.ttl.min_minutes || ttl_minutes > self.ttl.max_minutes {
            return Err(ServiceError::InvalidInput(format!(
                "ttl must be between {} and {} minutes",
                self.ttl.min_minutes, self.ttl.max_minutes
            )));
        }
        if callback_base_url.is_empty() {
            return Err(ServiceError::InvalidInput(
                "callback URL must not be empty".into(),
            ));
        }

        let token = self.tokens.generate();
        let link = MagicLink::new(
            api_key.to_string(),
            self.tokens.hash(&token),
            self.clock.now(),
            ttl_minutes,
        );
        self.store.insert_magic_link(&link).await?;
        tracing::Span::current().record("magic_link_id", tracing::field::display(link.id));
        tracing::info!(expires_at = %link.expires_at, "Magic link issued");

        Ok(IssuedMagicLink {
            url: format!("{}?token={}", callback_base_url, token),
            expires_at: link.expires_at,
            token,
            link,
        })
    }

    /// Redeem a presented token. Succeeds at most once per link.
    #[tracing::instrument(skip(self, token), fields(magic_link_id))]
    pub async fn validate(&self, token: &str) -> Result<MagicLink, ServiceError> {
        let token_hash = self.tokens.hash(token);
        let mut link = self
            .store
            .find_magic_link_by_hash(&token_hash)
            .await?
            .ok_or(ServiceError::MagicLinkNotFound)?;
        tracing::Span::current().record("magic_link_id", tracing::field::display(link.id));

        if link.is_used() {
            tracing::warn!("Rejected reuse of magic link");
            return Err(ServiceError::MagicLinkUsed);
        }

        let now = self.clock.now();
        if link.is_expired_at(now) {
            tracing::info!("Rejected expired magic link");
            return Err(ServiceError::MagicLinkExpired);
        }

        // Another validation may have won the row since we read it.
        if !self.store.mark_magic_link_used(link.id, now).await? {
            tracing::warn!("Lost race redeeming magic link");
            return Err(ServiceError::MagicLinkUsed);
        }

        link.used_at = Some(now);
        tracing::info!("Magic link redeemed");
        Ok(link)
    }
}
