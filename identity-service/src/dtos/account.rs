use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::LifecycleStatus;
use crate::services::ProvisionedAccount;
use crate::utils::validation::no_markup;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom(function = "no_markup")
    )]
    #[schema(example = "Acme Corp")]
    pub name: String,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    #[schema(example = "owner@acme.test")]
    pub email: String,
}

impl CreateAccountRequest {
    /// Trimmed name and lower-cased email.
    pub fn normalized(&self) -> (String, String) {
        (
            self.name.trim().to_string(),
            self.email.trim().to_lowercase(),
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    #[schema(example = "Acme Corp")]
    pub name: String,
    #[schema(example = "owner@acme.test")]
    pub email: String,
    pub status: LifecycleStatus,
    #[schema(example = "calm-ocean-4821")]
    pub tenant_slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProvisionedAccount> for AccountResponse {
    fn from(provisioned: ProvisionedAccount) -> Self {
        let account = provisioned.account;
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            status: account.status,
            tenant_slug: provisioned.tenant.slug,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
