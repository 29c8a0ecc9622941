use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::utils::validation::{alphanumeric, no_markup, public_redirect_url};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkMetadata {
    #[validate(range(min = 1, max = 60, message = "Expiration must be between 1 and 60 minutes"))]
    #[schema(example = 5, minimum = 1, maximum = 60)]
    pub expiration_minutes: i64,

    #[validate(
        length(min = 1, max = 300, message = "Email body must be between 1 and 300 characters"),
        custom(function = "no_markup")
    )]
    #[schema(example = "Click the link to sign in")]
    pub email_body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRequest {
    #[validate(
        length(min = 10, max = 64, message = "API key must be between 10 and 64 characters"),
        custom(function = "alphanumeric")
    )]
    #[schema(example = "key1234567")]
    pub api_key: String,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    #[schema(example = "user@example.com")]
    pub email_to: String,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    #[schema(example = "noreply@example.com")]
    pub email_from: String,

    #[validate(length(max = 2048), custom(function = "public_redirect_url"))]
    #[schema(example = "https://app.example/cb")]
    pub redirect_url: String,

    #[validate(nested)]
    pub metadata: MagicLinkMetadata,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MagicLinkResponse {
    #[schema(example = "Magic link generated successfully")]
    pub message: String,
    #[schema(example = "https://app.example/cb?token=...")]
    pub magic_link: String,
    pub expires_at: DateTime<Utc>,
    pub email_to: String,
    pub email_from: String,
    pub email_body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MagicLinkCallbackQuery {
    #[validate(length(min = 32, message = "Token must be at least 32 characters"))]
    #[param(example = "p1Yy2k1oQ0mJv3m0sXq8m9Zr3Jc1kV7aE5n2bW4dT6s")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MagicLinkCallbackResponse {
    #[schema(example = "Magic link verified successfully")]
    pub message: String,
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 86400)]
    pub expires_in: i64,
}
