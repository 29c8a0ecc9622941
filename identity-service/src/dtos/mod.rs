pub mod account;
pub mod magic_link;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Magic link has expired")]
    pub error: String,
    #[schema(example = "expired")]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
