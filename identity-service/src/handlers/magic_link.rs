//! Magic link issuance and redemption.
//!
//! Delivery of the link by email is not performed here; the link is returned
//! to the caller, who owns the outbound channel.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        magic_link::{
            MagicLinkCallbackQuery, MagicLinkCallbackResponse, MagicLinkRequest,
            MagicLinkResponse,
        },
        ErrorResponse,
    },
    utils::{ValidatedJson, ValidatedQuery},
    AppState,
};

/// Assertions minted from a magic link are issued to this client.
fn client_id_for(api_key: &str) -> String {
    format!("client_{}", api_key)
}

#[tracing::instrument(skip(state, req))]
pub async fn issue_magic_link_impl(
    state: &AppState,
    req: MagicLinkRequest,
) -> Result<MagicLinkResponse, AppError> {
    let api_key = req.api_key.trim();
    let issued = state
        .magic_links
        .issue(api_key, req.metadata.expiration_minutes, &req.redirect_url)
        .await?;

    Ok(MagicLinkResponse {
        message: "Magic link generated successfully".to_string(),
        magic_link: issued.url,
        expires_at: issued.expires_at,
        email_to: req.email_to.trim().to_lowercase(),
        email_from: req.email_from.trim().to_lowercase(),
        email_body: req.metadata.email_body.trim().to_string(),
    })
}

/// Request a magic link
#[utoipa::path(
    post,
    path = "/v1/magiclink/verify",
    request_body = MagicLinkRequest,
    responses(
        (status = 200, description = "Magic link generated", body = MagicLinkResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid API key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Magic Links"
)]
pub async fn issue_magic_link(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MagicLinkRequest>,
) -> Result<Json<MagicLinkResponse>, AppError> {
    let response = issue_magic_link_impl(&state, req).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state, query))]
pub async fn redeem_magic_link_impl(
    state: &AppState,
    query: MagicLinkCallbackQuery,
) -> Result<MagicLinkCallbackResponse, AppError> {
    let link = state.magic_links.validate(query.token.trim()).await?;
    let access_token = state
        .assertions
        .issue(&client_id_for(&link.api_key), &link.id.to_string())?;

    Ok(MagicLinkCallbackResponse {
        message: "Magic link verified successfully".to_string(),
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.assertions.expiry_seconds(),
    })
}

/// Redeem a magic link for a bearer assertion
#[utoipa::path(
    get,
    path = "/v1/magiclink/callback",
    params(MagicLinkCallbackQuery),
    responses(
        (status = 200, description = "Magic link redeemed", body = MagicLinkCallbackResponse),
        (status = 400, description = "Invalid token format", body = ErrorResponse),
        (status = 401, description = "Magic link expired or already used", body = ErrorResponse),
        (status = 404, description = "Magic link not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Magic Links"
)]
pub async fn redeem_magic_link(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MagicLinkCallbackQuery>,
) -> Result<Json<MagicLinkCallbackResponse>, AppError> {
    let response = redeem_magic_link_impl(&state, query).await?;
    Ok(Json(response))
}
