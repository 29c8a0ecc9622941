use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        account::{AccountResponse, CreateAccountRequest},
        ErrorResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Provision an account together with its tenant and owner.
#[tracing::instrument(skip(state, req))]
pub async fn create_account_impl(
    state: &AppState,
    req: CreateAccountRequest,
) -> Result<AccountResponse, AppError> {
    let (name, email) = req.normalized();
    let provisioned = state.provisioning.create_account(&name, &email).await?;
    Ok(AccountResponse::from(provisioned))
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/v1/account/new",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account provisioned", body = AccountResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let response = create_account_impl(&state, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
