pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::config::IdentityConfig;
use crate::services::{
    AssertionIssuer, Clock, CredentialStore, MagicLinkService, ProvisioningService,
    ServiceError, SlugGenerator, StaticClientDirectory,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::account::create_account,
        handlers::magic_link::issue_magic_link,
        handlers::magic_link::redeem_magic_link,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::account::CreateAccountRequest,
            dtos::account::AccountResponse,
            dtos::magic_link::MagicLinkRequest,
            dtos::magic_link::MagicLinkMetadata,
            dtos::magic_link::MagicLinkResponse,
            dtos::magic_link::MagicLinkCallbackResponse,
            models::LifecycleStatus,
        )
    ),
    tags(
        (name = "Accounts", description = "Account, tenant and owner provisioning"),
        (name = "Magic Links", description = "Single-use sign-in links and bearer assertions"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub store: Arc<dyn CredentialStore>,
    pub provisioning: ProvisioningService,
    pub magic_links: MagicLinkService,
    pub assertions: AssertionIssuer,
}

impl AppState {
    /// Wire the services around a store and a clock.
    pub fn new(
        config: IdentityConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        let directory = Arc::new(StaticClientDirectory::new(
            config.assertion.issuer.clone(),
            config.assertion.audience.clone(),
        ));
        let assertions = AssertionIssuer::new(&config.assertion, directory, clock.clone())?;
        let provisioning =
            ProvisioningService::new(store.clone(), clock.clone(), SlugGenerator);
        let magic_links =
            MagicLinkService::new(store.clone(), clock, config.magic_link.ttl_bounds());

        Ok(Self {
            config,
            store,
            provisioning,
            magic_links,
            assertions,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/v1/account/new", post(handlers::account::create_account))
        .route(
            "/v1/magiclink/verify",
            post(handlers::magic_link::issue_magic_link),
        )
        .route(
            "/v1/magiclink/callback",
            get(handlers::magic_link::redeem_magic_link),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Credential store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Credential store health check failed");
        AppError::from(ServiceError::from(e))
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
