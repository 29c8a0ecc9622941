use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use url::{Host, Url};
use validator::{Validate, ValidationError};

/// Characters refused in free text that may end up in HTML mail.
const MARKUP_CHARS: &[char] = &['<', '>', '"', '\'', '&'];

fn invalid_input(message: String) -> AppError {
    AppError::Rejected {
        status: StatusCode::BAD_REQUEST,
        code: "invalid_input",
        message,
    }
}

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| invalid_input(format!("Json parse error: {}", e)))?;

        value
            .validate()
            .map_err(|e| invalid_input(format!("Validation error: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Query string that has passed its `validator` rules.
pub struct ValidatedQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| invalid_input(format!("Invalid query: {}", e)))?;

        value
            .validate()
            .map_err(|e| invalid_input(format!("Validation error: {}", e)))?;

        Ok(ValidatedQuery(value))
    }
}

pub fn no_markup(value: &str) -> Result<(), ValidationError> {
    if value.contains(MARKUP_CHARS) {
        let mut err = ValidationError::new("markup");
        err.message = Some("must not contain < > \" ' or &".into());
        return Err(err);
    }
    Ok(())
}

pub fn alphanumeric(value: &str) -> Result<(), ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("alphanumeric");
        err.message = Some("must contain only letters and numbers".into());
        return Err(err);
    }
    Ok(())
}

/// Redirect targets must be http(s) and must not point at loopback or
/// private networks.
pub fn public_redirect_url(value: &str) -> Result<(), ValidationError> {
    let reject = |code: &'static str, message: &'static str| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        err
    };

    let url = Url::parse(value).map_err(|_| reject("url", "must be a valid URL"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(reject("url_scheme", "must use http or https"));
    }

    let private = match url.host() {
        None => true,
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_private() || ip.is_unspecified(),
        Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
    };
    if private {
        return Err(reject(
            "private_host",
            "must not point at local or private addresses",
        ));
    }
    Ok(())
}
