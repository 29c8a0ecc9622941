use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::{SigningAlgorithm, TtlBounds};

/// Upper limit for `MAGIC_LINK_MAX_TTL_MINUTES`: one day.
pub const MAX_MAGIC_LINK_TTL_MINUTES: i64 = 1440;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub assertion: AssertionConfig,
    pub magic_link: MagicLinkConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Signing settings for bearer assertions. The secret never leaves this
/// struct except through `ExposeSecret` at signing time.
#[derive(Debug, Clone)]
pub struct AssertionConfig {
    pub secret: SecretString,
    pub algorithm: SigningAlgorithm,
    pub expiry_seconds: i64,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    pub min_ttl_minutes: i64,
    pub max_ttl_minutes: i64,
}

impl MagicLinkConfig {
    pub fn ttl_bounds(&self) -> TtlBounds {
        TtlBounds {
            min_minutes: self.min_ttl_minutes,
            max_minutes: self.max_ttl_minutes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let get = |key: &str, default: Option<&str>, required: bool| {
            get_env(&lookup, key, default, required)
        };

        let config = IdentityConfig {
            common,
            environment: environment.clone(),
            service_name: get("SERVICE_NAME", Some("identity-service"), is_prod)?,
            service_version: get("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get("DATABASE_URL", Some("postgres://localhost/identity"), is_prod)?,
                max_connections: parse_num(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                )?,
                min_connections: parse_num(
                    "DATABASE_MIN_CONNECTIONS",
                    get("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
                )?,
            },
            assertion: AssertionConfig {
                // Mandatory in every environment.
                secret: SecretString::new(get("JWT_SECRET", None, true)?),
                algorithm: get("JWT_ALGO", Some("HS256"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                expiry_seconds: parse_num(
                    "JWT_EXPIRY_SECONDS",
                    get("JWT_EXPIRY_SECONDS", Some("86400"), false)?,
                )?,
                issuer: get("JWT_ISSUER", Some("identity-service"), is_prod)?,
                audience: get("JWT_AUDIENCE", Some("identity-clients"), is_prod)?,
            },
            magic_link: MagicLinkConfig {
                min_ttl_minutes: parse_num(
                    "MAGIC_LINK_MIN_TTL_MINUTES",
                    get("MAGIC_LINK_MIN_TTL_MINUTES", Some("1"), false)?,
                )?,
                max_ttl_minutes: parse_num(
                    "MAGIC_LINK_MAX_TTL_MINUTES",
                    get("MAGIC_LINK_MAX_TTL_MINUTES", Some("60"), false)?,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.assertion.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        if self.assertion.expiry_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY_SECONDS must be positive"
            )));
        }

        if self.magic_link.min_ttl_minutes < 1
            || self.magic_link.max_ttl_minutes < self.magic_link.min_ttl_minutes
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Magic link TTL bounds are inconsistent"
            )));
        }

        if self.magic_link.max_ttl_minutes > MAX_MAGIC_LINK_TTL_MINUTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MAGIC_LINK_MAX_TTL_MINUTES must not exceed {}",
                MAX_MAGIC_LINK_TTL_MINUTES
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS exceeds DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, required: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_num<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
