//! Test helper module for identity-service integration tests.
//!
//! Builds the full application state on the in-memory credential store with
//! a clock the tests can move forward.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use identity_service::{
    build_router,
    config::IdentityConfig,
    services::{Clock, CredentialStore, InMemoryCredentialStore},
    AppState,
};
use service_core::axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "test-signing-secret-0123456789abcdef";
pub const TEST_ISSUER: &str = "identity-service-test";
pub const TEST_AUDIENCE: &str = "identity-clients-test";

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub fn test_config() -> IdentityConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("ENVIRONMENT", "dev"),
        ("SERVICE_NAME", "identity-service-test"),
        ("JWT_SECRET", TEST_SECRET),
        ("JWT_ISSUER", TEST_ISSUER),
        ("JWT_AUDIENCE", TEST_AUDIENCE),
    ]);
    IdentityConfig::from_lookup(Default::default(), |key| {
        vars.get(key).map(|v| v.to_string())
    })
    .expect("test config")
}

pub struct TestApp {
    pub state: AppState,
    pub store: InMemoryCredentialStore,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(InMemoryCredentialStore::new())
    }

    pub fn with_store(store: InMemoryCredentialStore) -> Self {
        let wrapped: Arc<dyn CredentialStore> = Arc::new(store.clone());
        Self::with_wrapped_store(store, wrapped)
    }

    /// `inspect` is the underlying store, `wrapped` what the services see.
    pub fn with_wrapped_store(
        inspect: InMemoryCredentialStore,
        wrapped: Arc<dyn CredentialStore>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state =
            AppState::new(test_config(), wrapped, clock.clone()).expect("app state");
        Self {
            state,
            store: inspect,
            clock,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn row_counts(&self) -> (usize, usize, usize) {
        (
            self.store.accounts().expect("accounts").len(),
            self.store.tenants().expect("tenants").len(),
            self.store.account_users().expect("account users").len(),
        )
    }
}
