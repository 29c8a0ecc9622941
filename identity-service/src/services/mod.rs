//! Services layer for identity-service.
//!
//! Account provisioning, the magic link lifecycle and bearer assertion
//! issuance, on top of a pluggable credential store.

pub mod assertion;
pub mod clock;
mod database;
pub mod error;
pub mod magic_link;
mod memory;
pub mod provisioning;
pub mod slug;
pub mod store;
pub mod token;

pub use assertion::{
    AssertionIssuer, ClientDirectory, ClientIdentity, Claims, SigningAlgorithm,
    StaticClientDirectory,
};
pub use clock::{Clock, SystemClock};
pub use database::PgCredentialStore;
pub use error::{ErrorKind, ServiceError};
pub use magic_link::{IssuedMagicLink, MagicLinkService, TtlBounds};
pub use memory::InMemoryCredentialStore;
pub use provisioning::{ProvisionedAccount, ProvisioningService};
pub use slug::{SlugGenerator, MAX_SLUG_ATTEMPTS};
pub use store::{CredentialStore, ProvisioningTx, StoreError, UniqueKey};
pub use token::TokenGenerator;
