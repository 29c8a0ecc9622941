//! HTTP handlers for identity-service.

pub mod account;
pub mod magic_link;

pub use account::*;
pub use magic_link::*;
