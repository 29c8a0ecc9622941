pub mod account;
pub mod account_user;
pub mod magic_link;
pub mod tenant;

pub use account::{Account, LifecycleStatus};
pub use account_user::{AccountRole, AccountUser};
pub use magic_link::MagicLink;
pub use tenant::Tenant;
