pub mod password;
pub mod validation;

pub use password::unclaimed_owner_hash;
pub use validation::{ValidatedJson, ValidatedQuery};
