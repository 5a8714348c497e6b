//! Service layer - business logic.

pub mod account_number;
mod account_service;
mod user_service;

pub use account_number::{AccountNumberGenerator, RandomAccountNumbers};
pub use account_service::{AccountProvisioner, AccountService};
pub use user_service::{UserDirectory, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use account_number::MockAccountNumberGenerator;
