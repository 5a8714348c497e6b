//! Repository layer for data access.

mod account_repository;
pub mod entities;
mod user_repository;

pub use account_repository::{AccountRepository, AccountStore, TxAccountStore};
pub use user_repository::{TxUserStore, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
