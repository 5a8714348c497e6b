//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.

pub mod account;
pub mod constants;
pub mod currency;
pub mod error;
pub mod user;

pub use account::{Account, AccountNumber, AccountView, CreateAccount, NewAccount, ProvisionRequest};
pub use constants::*;
pub use currency::{validate_opening_balance, CurrencyCode};
pub use error::{DomainError, DomainResult};
pub use user::{NewUser, User, UserResponse};
