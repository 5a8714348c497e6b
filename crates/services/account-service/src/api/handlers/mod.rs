//! HTTP request handlers.

pub mod account_handler;
pub mod health_handler;
pub mod user_handler;

pub use account_handler::{account_routes, AccountResponse};
pub use health_handler::health_check;
pub use user_handler::user_routes;
