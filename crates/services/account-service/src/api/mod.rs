//! HTTP API layer.

pub mod extractors;
pub mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
