//! Infrastructure layer - database, in-process store and transactions.

mod db;
pub mod memory;
pub mod migrations;
pub mod unit_of_work;

pub use db::Database;
pub use memory::MemoryStore;
pub use migrations::Migrator;
pub use unit_of_work::{HealthCheck, Persistence, TransactionContext, TransactionFuture, UnitOfWork};
