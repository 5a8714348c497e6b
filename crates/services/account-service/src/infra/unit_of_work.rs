//! Unit of Work pattern implementation.
//!
//! The Unit of Work:
//! - Centralizes access to all repositories
//! - Manages transactions (begin, commit, rollback)
//! - Makes multi-step operations atomic: every write staged inside
//!   `transaction` becomes visible together, or not at all

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{AccessMode, DatabaseConnection, IsolationLevel, TransactionTrait};

use super::Database;
use crate::repository::{
    AccountRepository, AccountStore, TxAccountStore, TxUserStore, UserRepository, UserStore,
};
use common::{AppError, AppResult};

/// Boxed future returned by a transaction body.
pub type TransactionFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not object-safe because of the generic `transaction` method; services are
/// generic over it instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// User repository outside any transaction
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Account repository outside any transaction
    fn accounts(&self) -> Arc<dyn AccountRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Committed when the closure returns `Ok`, rolled back when it returns `Err`.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send;
}

/// Store liveness probe used by the health endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

/// Transaction context providing repository access within a transaction.
///
/// All repository operations performed through this context are part
/// of the same transaction.
#[derive(Clone, Copy)]
pub struct TransactionContext<'a> {
    users: &'a dyn UserRepository,
    accounts: &'a dyn AccountRepository,
}

impl<'a> TransactionContext<'a> {
    /// Create a new transaction context over transaction-scoped repositories
    pub fn new(users: &'a dyn UserRepository, accounts: &'a dyn AccountRepository) -> Self {
        Self { users, accounts }
    }

    /// User repository for this transaction
    pub fn users(&self) -> &'a dyn UserRepository {
        self.users
    }

    /// Account repository for this transaction
    pub fn accounts(&self) -> &'a dyn AccountRepository {
        self.accounts
    }
}

/// Unit of Work over the SQL database.
pub struct Persistence {
    database: Database,
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    account_repo: Arc<AccountStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(database: Database) -> Self {
        let db = database.get_connection();
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let account_repo = Arc::new(AccountStore::new(db.clone()));
        Self {
            database,
            db,
            user_repo,
            account_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountRepository> {
        self.account_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        // Uniqueness is arbitrated by the unique indexes, so ReadCommitted is enough
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let outcome = {
            let users = TxUserStore::new(&txn);
            let accounts = TxAccountStore::new(&txn);
            f(TransactionContext::new(&users, &accounts)).await
        };

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl HealthCheck for Persistence {
    async fn ping(&self) -> AppResult<()> {
        self.database.ping().await.map_err(AppError::from)
    }
}

/// Run a transaction body with less boilerplate.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}

/// Unit of Work over mocked repositories, for service tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use crate::repository::{MockAccountRepository, MockUserRepository};

    /// Runs transaction bodies directly against the mocks.
    pub struct MockUnitOfWork {
        users: Arc<MockUserRepository>,
        accounts: Arc<MockAccountRepository>,
    }

    impl MockUnitOfWork {
        pub fn new(users: MockUserRepository, accounts: MockAccountRepository) -> Self {
            Self {
                users: Arc::new(users),
                accounts: Arc::new(accounts),
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for MockUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn accounts(&self) -> Arc<dyn AccountRepository> {
            self.accounts.clone()
        }

        async fn transaction<F, T>(&self, f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
            T: Send,
        {
            f(TransactionContext::new(self.users.as_ref(), self.accounts.as_ref())).await
        }
    }
}
