//! User repository implementation.

use async_trait::async_trait;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{NewUser, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find user by exact username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by exact email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user.
    ///
    /// A duplicate username or email rejected by the store surfaces as
    /// `AppError::Conflict`.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;
}

/// User repository backed by the connection pool.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn conn(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// User repository bound to an open transaction.
pub struct TxUserStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserStore<'a> {
    /// Create a repository whose operations join `txn`
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    fn conn(&self) -> &DatabaseTransaction {
        self.txn
    }
}

async fn find_one<C: ConnectionTrait>(conn: &C, filter: SimpleExpr) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(filter)
        .one(conn)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(User::from))
}

async fn insert<C: ConnectionTrait>(conn: &C, new_user: NewUser) -> AppResult<User> {
    let active_model = ActiveModel {
        username: Set(new_user.username),
        email: Set(new_user.email),
        created_at: Set(new_user.created_at),
        ..Default::default()
    };

    let model = active_model.insert(conn).await.map_err(AppError::from)?;
    Ok(User::from(model))
}

macro_rules! impl_user_repository {
    (impl$(<$lt:lifetime>)? for $store:ty) => {
        #[async_trait]
        impl$(<$lt>)? UserRepository for $store {
            async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
                find_one(self.conn(), user::Column::Id.eq(id)).await
            }

            async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
                find_one(self.conn(), user::Column::Username.eq(username)).await
            }

            async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
                find_one(self.conn(), user::Column::Email.eq(email)).await
            }

            async fn create(&self, new_user: NewUser) -> AppResult<User> {
                insert(self.conn(), new_user).await
            }
        }
    };
}

impl_user_repository!(impl for UserStore);
impl_user_repository!(impl<'a> for TxUserStore<'a>);
