//! Account repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::entities::account::{self, ActiveModel, Entity as AccountEntity};
use super::entities::user::Entity as UserEntity;
use common::{AppError, AppResult};
use domain::{Account, AccountView, NewAccount};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by its external number, joined with the owner's username
    async fn find_by_account_number(&self, account_number: &str) -> AppResult<Option<AccountView>>;

    /// List a user's accounts in creation order
    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Account>>;

    /// Insert a new account.
    ///
    /// A duplicate account number rejected by the store surfaces as
    /// `AppError::Conflict`; a missing owner as `AppError::NotFound`.
    async fn create(&self, new_account: NewAccount) -> AppResult<Account>;
}

/// Account repository backed by the connection pool.
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn conn(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Account repository bound to an open transaction.
pub struct TxAccountStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxAccountStore<'a> {
    /// Create a repository whose operations join `txn`
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    fn conn(&self) -> &DatabaseTransaction {
        self.txn
    }
}

async fn find_view<C: ConnectionTrait>(
    conn: &C,
    account_number: &str,
) -> AppResult<Option<AccountView>> {
    let row = AccountEntity::find()
        .filter(account::Column::AccountNumber.eq(account_number))
        .find_also_related(UserEntity)
        .one(conn)
        .await
        .map_err(AppError::from)?;

    match row {
        None => Ok(None),
        Some((model, Some(owner))) => Ok(Some(AccountView::new(model.into(), owner.username))),
        Some((model, None)) => Err(AppError::internal(format!(
            "account {} references missing user {}",
            model.account_number, model.user_id
        ))),
    }
}

async fn list_owned<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<Vec<Account>> {
    let models = AccountEntity::find()
        .filter(account::Column::UserId.eq(user_id))
        .order_by_asc(account::Column::Id)
        .all(conn)
        .await
        .map_err(AppError::from)?;

    Ok(models.into_iter().map(Account::from).collect())
}

async fn insert<C: ConnectionTrait>(conn: &C, new_account: NewAccount) -> AppResult<Account> {
    let active_model = ActiveModel {
        account_number: Set(new_account.account_number.into_inner()),
        balance: Set(new_account.balance),
        currency: Set(new_account.currency.into_inner()),
        created_at: Set(new_account.created_at),
        user_id: Set(new_account.user_id),
        ..Default::default()
    };

    let model = active_model.insert(conn).await.map_err(AppError::from)?;
    Ok(Account::from(model))
}

macro_rules! impl_account_repository {
    (impl$(<$lt:lifetime>)? for $store:ty) => {
        #[async_trait]
        impl$(<$lt>)? AccountRepository for $store {
            async fn find_by_account_number(
                &self,
                account_number: &str,
            ) -> AppResult<Option<AccountView>> {
                find_view(self.conn(), account_number).await
            }

            async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Account>> {
                list_owned(self.conn(), user_id).await
            }

            async fn create(&self, new_account: NewAccount) -> AppResult<Account> {
                insert(self.conn(), new_account).await
            }
        }
    };
}

impl_account_repository!(impl for AccountStore);
impl_account_repository!(impl<'a> for TxAccountStore<'a>);
