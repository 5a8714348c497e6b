//! In-process store.
//!
//! Holds users and accounts in memory with the same uniqueness and
//! foreign-key rules as the SQL schema. Transactions are serialized by an
//! async mutex and work on a staged copy that replaces the live state only
//! on commit.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::unit_of_work::{HealthCheck, TransactionContext, TransactionFuture, UnitOfWork};
use crate::repository::{AccountRepository, UserRepository};
use common::{AppError, AppResult};
use domain::{Account, AccountView, NewAccount, NewUser, User, BALANCE_SCALE};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    accounts: BTreeMap<i64, Account>,
    last_user_id: i64,
    last_account_id: i64,
}

impl MemoryState {
    fn user(&self, id: i64) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn user_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.values().find(|u| pred(u)).cloned()
    }

    fn view(&self, account_number: &str) -> AppResult<Option<AccountView>> {
        let Some(account) = self
            .accounts
            .values()
            .find(|a| a.account_number == account_number)
        else {
            return Ok(None);
        };

        let owner = self.users.get(&account.user_id).ok_or_else(|| {
            AppError::internal(format!(
                "account {} references missing user {}",
                account.account_number, account.user_id
            ))
        })?;

        Ok(Some(AccountView::new(account.clone(), owner.username.clone())))
    }

    fn owned_by(&self, user_id: i64) -> Vec<Account> {
        // BTreeMap iteration is already in id order
        self.accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    fn insert_user(&mut self, new_user: NewUser) -> AppResult<User> {
        if self.users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::conflict("Username"));
        }
        if self.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("Email"));
        }

        self.last_user_id += 1;
        let user = User {
            id: self.last_user_id,
            username: new_user.username,
            email: new_user.email,
            created_at: new_user.created_at,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_account(&mut self, new_account: NewAccount) -> AppResult<Account> {
        if !self.users.contains_key(&new_account.user_id) {
            return Err(AppError::not_found("User"));
        }
        if self
            .accounts
            .values()
            .any(|a| a.account_number == new_account.account_number.as_str())
        {
            return Err(AppError::conflict("Account number"));
        }

        // Same scale as the NUMERIC(19, 4) column
        let mut balance = new_account.balance;
        balance.rescale(BALANCE_SCALE);

        self.last_account_id += 1;
        let account = Account {
            id: self.last_account_id,
            account_number: new_account.account_number.into_inner(),
            balance,
            currency: new_account.currency.into_inner(),
            created_at: new_account.created_at,
            user_id: new_account.user_id,
        };
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }
}

/// Unit of Work and repositories over process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<tokio::sync::Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts carrying `account_number`.
    pub async fn count_accounts(&self, account_number: &str) -> usize {
        self.state
            .lock()
            .await
            .accounts
            .values()
            .filter(|a| a.account_number == account_number)
            .count()
    }

    /// Total number of stored accounts.
    pub async fn account_total(&self) -> usize {
        self.state.lock().await.accounts.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.user(id))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.user_where(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.user_where(|u| u.email == email))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        self.state.lock().await.insert_user(new_user)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_account_number(&self, account_number: &str) -> AppResult<Option<AccountView>> {
        self.state.lock().await.view(account_number)
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Account>> {
        Ok(self.state.lock().await.owned_by(user_id))
    }

    async fn create(&self, new_account: NewAccount) -> AppResult<Account> {
        self.state.lock().await.insert_account(new_account)
    }
}

/// Copy of the state that a running transaction reads and writes.
struct StagedState {
    state: Mutex<MemoryState>,
}

impl StagedState {
    fn new(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> AppResult<R>) -> AppResult<R> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::internal("staged state lock poisoned"))?;
        f(&mut state)
    }

    fn into_inner(self) -> AppResult<MemoryState> {
        self.state
            .into_inner()
            .map_err(|_| AppError::internal("staged state lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for StagedState {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.with(|s| Ok(s.user(id)))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.with(|s| Ok(s.user_where(|u| u.username == username)))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.with(|s| Ok(s.user_where(|u| u.email == email)))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        self.with(|s| s.insert_user(new_user))
    }
}

#[async_trait]
impl AccountRepository for StagedState {
    async fn find_by_account_number(&self, account_number: &str) -> AppResult<Option<AccountView>> {
        self.with(|s| s.view(account_number))
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Account>> {
        self.with(|s| Ok(s.owned_by(user_id)))
    }

    async fn create(&self, new_account: NewAccount) -> AppResult<Account> {
        self.with(|s| s.insert_account(new_account))
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(self.clone())
    }

    fn accounts(&self) -> Arc<dyn AccountRepository> {
        Arc::new(self.clone())
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFuture<'a, T> + Send,
        T: Send,
    {
        // Held until commit, so check-then-insert sequences cannot interleave
        let mut live = self.state.lock().await;
        let staged = StagedState::new(live.clone());

        let outcome = f(TransactionContext::new(&staged, &staged)).await;

        match outcome {
            Ok(result) => {
                *live = staged.into_inner()?;
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("Discarding staged writes: {}", e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AccountNumber, CurrencyCode};
    use rust_decimal::Decimal;

    fn new_account(user_id: i64, number: &str) -> NewAccount {
        NewAccount {
            user_id,
            account_number: AccountNumber::parse(number).unwrap(),
            balance: Decimal::from(100),
            currency: CurrencyCode::parse("USD").unwrap(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let store = MemoryStore::new();
        let alice = UserRepository::create(&store, NewUser::new("alice", "a@example.com").unwrap())
            .await
            .unwrap();
        let bob = UserRepository::create(&store, NewUser::new("bob", "b@example.com").unwrap())
            .await
            .unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
    }

    #[tokio::test]
    async fn enforces_unique_username_and_email() {
        let store = MemoryStore::new();
        UserRepository::create(&store, NewUser::new("alice", "a@example.com").unwrap())
            .await
            .unwrap();

        let err = UserRepository::create(&store, NewUser::new("alice", "other@example.com").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref f) if f == "Username"));

        let err = UserRepository::create(&store, NewUser::new("alicia", "a@example.com").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref f) if f == "Email"));
    }

    #[tokio::test]
    async fn account_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = AccountRepository::create(&store, new_account(42, "ACC00001"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.account_total().await, 0);
    }

    #[tokio::test]
    async fn view_joins_owner_username() {
        let store = MemoryStore::new();
        let owner = UserRepository::create(&store, NewUser::new("alice", "a@example.com").unwrap())
            .await
            .unwrap();
        AccountRepository::create(&store, new_account(owner.id, "ACC00001"))
            .await
            .unwrap();

        let view = store.find_by_account_number("ACC00001").await.unwrap().unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.currency, "USD");
        assert!(store.find_by_account_number("ACC99999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn balance_is_stored_at_column_scale() {
        let store = MemoryStore::new();
        let owner = UserRepository::create(&store, NewUser::new("alice", "a@example.com").unwrap())
            .await
            .unwrap();
        let mut account = new_account(owner.id, "ACC00001");
        account.balance = "500.00".parse().unwrap();

        let stored = AccountRepository::create(&store, account).await.unwrap();

        assert_eq!(stored.balance.scale(), BALANCE_SCALE);
        assert_eq!(stored.balance.to_string(), "500.0000");
    }

    #[tokio::test]
    async fn failed_transaction_discards_writes() {
        let store = MemoryStore::new();

        let result: AppResult<()> = store
            .transaction(|ctx| {
                Box::pin(async move {
                    ctx.users()
                        .create(NewUser::new("alice", "a@example.com")?)
                        .await?;
                    Err::<(), _>(AppError::internal("boom"))
                })
            })
            .await;

        assert!(result.is_err());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = MemoryStore::new();

        let user = store
            .transaction(|ctx| {
                Box::pin(async move {
                    let user = ctx
                        .users()
                        .create(NewUser::new("alice", "a@example.com")?)
                        .await?;
                    Ok::<_, AppError>(user)
                })
            })
            .await
            .unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
    }
}
