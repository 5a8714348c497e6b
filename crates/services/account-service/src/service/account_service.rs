//! Account service - provisioning accounts and reading balances.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{AccountNumber, AccountView, CreateAccount, MAX_ACCOUNT_NUMBER_ATTEMPTS};

use super::account_number::{AccountNumberGenerator, RandomAccountNumbers};
use crate::infra::{TransactionContext, UnitOfWork};

/// Account service trait for dependency injection.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Open an account for an existing user.
    ///
    /// Owner lookup, account number resolution and the insert run in one
    /// transaction; on any error nothing is written.
    async fn create_account(&self, request: CreateAccount) -> AppResult<AccountView>;

    /// Balance snapshot for an account number.
    async fn get_balance(&self, account_number: &str) -> AppResult<AccountView>;

    /// All accounts of a user, oldest first.
    async fn list_accounts(&self, user_id: i64) -> AppResult<Vec<AccountView>>;
}

/// Concrete implementation of AccountService over a Unit of Work.
pub struct AccountProvisioner<U> {
    uow: Arc<U>,
    numbers: Arc<dyn AccountNumberGenerator>,
}

impl<U: UnitOfWork> AccountProvisioner<U> {
    /// Provisioner drawing account numbers from random UUIDs
    pub fn new(uow: Arc<U>) -> Self {
        Self::with_generator(uow, Arc::new(RandomAccountNumbers))
    }

    pub fn with_generator(uow: Arc<U>, numbers: Arc<dyn AccountNumberGenerator>) -> Self {
        Self { uow, numbers }
    }
}

/// Draw generated numbers until one is unused in the store.
async fn next_free_number(
    ctx: TransactionContext<'_>,
    numbers: &dyn AccountNumberGenerator,
) -> AppResult<AccountNumber> {
    for attempt in 1..=MAX_ACCOUNT_NUMBER_ATTEMPTS {
        let candidate = AccountNumber::parse(&numbers.generate()).map_err(|e| {
            AppError::internal(format!("generator produced an invalid account number: {}", e))
        })?;

        if ctx
            .accounts()
            .find_by_account_number(candidate.as_str())
            .await?
            .is_none()
        {
            return Ok(candidate);
        }

        tracing::debug!(attempt, account_number = %candidate, "Generated account number taken, redrawing");
    }

    Err(AppError::conflict("Account number"))
}

#[async_trait]
impl<U: UnitOfWork + 'static> AccountService for AccountProvisioner<U> {
    async fn create_account(&self, request: CreateAccount) -> AppResult<AccountView> {
        let request = request.validate()?;
        let numbers = self.numbers.clone();

        let view = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let owner = ctx
                        .users()
                        .find_by_id(request.user_id)
                        .await?
                        .ok_or_not_found("User")?;

                    let account_number = match request.account_number.clone() {
                        Some(number) => {
                            if ctx
                                .accounts()
                                .find_by_account_number(number.as_str())
                                .await?
                                .is_some()
                            {
                                return Err(AppError::conflict("Account number"));
                            }
                            number
                        }
                        None => next_free_number(ctx, numbers.as_ref()).await?,
                    };

                    let account = ctx
                        .accounts()
                        .create(request.into_new_account(account_number))
                        .await
                        .inspect_err(|e| {
                            if let AppError::Conflict(field) = e {
                                tracing::warn!(field = %field, "Account insert lost a uniqueness race");
                            }
                        })?;

                    Ok::<_, AppError>(AccountView::new(account, owner.username))
                })
            })
            .await?;

        tracing::info!(
            account_id = view.id,
            account_number = %view.account_number,
            user_id = view.user_id,
            "Account created"
        );
        Ok(view)
    }

    async fn get_balance(&self, account_number: &str) -> AppResult<AccountView> {
        let account_number = account_number.trim();
        if account_number.is_empty() {
            return Err(AppError::validation("Account number is required"));
        }

        self.uow
            .accounts()
            .find_by_account_number(account_number)
            .await?
            .ok_or_not_found("Account")
    }

    async fn list_accounts(&self, user_id: i64) -> AppResult<Vec<AccountView>> {
        let owner = self
            .uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;

        let accounts = self.uow.accounts().list_by_user(user_id).await?;

        Ok(accounts
            .into_iter()
            .map(|account| AccountView::new(account, owner.username.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::infra::unit_of_work::testing::MockUnitOfWork;
    use crate::repository::{MockAccountRepository, MockUserRepository};
    use crate::service::account_number::MockAccountNumberGenerator;
    use domain::{Account, User};

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    fn stored_view(number: &str) -> AccountView {
        let account = Account {
            id: 1,
            account_number: number.to_string(),
            balance: Decimal::from(500),
            currency: "USD".to_string(),
            created_at: Utc::now(),
            user_id: 1,
        };
        AccountView::new(account, "alice")
    }

    fn request(number: Option<&str>, balance: Option<&str>) -> CreateAccount {
        CreateAccount {
            user_id: 1,
            account_number: number.map(str::to_string),
            balance: balance.map(|b| Decimal::from_str(b).unwrap()),
            currency: "usd".to_string(),
        }
    }

    fn users_with_alice() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| {
            Ok((id == 1).then(alice))
        });
        users
    }

    fn accounts_echoing_creates(accounts: &mut MockAccountRepository) {
        accounts.expect_create().times(1).returning(|new_account| {
            Ok(Account {
                id: 10,
                account_number: new_account.account_number.into_inner(),
                balance: new_account.balance,
                currency: new_account.currency.into_inner(),
                created_at: new_account.created_at,
                user_id: new_account.user_id,
            })
        });
    }

    fn provisioner(
        users: MockUserRepository,
        accounts: MockAccountRepository,
        numbers: MockAccountNumberGenerator,
    ) -> AccountProvisioner<MockUnitOfWork> {
        AccountProvisioner::with_generator(
            Arc::new(MockUnitOfWork::new(users, accounts)),
            Arc::new(numbers),
        )
    }

    #[tokio::test]
    async fn test_create_account_with_explicit_number() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .withf(|number| number == "ACC00001")
            .times(1)
            .returning(|_| Ok(None));
        accounts_echoing_creates(&mut accounts);

        let mut numbers = MockAccountNumberGenerator::new();
        numbers.expect_generate().times(0);

        let view = provisioner(users_with_alice(), accounts, numbers)
            .create_account(request(Some("ACC00001"), Some("500.00")))
            .await
            .unwrap();

        assert_eq!(view.account_number, "ACC00001");
        assert_eq!(view.currency, "USD");
        assert_eq!(view.balance, Decimal::from_str("500.00").unwrap());
        assert_eq!(view.username, "alice");
    }

    #[tokio::test]
    async fn test_create_account_unknown_user() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_find_by_account_number().times(0);
        accounts.expect_create().times(0);

        let err = provisioner(
            users_with_alice(),
            accounts,
            MockAccountNumberGenerator::new(),
        )
        .create_account(CreateAccount {
            user_id: 42,
            ..request(Some("ACC00001"), None)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref entity) if entity == "User"));
    }

    #[tokio::test]
    async fn test_create_account_duplicate_number() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .returning(|number| Ok(Some(stored_view(number))));
        accounts.expect_create().times(0);

        let err = provisioner(
            users_with_alice(),
            accounts,
            MockAccountNumberGenerator::new(),
        )
        .create_account(request(Some("ACC00001"), Some("1")))
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_account_invalid_input_skips_store() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(0);
        let mut accounts = MockAccountRepository::new();
        accounts.expect_create().times(0);

        let service = provisioner(users, accounts, MockAccountNumberGenerator::new());

        let err = service
            .create_account(request(None, Some("-5")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create_account(CreateAccount {
                currency: "dollars".to_string(),
                ..request(None, None)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_account_generates_number_and_zero_balance() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .withf(|number| number == "GEN000000001")
            .returning(|_| Ok(None));
        accounts_echoing_creates(&mut accounts);

        let mut numbers = MockAccountNumberGenerator::new();
        numbers
            .expect_generate()
            .times(1)
            .returning(|| "GEN000000001".to_string());

        let view = provisioner(users_with_alice(), accounts, numbers)
            .create_account(request(Some("  "), None))
            .await
            .unwrap();

        assert_eq!(view.account_number, "GEN000000001");
        assert_eq!(view.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_create_account_redraws_taken_number() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .times(2)
            .returning(|number| {
                Ok((number == "GEN000000001").then(|| stored_view(number)))
            });
        accounts_echoing_creates(&mut accounts);

        let mut drawn = 0;
        let mut numbers = MockAccountNumberGenerator::new();
        numbers.expect_generate().times(2).returning(move || {
            drawn += 1;
            format!("GEN{:09}", drawn)
        });

        let view = provisioner(users_with_alice(), accounts, numbers)
            .create_account(request(None, None))
            .await
            .unwrap();

        assert_eq!(view.account_number, "GEN000000002");
    }

    #[tokio::test]
    async fn test_create_account_gives_up_after_bounded_draws() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .times(MAX_ACCOUNT_NUMBER_ATTEMPTS)
            .returning(|number| Ok(Some(stored_view(number))));
        accounts.expect_create().times(0);

        let mut numbers = MockAccountNumberGenerator::new();
        numbers
            .expect_generate()
            .times(MAX_ACCOUNT_NUMBER_ATTEMPTS)
            .returning(|| "GEN000000001".to_string());

        let err = provisioner(users_with_alice(), accounts, numbers)
            .create_account(request(None, None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_balance_trims_input() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .withf(|number| number == "ACC00001")
            .returning(|number| Ok(Some(stored_view(number))));

        let view = provisioner(
            MockUserRepository::new(),
            accounts,
            MockAccountNumberGenerator::new(),
        )
        .get_balance(" ACC00001 ")
        .await
        .unwrap();

        assert_eq!(view.balance, Decimal::from(500));
        assert_eq!(view.username, "alice");
    }

    #[tokio::test]
    async fn test_get_balance_blank_and_missing() {
        let mut accounts = MockAccountRepository::new();
        accounts
            .expect_find_by_account_number()
            .times(1)
            .returning(|_| Ok(None));

        let service = provisioner(
            MockUserRepository::new(),
            accounts,
            MockAccountNumberGenerator::new(),
        );

        let err = service.get_balance("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.get_balance("ACC99999").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref entity) if entity == "Account"));
    }

    #[tokio::test]
    async fn test_list_accounts_unknown_user() {
        let mut accounts = MockAccountRepository::new();
        accounts.expect_list_by_user().times(0);

        let err = provisioner(
            users_with_alice(),
            accounts,
            MockAccountNumberGenerator::new(),
        )
        .list_accounts(42)
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
