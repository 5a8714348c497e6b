//! User service - registration and lookup of account owners.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult, OptionExt};
use domain::{NewUser, User};

use crate::infra::UnitOfWork;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a user. Username and email must both be unused.
    async fn create_user(&self, username: &str, email: &str) -> AppResult<User>;

    /// Get user by ID
    async fn get_user(&self, id: i64) -> AppResult<User>;
}

/// Concrete implementation of UserService over a Unit of Work.
pub struct UserDirectory<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserDirectory<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork + 'static> UserService for UserDirectory<U> {
    async fn create_user(&self, username: &str, email: &str) -> AppResult<User> {
        let new_user = NewUser::new(username, email)?;

        let user = crate::with_transaction!(self.uow, |ctx| {
            let users = ctx.users();

            if users.find_by_username(&new_user.username).await?.is_some() {
                return Err(AppError::conflict("Username"));
            }
            if users.find_by_email(&new_user.email).await?.is_some() {
                return Err(AppError::conflict("Email"));
            }

            // A concurrent registration can still win the unique index
            users.create(new_user).await.inspect_err(|e| {
                if let AppError::Conflict(field) = e {
                    tracing::warn!(field = %field, "User insert lost a uniqueness race");
                }
            })
        })?;

        tracing::info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;

    use crate::infra::unit_of_work::testing::MockUnitOfWork;
    use crate::repository::{MockAccountRepository, MockUserRepository};

    fn stored_user(id: i64, username: &str, email: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    fn directory(users: MockUserRepository) -> UserDirectory<MockUnitOfWork> {
        UserDirectory::new(Arc::new(MockUnitOfWork::new(
            users,
            MockAccountRepository::new(),
        )))
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .withf(|name| name == "alice")
            .times(1)
            .returning(|_| Ok(None));
        users
            .expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(|_| Ok(None));
        users
            .expect_create()
            .times(1)
            .returning(|new_user| Ok(stored_user(1, &new_user.username, &new_user.email)));

        let user = directory(users)
            .create_user(" alice ", "alice@example.com")
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .returning(|_| Ok(Some(stored_user(1, "alice", "alice@example.com"))));
        users.expect_find_by_email().times(0);
        users.expect_create().times(0);

        let err = directory(users)
            .create_user("alice", "other@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref field) if field == "Username"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_find_by_email()
            .returning(|_| Ok(Some(stored_user(1, "alice", "alice@example.com"))));
        users.expect_create().times(0);

        let err = directory(users)
            .create_user("bob", "alice@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref field) if field == "Email"));
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_fields() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().times(0);
        users.expect_create().times(0);

        let err = directory(users)
            .create_user("   ", "alice@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_user_insert_race_is_conflict() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .returning(|_| Err(AppError::conflict("Username")));

        let err = directory(users)
            .create_user("alice", "alice@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(stored_user(id, "alice", "alice@example.com"))));

        let user = directory(users).get_user(7).await.unwrap();
        assert_eq!(user.id, 7);
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let err = directory(users).get_user(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
