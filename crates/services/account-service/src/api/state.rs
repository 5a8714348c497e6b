//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::infra::{HealthCheck, UnitOfWork};
use crate::service::{AccountProvisioner, AccountService, UserDirectory, UserService};

/// Services shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub account_service: Arc<dyn AccountService>,
    /// Store probed by the health endpoint
    pub store: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Create application state with manually injected services.
    pub fn new(
        user_service: Arc<dyn UserService>,
        account_service: Arc<dyn AccountService>,
        store: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            user_service,
            account_service,
            store,
        }
    }

    /// Wire both services over one Unit of Work.
    pub fn from_unit_of_work<U>(uow: Arc<U>) -> Self
    where
        U: UnitOfWork + HealthCheck + 'static,
    {
        Self {
            user_service: Arc::new(UserDirectory::new(uow.clone())),
            account_service: Arc::new(AccountProvisioner::new(uow.clone())),
            store: uow,
        }
    }
}
