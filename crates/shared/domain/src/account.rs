//! Account domain entity and related types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ACCOUNT_NUMBER_LENGTH, MIN_ACCOUNT_NUMBER_LENGTH};
use crate::currency::{validate_opening_balance, CurrencyCode};
use crate::error::{DomainError, DomainResult};

/// Externally visible account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Parse an account number: trimmed, 5 to 20 characters, no inner whitespace.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let number = raw.trim();
        let length = number.chars().count();

        if !(MIN_ACCOUNT_NUMBER_LENGTH..=MAX_ACCOUNT_NUMBER_LENGTH).contains(&length) {
            return Err(DomainError::validation(format!(
                "Account number must be between {} and {} characters",
                MIN_ACCOUNT_NUMBER_LENGTH, MAX_ACCOUNT_NUMBER_LENGTH
            )));
        }
        if number.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(
                "Account number must not contain whitespace",
            ));
        }

        Ok(Self(number.to_string()))
    }

    /// Parse an optional account number. Absent or blank means "generate one".
    pub fn parse_optional(raw: Option<&str>) -> DomainResult<Option<Self>> {
        match raw {
            Some(value) if !value.trim().is_empty() => Self::parse(value).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account domain entity, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Account joined with its owner's username (read model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: i64,
    pub account_number: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    /// Owner's username, resolved through `user_id` at read time
    pub username: String,
}

impl AccountView {
    pub fn new(account: Account, username: impl Into<String>) -> Self {
        Self {
            id: account.id,
            account_number: account.account_number,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at,
            user_id: account.user_id,
            username: username.into(),
        }
    }
}

/// Data required to insert an account. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user_id: i64,
    pub account_number: AccountNumber,
    pub balance: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
}

/// Account creation request as received from a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    /// Owning user
    pub user_id: i64,
    /// Requested account number; generated when absent or blank
    pub account_number: Option<String>,
    /// Opening balance; zero when absent
    pub balance: Option<Decimal>,
    /// Currency code, any case
    pub currency: String,
}

/// A `CreateAccount` whose fields passed validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub user_id: i64,
    pub account_number: Option<AccountNumber>,
    pub balance: Decimal,
    pub currency: CurrencyCode,
}

impl CreateAccount {
    /// Validate and normalize the request without touching any store.
    pub fn validate(self) -> DomainResult<ProvisionRequest> {
        let currency = CurrencyCode::parse(&self.currency)?;
        let balance = validate_opening_balance(self.balance.unwrap_or(Decimal::ZERO))?;
        let account_number = AccountNumber::parse_optional(self.account_number.as_deref())?;

        Ok(ProvisionRequest {
            user_id: self.user_id,
            account_number,
            balance,
            currency,
        })
    }
}

impl ProvisionRequest {
    /// Finalize into an insertable record with the resolved account number.
    pub fn into_new_account(self, account_number: AccountNumber) -> NewAccount {
        NewAccount {
            user_id: self.user_id,
            account_number,
            balance: self.balance,
            currency: self.currency,
            created_at: Utc::now(),
        }
    }
}
