//! Currency codes and balance rules.

use std::fmt;

use rust_decimal::Decimal;

use crate::constants::{BALANCE_SCALE, CURRENCY_CODE_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Largest balance representable by the `NUMERIC(19, 4)` column, exclusive.
const BALANCE_UPPER_BOUND: i64 = 1_000_000_000_000_000;

/// Three-letter currency code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalize a currency code (`"usd"` becomes `"USD"`).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let code = raw.trim();

        if code.chars().count() != CURRENCY_CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "Currency code must be {} characters",
                CURRENCY_CODE_LENGTH
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(
                "Currency code must contain letters only",
            ));
        }

        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check an opening balance: zero or positive, at most four fractional
/// digits, and within the storable range.
pub fn validate_opening_balance(balance: Decimal) -> DomainResult<Decimal> {
    if balance < Decimal::ZERO {
        return Err(DomainError::validation("Balance must be zero or positive"));
    }
    if balance.normalize().scale() > BALANCE_SCALE {
        return Err(DomainError::validation(format!(
            "Balance supports at most {} decimal places",
            BALANCE_SCALE
        )));
    }
    if balance >= Decimal::from(BALANCE_UPPER_BOUND) {
        return Err(DomainError::validation("Balance is too large"));
    }

    Ok(balance)
}
