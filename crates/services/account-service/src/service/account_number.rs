//! Account number generation.

use uuid::Uuid;

use domain::GENERATED_ACCOUNT_NUMBER_LENGTH;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Source of candidate account numbers for accounts created without one.
///
/// Candidates are fixed-length and unpredictable. Uniqueness is not
/// guaranteed here; the provisioner checks every candidate against the store.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait AccountNumberGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Draws numbers from random UUIDs: the first 12 hex digits, upper case.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAccountNumbers;

impl AccountNumberGenerator for RandomAccountNumbers {
    fn generate(&self) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        hex[..GENERATED_ACCOUNT_NUMBER_LENGTH].to_ascii_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::AccountNumber;

    #[test]
    fn generated_numbers_are_fixed_length_hex() {
        let number = RandomAccountNumbers.generate();

        assert_eq!(number.len(), GENERATED_ACCOUNT_NUMBER_LENGTH);
        assert!(number
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn generated_numbers_are_valid_account_numbers() {
        let number = RandomAccountNumbers.generate();
        assert!(AccountNumber::parse(&number).is_ok());
    }

    #[test]
    fn generated_numbers_differ() {
        let first = RandomAccountNumbers.generate();
        let second = RandomAccountNumbers.generate();
        assert_ne!(first, second);
    }
}
