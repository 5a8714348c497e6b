//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Users
// =============================================================================

/// Maximum username length (matches the `users.username` column)
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum email length (matches the `users.email` column)
pub const MAX_EMAIL_LENGTH: usize = 255;

// =============================================================================
// Accounts
// =============================================================================

/// Minimum length of a caller-supplied account number
pub const MIN_ACCOUNT_NUMBER_LENGTH: usize = 5;

/// Maximum length of an account number (matches the `accounts.account_number` column)
pub const MAX_ACCOUNT_NUMBER_LENGTH: usize = 20;

/// Length of a generated account number
pub const GENERATED_ACCOUNT_NUMBER_LENGTH: usize = 12;

/// How many generated candidates are tried before giving up with a conflict
pub const MAX_ACCOUNT_NUMBER_ATTEMPTS: usize = 3;

/// Exact length of an ISO-4217 style currency code
pub const CURRENCY_CODE_LENGTH: usize = 3;

/// Fractional digits kept for balances (matches `NUMERIC(19, 4)`)
pub const BALANCE_SCALE: u32 = 4;
