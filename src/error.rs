// ⚠️ Error Types - every rejected operation is an explicit value
//
// Account errors are precondition violations: a caller can always avoid them
// by checking inputs with `is_email_valid` / `is_amount_valid` first.

use crate::money::Money;
use thiserror::Error;

/// Result type for account operations
pub type Result<T> = std::result::Result<T, AccountError>;

// ============================================================================
// ACCOUNT ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountError {
    /// Identity is not a well-formed email address
    #[error("Email address {identity:?} is invalid")]
    InvalidIdentity { identity: String },

    /// Amount is negative, has more than two decimal places, or cannot be held
    #[error("Amount {amount} is invalid: must be non-negative with at most two decimal places")]
    InvalidAmount { amount: f64 },

    /// Requested debit exceeds the current balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// Transfer target is absent
    #[error("Destination account is missing, cannot transfer")]
    InvalidDestination,
}

impl AccountError {
    /// Stable snake_case name, used in replay reports
    pub fn kind(&self) -> &'static str {
        match self {
            AccountError::InvalidIdentity { .. } => "invalid_identity",
            AccountError::InvalidAmount { .. } => "invalid_amount",
            AccountError::InsufficientFunds { .. } => "insufficient_funds",
            AccountError::InvalidDestination => "invalid_destination",
        }
    }
}

// ============================================================================
// REGISTRY ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Account {identity:?} already exists")]
    DuplicateIdentity { identity: String },

    #[error("Account {identity:?} not found")]
    UnknownAccount { identity: String },

    #[error(transparent)]
    Account(#[from] AccountError),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::DuplicateIdentity { .. } => "duplicate_identity",
            RegistryError::UnknownAccount { .. } => "unknown_account",
            RegistryError::Account(err) => err.kind(),
        }
    }
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Text that is not a non-negative decimal with at most two fractional digits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid monetary amount: {input:?}")]
pub struct ParseMoneyError {
    pub input: String,
}
