// Bank Account - Core Library
// Exposes all modules for use in the CLI and tests

pub mod email;
pub mod entities;
pub mod error;
pub mod money;
pub mod replay;

// Re-export commonly used types
pub use email::is_email_valid;
pub use entities::{Account, AccountRegistry};
pub use error::{AccountError, ParseMoneyError, RegistryError, Result};
pub use money::{is_amount_valid, Money};
pub use replay::{
    load_operations, read_operations, replay,
    Operation, OperationKind, Outcome, ReplayReport,
};
