// Entity Models
// "Identity persists, values change"
//
// Each entity has:
// - Stable identity that NEVER changes
// - Values that only move through validated operations
// - Registry for lookups by identity

pub mod account;

pub use account::{Account, AccountRegistry};
