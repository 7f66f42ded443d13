// 💳 Account Entity - email identity with an always-valid balance
//
// "Identity never changes, the balance is the only value that moves"
//
// Guarantees:
// - identity passes `is_email_valid` from construction on
// - balance is whole cents, never negative
// - withdraw/deposit/transfer either fully apply or change nothing

use crate::email::is_email_valid;
use crate::error::{AccountError, RegistryError, Result};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Single monetary account.
///
/// Fields are private so every path that changes them goes through the
/// validating operations below. Deserialization runs the same checks as
/// [`Account::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AccountRecord", try_from = "AccountRecord")]
pub struct Account {
    /// Owner's email address - NEVER changes
    identity: String,

    balance: Money,
}

impl Account {
    /// Create a new account.
    ///
    /// Identity is checked before the starting balance, so a call with both
    /// wrong reports `InvalidIdentity`.
    pub fn create(identity: impl Into<String>, starting_balance: f64) -> Result<Self> {
        let identity = identity.into();

        if !is_email_valid(&identity) {
            debug!(identity = %identity, "rejected account: invalid identity");
            return Err(AccountError::InvalidIdentity { identity });
        }
        let balance = parse_amount(starting_balance)?;

        debug!(identity = %identity, balance = %balance, "account created");
        Ok(Account { identity, balance })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Current balance as a decimal number
    pub fn balance(&self) -> f64 {
        self.balance.to_f64()
    }

    /// Current balance in exact cents
    pub fn balance_money(&self) -> Money {
        self.balance
    }

    /// Withdraw `amount`.
    ///
    /// Fails with `InvalidAmount` first, then `InsufficientFunds` when
    /// `amount > balance`. Withdrawing the whole balance drains it to zero.
    pub fn withdraw(&mut self, amount: f64) -> Result<()> {
        let amount = parse_amount(amount).inspect_err(|err| self.log_rejected("withdraw", err))?;
        self.balance = self
            .debited(amount)
            .inspect_err(|err| self.log_rejected("withdraw", err))?;

        debug!(identity = %self.identity, amount = %amount, balance = %self.balance, "withdraw applied");
        Ok(())
    }

    /// Deposit `amount`. Zero is a valid no-op.
    pub fn deposit(&mut self, amount: f64) -> Result<()> {
        let amount = parse_amount(amount).inspect_err(|err| self.log_rejected("deposit", err))?;
        self.balance = self
            .credited(amount)
            .inspect_err(|err| self.log_rejected("deposit", err))?;

        debug!(identity = %self.identity, amount = %amount, balance = %self.balance, "deposit applied");
        Ok(())
    }

    /// Move `amount` from this account to `destination`.
    ///
    /// Checks run in a fixed order: destination present, amount valid, funds
    /// sufficient. Both new balances are computed before either account is
    /// touched, so a rejected transfer leaves both unchanged.
    pub fn transfer(&mut self, destination: Option<&mut Account>, amount: f64) -> Result<()> {
        let destination = destination
            .ok_or(AccountError::InvalidDestination)
            .inspect_err(|err| self.log_rejected("transfer", err))?;
        let amount = parse_amount(amount).inspect_err(|err| self.log_rejected("transfer", err))?;

        let debited = self
            .debited(amount)
            .inspect_err(|err| self.log_rejected("transfer", err))?;
        let credited = destination
            .credited(amount)
            .inspect_err(|err| self.log_rejected("transfer", err))?;

        self.balance = debited;
        destination.balance = credited;

        debug!(
            from = %self.identity,
            to = %destination.identity,
            amount = %amount,
            "transfer applied"
        );
        Ok(())
    }

    /// Balance after removing `amount`, without applying it
    fn debited(&self, amount: Money) -> Result<Money> {
        self.balance
            .checked_sub(amount)
            .ok_or(AccountError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            })
    }

    /// Balance after adding `amount`, without applying it
    fn credited(&self, amount: Money) -> Result<Money> {
        self.balance
            .checked_add(amount)
            .ok_or(AccountError::InvalidAmount {
                amount: amount.to_f64(),
            })
    }

    fn log_rejected(&self, operation: &str, err: &AccountError) {
        debug!(identity = %self.identity, operation, kind = err.kind(), "operation rejected");
    }
}

fn parse_amount(amount: f64) -> Result<Money> {
    Money::try_from_f64(amount).ok_or(AccountError::InvalidAmount { amount })
}

/// Wire shape of an account: `{"identity": "...", "balance": 12.5}`
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    identity: String,
    balance: f64,
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        AccountRecord {
            balance: account.balance(),
            identity: account.identity,
        }
    }
}

impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self> {
        Account::create(record.identity, record.balance)
    }
}

// ============================================================================
// ACCOUNT REGISTRY
// ============================================================================

/// In-memory accounts keyed by identity.
///
/// Lets a host route operations by email address. An identity that is not
/// registered plays the role of an absent transfer destination.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: HashMap<String, Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new account
    pub fn open(
        &mut self,
        identity: impl Into<String>,
        starting_balance: f64,
    ) -> std::result::Result<&Account, RegistryError> {
        let account = Account::create(identity, starting_balance)?;
        self.insert(account)
    }

    /// Register an existing account. Identities are unique.
    pub fn insert(&mut self, account: Account) -> std::result::Result<&Account, RegistryError> {
        match self.accounts.entry(account.identity.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateIdentity {
                identity: account.identity,
            }),
            Entry::Vacant(slot) => Ok(slot.insert(account)),
        }
    }

    pub fn get(&self, identity: &str) -> Option<&Account> {
        self.accounts.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut Account> {
        self.accounts.get_mut(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.accounts.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts, sorted by identity
    pub fn all_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.identity.cmp(&b.identity));
        accounts
    }

    /// Identity → balance, sorted by identity
    pub fn balances(&self) -> BTreeMap<String, Money> {
        self.accounts
            .values()
            .map(|acc| (acc.identity.clone(), acc.balance))
            .collect()
    }

    /// Sum of all balances, `None` if it does not fit in cents
    pub fn total_balance(&self) -> Option<Money> {
        self.accounts
            .values()
            .try_fold(Money::ZERO, |total, acc| total.checked_add(acc.balance))
    }

    pub fn deposit(&mut self, identity: &str, amount: f64) -> std::result::Result<(), RegistryError> {
        self.account_mut(identity)?.deposit(amount)?;
        Ok(())
    }

    pub fn withdraw(&mut self, identity: &str, amount: f64) -> std::result::Result<(), RegistryError> {
        self.account_mut(identity)?.withdraw(amount)?;
        Ok(())
    }

    /// Transfer between two registered accounts.
    ///
    /// An unknown `from` is `UnknownAccount`; an unknown `to` is an absent
    /// destination (`InvalidDestination`). `from == to` runs every check and
    /// then leaves the balance as it was.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> std::result::Result<(), RegistryError> {
        let (debited, credited) = {
            let source = self.accounts.get(from).ok_or_else(|| RegistryError::UnknownAccount {
                identity: from.to_string(),
            })?;
            let destination = self.accounts.get(to).ok_or(AccountError::InvalidDestination)?;
            let amount = parse_amount(amount)?;

            let debited = source.debited(amount)?;
            if from == to {
                debug!(identity = %from, amount = %amount, "self-transfer applied");
                return Ok(());
            }
            (debited, destination.credited(amount)?)
        };

        if let Some(source) = self.accounts.get_mut(from) {
            source.balance = debited;
        }
        if let Some(destination) = self.accounts.get_mut(to) {
            destination.balance = credited;
        }

        debug!(from = %from, to = %to, "transfer applied");
        Ok(())
    }

    fn account_mut(&mut self, identity: &str) -> std::result::Result<&mut Account, RegistryError> {
        self.accounts
            .get_mut(identity)
            .ok_or_else(|| RegistryError::UnknownAccount {
                identity: identity.to_string(),
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
