//! Denylist gate
//!
//! Holds the set of restricted accounts and the guard used by every gated
//! ledger operation. Roles are checked in a fixed order by the caller of
//! [`Denylist::ensure_clear`]: caller first, then the funds source, then the
//! recipient or spender.

use crate::ledger::address::Address;
use crate::ledger::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The part an account plays in a gated operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The account invoking the operation
    Caller,
    /// The funds source of a delegated transfer
    From,
    /// The recipient of a delegated transfer
    To,
    /// The account being granted an allowance
    Spender,
    /// The recipient of a direct transfer
    Recipient,
}

impl Role {
    /// The rejection reported when `account` trips the gate in this role
    pub fn rejection(self, account: Address) -> LedgerError {
        match self {
            Role::Caller => LedgerError::CallerDenylisted(account),
            Role::From => LedgerError::FromDenylisted(account),
            Role::To => LedgerError::ToDenylisted(account),
            Role::Spender => LedgerError::SpenderDenylisted(account),
            Role::Recipient => LedgerError::RecipientDenylisted(account),
        }
    }
}

/// Set of denylisted accounts
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Denylist {
    accounts: HashSet<Address>,
}

impl Denylist {
    /// Create an empty denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test
    pub fn contains(&self, account: &Address) -> bool {
        self.accounts.contains(account)
    }

    /// Add an account. Returns whether it was newly added.
    pub fn insert(&mut self, account: Address) -> bool {
        self.accounts.insert(account)
    }

    /// Remove an account. Returns whether it was present.
    pub fn remove(&mut self, account: &Address) -> bool {
        self.accounts.remove(account)
    }

    /// Fail with the role's rejection if `account` is denylisted
    pub fn ensure_clear(&self, account: &Address, role: Role) -> Result<(), LedgerError> {
        if self.contains(account) {
            return Err(role.rejection(*account));
        }
        Ok(())
    }

    /// Check several roles in order; the first listed account wins
    pub fn ensure_all_clear(&self, checks: &[(&Address, Role)]) -> Result<(), LedgerError> {
        checks
            .iter()
            .try_for_each(|(account, role)| self.ensure_clear(account, *role))
    }

    /// Listed accounts in sorted order
    pub fn accounts(&self) -> Vec<Address> {
        let mut accounts: Vec<Address> = self.accounts.iter().copied().collect();
        accounts.sort();
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
