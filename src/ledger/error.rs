//! Ledger errors

use crate::ledger::address::Address;
use thiserror::Error;

/// Every reason a ledger operation can be rejected.
///
/// A rejected operation leaves the ledger untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized account: {0} is not the owner")]
    Unauthorized(Address),
    #[error("Denylist: caller {0} is denylisted")]
    CallerDenylisted(Address),
    #[error("Denylist: from address {0} is denylisted")]
    FromDenylisted(Address),
    #[error("Denylist: to address {0} is denylisted")]
    ToDenylisted(Address),
    #[error("Denylist: spender {0} is denylisted")]
    SpenderDenylisted(Address),
    #[error("Denylist: recipient {0} is denylisted")]
    RecipientDenylisted(Address),
    #[error("Address {0} is not denylisted")]
    NotDenylisted(Address),
    #[error("Insufficient balance for {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        have: u128,
        need: u128,
    },
    #[error("Insufficient allowance from {owner} to {spender}: have {have}, need {need}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        have: u128,
        need: u128,
    },
    #[error("Invalid sender: {0}")]
    InvalidSender(Address),
    #[error("Invalid receiver: {0}")]
    InvalidReceiver(Address),
    #[error("Invalid approver: {0}")]
    InvalidApprover(Address),
    #[error("Invalid spender: {0}")]
    InvalidSpender(Address),
    #[error("Invalid owner: {0}")]
    InvalidOwner(Address),
    #[error("Supply overflow: minting {amount} on top of {supply}")]
    SupplyOverflow { supply: u128, amount: u128 },
}

impl LedgerError {
    /// Whether this rejection came from the denylist gate
    pub fn is_denylist_violation(&self) -> bool {
        matches!(
            self,
            LedgerError::CallerDenylisted(_)
                | LedgerError::FromDenylisted(_)
                | LedgerError::ToDenylisted(_)
                | LedgerError::SpenderDenylisted(_)
                | LedgerError::RecipientDenylisted(_)
        )
    }
}
