//! Denylist-gated fungible ledger
//!
//! The [`Ledger`] is the single aggregate holding balances, allowances,
//! total supply, the owner and the denylist. Every mutating operation
//! validates all of its preconditions before touching state, so a rejected
//! call leaves the ledger exactly as it was.

use crate::ledger::address::Address;
use crate::ledger::config::{ConfigError, LedgerConfig};
use crate::ledger::denylist::{Denylist, Role};
use crate::ledger::error::LedgerError;
use crate::ledger::event::{EventJournal, EventRecord, LedgerEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ledger metadata (immutable after genesis)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerMetadata {
    /// Display name (e.g., "Trade.mn")
    pub name: String,
    /// Display symbol (e.g., "TRD")
    pub symbol: String,
    /// Decimal places (18 for TRD)
    pub decimals: u8,
    /// Genesis timestamp
    pub created_at: DateTime<Utc>,
}

/// A fungible token ledger with an owner-controlled denylist
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    metadata: LedgerMetadata,
    /// Account allowed to run privileged operations
    owner: Address,
    /// Always equal to the sum of all balances
    #[serde(with = "crate::ledger::event::amount_string")]
    total_supply: u128,
    /// Balances: address -> amount
    #[serde(with = "crate::ledger::event::amount_map")]
    balances: HashMap<Address, u128>,
    /// Allowances: owner -> (spender -> amount)
    #[serde(with = "crate::ledger::event::nested_amount_map")]
    allowances: HashMap<Address, HashMap<Address, u128>>,
    /// Restricted accounts
    denylist: Denylist,
    /// Recent events
    history: EventJournal,
}

impl Ledger {
    /// Create a ledger from a genesis config.
    ///
    /// Records the ownership assignment and one mint per allocation in the
    /// event journal.
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let total_supply = config.initial_supply()?;

        let mut ledger = Self {
            metadata: LedgerMetadata {
                name: config.name,
                symbol: config.symbol,
                decimals: config.decimals,
                created_at: Utc::now(),
            },
            owner: config.owner,
            total_supply,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            denylist: Denylist::new(),
            history: EventJournal::new(),
        };

        ledger.emit(LedgerEvent::OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: config.owner,
        });

        for allocation in config.allocations {
            *ledger.balances.entry(allocation.holder).or_insert(0) += allocation.amount;
            ledger.emit(LedgerEvent::Transfer {
                from: Address::ZERO,
                to: allocation.holder,
                amount: allocation.amount,
            });
        }

        log::info!(
            "Ledger created: {} ({}) owned by {}, supply {}",
            ledger.name(),
            ledger.symbol(),
            ledger.owner,
            ledger.total_supply
        );

        Ok(ledger)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current owner (zero after renouncement)
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Get ledger name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get ledger symbol
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Get decimal places
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Name, symbol, decimals and genesis time
    pub fn metadata(&self) -> &LedgerMetadata {
        &self.metadata
    }

    /// Get total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Get allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Check denylist membership
    pub fn is_denylisted(&self, account: &Address) -> bool {
        self.denylist.contains(account)
    }

    /// The denylist itself
    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// All holders with a positive balance
    pub fn holders(&self) -> Vec<(Address, u128)> {
        let mut holders: Vec<(Address, u128)> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, &b)| (*a, b))
            .collect();
        holders.sort();
        holders
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Recent events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &EventRecord> {
        self.history.records()
    }

    /// Whether the balances add up to the total supply
    pub fn verify_supply(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |sum, b| sum.checked_add(*b))
            == Some(self.total_supply)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Move `amount` from the caller to `to`
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        self.denylist
            .ensure_all_clear(&[(caller, Role::Caller), (to, Role::Recipient)])
            .and_then(|_| ensure_sender(caller))
            .and_then(|_| ensure_receiver(to))
            .and_then(|_| self.ensure_balance(caller, amount))
            .inspect_err(|e| log::debug!("transfer rejected: {}", e))?;

        self.move_funds(caller, to, amount);
        log::debug!("Transfer {} -> {}: {}", caller, to, amount);

        Ok(self.emit(LedgerEvent::Transfer {
            from: *caller,
            to: *to,
            amount,
        }))
    }

    /// Set the allowance `spender` may draw from the caller's balance.
    ///
    /// The new value replaces the old one; zero revokes.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        self.denylist
            .ensure_all_clear(&[(caller, Role::Caller), (spender, Role::Spender)])
            .and_then(|_| {
                if caller.is_zero() {
                    return Err(LedgerError::InvalidApprover(*caller));
                }
                if spender.is_zero() {
                    return Err(LedgerError::InvalidSpender(*spender));
                }
                Ok(())
            })
            .inspect_err(|e| log::debug!("approve rejected: {}", e))?;

        self.allowances
            .entry(*caller)
            .or_default()
            .insert(*spender, amount);
        log::debug!("Approval {} -> {}: {}", caller, spender, amount);

        Ok(self.emit(LedgerEvent::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        }))
    }

    /// Move `amount` from `from` to `to` on the strength of an allowance
    /// `from` granted to the caller
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        self.denylist
            .ensure_all_clear(&[
                (caller, Role::Caller),
                (from, Role::From),
                (to, Role::To),
            ])
            .and_then(|_| ensure_sender(from))
            .and_then(|_| ensure_receiver(to))
            .and_then(|_| self.ensure_allowance(from, caller, amount))
            .and_then(|_| self.ensure_balance(from, amount))
            .inspect_err(|e| log::debug!("transfer_from rejected: {}", e))?;

        self.spend_allowance(from, caller, amount);
        self.move_funds(from, to, amount);
        log::debug!(
            "Delegated transfer by {}: {} -> {}: {}",
            caller,
            from,
            to,
            amount
        );

        Ok(self.emit(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        }))
    }

    // =========================================================================
    // Burning
    // =========================================================================

    /// Destroy `amount` of the caller's own funds.
    ///
    /// Not gated: a denylisted account may still burn its balance.
    pub fn burn(&mut self, caller: &Address, amount: u128) -> Result<LedgerEvent, LedgerError> {
        ensure_sender(caller)
            .and_then(|_| self.ensure_balance(caller, amount))
            .inspect_err(|e| log::debug!("burn rejected: {}", e))?;

        self.destroy(caller, amount);
        log::debug!("Burn by {}: {}", caller, amount);

        Ok(self.emit(LedgerEvent::Transfer {
            from: *caller,
            to: Address::ZERO,
            amount,
        }))
    }

    /// Destroy `amount` of `from`'s funds using the caller's allowance.
    ///
    /// Not gated, like [`Ledger::burn`].
    pub fn burn_from(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        ensure_sender(from)
            .and_then(|_| self.ensure_allowance(from, caller, amount))
            .and_then(|_| self.ensure_balance(from, amount))
            .inspect_err(|e| log::debug!("burn_from rejected: {}", e))?;

        self.spend_allowance(from, caller, amount);
        self.destroy(from, amount);
        log::debug!("Delegated burn by {} from {}: {}", caller, from, amount);

        Ok(self.emit(LedgerEvent::Transfer {
            from: *from,
            to: Address::ZERO,
            amount,
        }))
    }

    // =========================================================================
    // Owner operations
    // =========================================================================

    /// Create `amount` new units in `to`'s balance (owner only).
    ///
    /// The recipient's denylist status is not checked.
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        let new_supply = self
            .only_owner(caller)
            .and_then(|_| ensure_receiver(to))
            .and_then(|_| {
                self.total_supply
                    .checked_add(amount)
                    .ok_or(LedgerError::SupplyOverflow {
                        supply: self.total_supply,
                        amount,
                    })
            })
            .inspect_err(|e| log::debug!("mint rejected: {}", e))?;

        self.total_supply = new_supply;
        *self.balances.entry(*to).or_insert(0) += amount;
        log::info!("Minted {} to {}, supply now {}", amount, to, new_supply);

        Ok(self.emit(LedgerEvent::Transfer {
            from: Address::ZERO,
            to: *to,
            amount,
        }))
    }

    /// Add an account to the denylist (owner only).
    ///
    /// Adding an account that is already listed still emits the event.
    pub fn add_to_denylist(
        &mut self,
        caller: &Address,
        account: &Address,
    ) -> Result<LedgerEvent, LedgerError> {
        self.only_owner(caller)
            .inspect_err(|e| log::debug!("add_to_denylist rejected: {}", e))?;

        if !self.denylist.insert(*account) {
            log::debug!("{} was already denylisted", account);
        }
        log::info!("Added {} to denylist", account);

        Ok(self.emit(LedgerEvent::AddedToDenylist { account: *account }))
    }

    /// Remove an account from the denylist (owner only).
    ///
    /// Removing an account that is not listed still emits the event.
    pub fn remove_from_denylist(
        &mut self,
        caller: &Address,
        account: &Address,
    ) -> Result<LedgerEvent, LedgerError> {
        self.only_owner(caller)
            .inspect_err(|e| log::debug!("remove_from_denylist rejected: {}", e))?;

        if !self.denylist.remove(account) {
            log::debug!("{} was not denylisted", account);
        }
        log::info!("Removed {} from denylist", account);

        Ok(self.emit(LedgerEvent::RemovedFromDenylist { account: *account }))
    }

    /// Move funds out of a denylisted account without its cooperation
    /// (owner only). The recipient is not gated.
    pub fn retrieve_from_denylist(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<LedgerEvent, LedgerError> {
        self.only_owner(caller)
            .and_then(|_| {
                if !self.denylist.contains(from) {
                    return Err(LedgerError::NotDenylisted(*from));
                }
                Ok(())
            })
            .and_then(|_| ensure_sender(from))
            .and_then(|_| ensure_receiver(to))
            .and_then(|_| self.ensure_balance(from, amount))
            .inspect_err(|e| log::debug!("retrieve rejected: {}", e))?;

        self.move_funds(from, to, amount);
        log::info!("Retrieved {} from denylisted {} to {}", amount, from, to);

        Ok(self.emit(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        }))
    }

    /// Hand ownership to another account (owner only)
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<LedgerEvent, LedgerError> {
        self.only_owner(caller)
            .and_then(|_| {
                if new_owner.is_zero() {
                    return Err(LedgerError::InvalidOwner(*new_owner));
                }
                Ok(())
            })
            .inspect_err(|e| log::debug!("transfer_ownership rejected: {}", e))?;

        Ok(self.set_owner(*new_owner))
    }

    /// Give up ownership for good (owner only).
    ///
    /// Every owner operation fails afterwards.
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.only_owner(caller)
            .inspect_err(|e| log::debug!("renounce_ownership rejected: {}", e))?;

        Ok(self.set_owner(Address::ZERO))
    }

    // =========================================================================
    // Guards and effects
    // =========================================================================

    fn only_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.owner.is_zero() || *caller != self.owner {
            return Err(LedgerError::Unauthorized(*caller));
        }
        Ok(())
    }

    fn ensure_balance(&self, account: &Address, amount: u128) -> Result<(), LedgerError> {
        let have = self.balance_of(account);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                have,
                need: amount,
            });
        }
        Ok(())
    }

    fn ensure_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let have = self.allowance(owner, spender);
        if have < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *owner,
                spender: *spender,
                have,
                need: amount,
            });
        }
        Ok(())
    }

    // Callers must have run ensure_allowance.
    fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) {
        if let Some(allowance) = self
            .allowances
            .get_mut(owner)
            .and_then(|spenders| spenders.get_mut(spender))
        {
            *allowance -= amount;
        }
    }

    // Callers must have run ensure_balance.
    fn move_funds(&mut self, from: &Address, to: &Address, amount: u128) {
        *self.balances.entry(*from).or_insert(0) -= amount;
        *self.balances.entry(*to).or_insert(0) += amount;
    }

    // Callers must have run ensure_balance.
    fn destroy(&mut self, from: &Address, amount: u128) {
        *self.balances.entry(*from).or_insert(0) -= amount;
        self.total_supply -= amount;
    }

    fn set_owner(&mut self, new_owner: Address) -> LedgerEvent {
        let previous_owner = self.owner;
        self.owner = new_owner;
        log::info!("Ownership transferred: {} -> {}", previous_owner, new_owner);

        self.emit(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    fn emit(&mut self, event: LedgerEvent) -> LedgerEvent {
        self.history.record(event).event.clone()
    }
}

fn ensure_sender(account: &Address) -> Result<(), LedgerError> {
    if account.is_zero() {
        return Err(LedgerError::InvalidSender(*account));
    }
    Ok(())
}

fn ensure_receiver(account: &Address) -> Result<(), LedgerError> {
    if account.is_zero() {
        return Err(LedgerError::InvalidReceiver(*account));
    }
    Ok(())
}
