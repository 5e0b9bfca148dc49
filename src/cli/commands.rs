//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface. Every mutating
//! command loads the snapshot, applies one operation and saves it back.

use crate::ledger::{Address, Ledger, LedgerConfig, LedgerError, LedgerEvent};
use crate::storage::{Storage, StorageConfig};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub ledger: Ledger,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the ledger snapshot from the data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found at {:?}. Create one with: trd init",
                data_dir
            )
            .into());
        }

        let ledger = storage.load()?;

        Ok(Self {
            ledger,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.ledger)?;
        Ok(())
    }

    /// Apply one ledger operation, report its event and persist the result
    pub fn apply<F>(&mut self, operation: F) -> CliResult<LedgerEvent>
    where
        F: FnOnce(&mut Ledger) -> Result<LedgerEvent, LedgerError>,
    {
        let event = operation(&mut self.ledger)?;
        print_event(&event);
        self.save()?;
        Ok(event)
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Print an event in a human-readable form
pub fn print_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::Transfer { from, to, amount } if from.is_zero() => {
            println!("🪙  Minted {} to {}", amount, to);
        }
        LedgerEvent::Transfer { from, to, amount } if to.is_zero() => {
            println!("🔥 Burned {} from {}", amount, from);
        }
        LedgerEvent::Transfer { from, to, amount } => {
            println!("📤 Transfer {} -> {}: {}", from, to, amount);
        }
        LedgerEvent::Approval {
            owner,
            spender,
            amount,
        } => {
            println!("✍️  Approval {} -> {}: {}", owner, spender, amount);
        }
        LedgerEvent::AddedToDenylist { account } => {
            println!("⛔ Added to denylist: {}", account);
        }
        LedgerEvent::RemovedFromDenylist { account } => {
            println!("✅ Removed from denylist: {}", account);
        }
        LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        } => {
            println!("👑 Ownership {} -> {}", previous_owner, new_owner);
        }
    }
}

/// Create a new ledger from a genesis config
pub fn cmd_init(data_dir: &Path, config: LedgerConfig, force: bool) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will replace existing data)");
        return Ok(());
    }

    let ledger = Ledger::new(config)?;
    storage.save(&ledger)?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🏷️  {} ({})", ledger.name(), ledger.symbol());
    println!("   👑 Owner: {}", ledger.owner());
    println!("   💰 Total supply: {}", ledger.total_supply());

    Ok(())
}

/// Display ledger info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let ledger = &state.ledger;

    println!("📒 Ledger Info");
    println!("   ├─ Name: {}", ledger.name());
    println!("   ├─ Symbol: {}", ledger.symbol());
    println!("   ├─ Decimals: {}", ledger.decimals());
    println!("   ├─ Created: {}", ledger.metadata().created_at);
    println!("   ├─ Owner: {}", ledger.owner());
    println!("   ├─ Total supply: {}", ledger.total_supply());
    println!("   ├─ Holders: {}", ledger.holder_count());
    println!("   ├─ Denylisted: {}", ledger.denylist().len());
    println!("   └─ Data directory: {:?}", state.data_dir);

    Ok(())
}

/// Show an account balance
pub fn cmd_balance(state: &AppState, account: &Address) -> CliResult<()> {
    println!("💰 Balance for {}", account);
    println!("   {}", state.ledger.balance_of(account));
    if state.ledger.is_denylisted(account) {
        println!("   ⛔ Account is denylisted");
    }
    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(state: &AppState, owner: &Address, spender: &Address) -> CliResult<()> {
    println!("✍️  Allowance {} -> {}", owner, spender);
    println!("   {}", state.ledger.allowance(owner, spender));
    Ok(())
}

/// Transfer from the caller
pub fn cmd_transfer(
    state: &mut AppState,
    caller: &Address,
    to: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.transfer(caller, to, amount))?;
    Ok(())
}

/// Set an allowance
pub fn cmd_approve(
    state: &mut AppState,
    caller: &Address,
    spender: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.approve(caller, spender, amount))?;
    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    caller: &Address,
    from: &Address,
    to: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.transfer_from(caller, from, to, amount))?;
    Ok(())
}

/// Burn the caller's own funds
pub fn cmd_burn(state: &mut AppState, caller: &Address, amount: u128) -> CliResult<()> {
    state.apply(|ledger| ledger.burn(caller, amount))?;
    Ok(())
}

/// Delegated burn
pub fn cmd_burn_from(
    state: &mut AppState,
    caller: &Address,
    from: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.burn_from(caller, from, amount))?;
    Ok(())
}

/// Mint new funds (owner only)
pub fn cmd_mint(
    state: &mut AppState,
    caller: &Address,
    to: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.mint(caller, to, amount))?;
    Ok(())
}

/// Add to the denylist (owner only)
pub fn cmd_denylist_add(
    state: &mut AppState,
    caller: &Address,
    account: &Address,
) -> CliResult<()> {
    state.apply(|ledger| ledger.add_to_denylist(caller, account))?;
    Ok(())
}

/// Remove from the denylist (owner only)
pub fn cmd_denylist_remove(
    state: &mut AppState,
    caller: &Address,
    account: &Address,
) -> CliResult<()> {
    state.apply(|ledger| ledger.remove_from_denylist(caller, account))?;
    Ok(())
}

/// Check denylist membership
pub fn cmd_denylist_check(state: &AppState, account: &Address) -> CliResult<()> {
    if state.ledger.is_denylisted(account) {
        println!("⛔ {} is denylisted", account);
    } else {
        println!("✅ {} is not denylisted", account);
    }
    Ok(())
}

/// List denylisted accounts
pub fn cmd_denylist_list(state: &AppState) -> CliResult<()> {
    let accounts = state.ledger.denylist().accounts();

    if accounts.is_empty() {
        println!("📭 Denylist is empty");
        return Ok(());
    }

    println!("⛔ Denylisted accounts ({}):", accounts.len());
    for account in accounts {
        println!("   {} - {}", account, state.ledger.balance_of(&account));
    }
    Ok(())
}

/// List every account with a positive balance
pub fn cmd_holders(state: &AppState) -> CliResult<()> {
    let holders = state.ledger.holders();

    println!("💰 Holders ({}):", holders.len());
    for (account, balance) in holders {
        let marker = if state.ledger.is_denylisted(&account) {
            " ⛔"
        } else {
            ""
        };
        println!("   {} - {}{}", account, balance, marker);
    }
    Ok(())
}

/// Move funds out of a denylisted account (owner only)
pub fn cmd_retrieve(
    state: &mut AppState,
    caller: &Address,
    from: &Address,
    to: &Address,
    amount: u128,
) -> CliResult<()> {
    state.apply(|ledger| ledger.retrieve_from_denylist(caller, from, to, amount))?;
    Ok(())
}

/// Transfer ownership (owner only)
pub fn cmd_ownership_transfer(
    state: &mut AppState,
    caller: &Address,
    new_owner: &Address,
) -> CliResult<()> {
    state.apply(|ledger| ledger.transfer_ownership(caller, new_owner))?;
    Ok(())
}

/// Renounce ownership (owner only)
pub fn cmd_ownership_renounce(state: &mut AppState, caller: &Address) -> CliResult<()> {
    state.apply(|ledger| ledger.renounce_ownership(caller))?;
    Ok(())
}

/// Show recent events
pub fn cmd_history(state: &AppState, count: usize) -> CliResult<()> {
    let records: Vec<_> = state.ledger.history().collect();
    let start = records.len().saturating_sub(count);

    println!("📜 Recent events:");
    for record in &records[start..] {
        print!(
            "   #{} {} ",
            record.sequence,
            record.recorded_at.format("%Y-%m-%d %H:%M:%S")
        );
        print_event(&record.event);
    }

    Ok(())
}

/// Generate an account address
pub fn cmd_account_new(label: Option<&str>) -> CliResult<Address> {
    let address = match label {
        Some(label) => Address::from_label(label),
        None => Address::random(),
    };

    println!("🔐 Account address: {}", address);
    if let Some(label) = label {
        println!("   🏷️  Derived from label: {}", label);
    }

    Ok(address)
}

/// Export the ledger to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.ledger, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import a ledger from a file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    state.ledger = crate::storage::load_from_file(path)?;
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!("   Total supply: {}", state.ledger.total_supply());
    Ok(())
}

/// List snapshot backups, newest first
pub fn cmd_backup_list(state: &AppState) -> CliResult<()> {
    let backups = state.storage.list_backups();

    if backups.is_empty() {
        println!("📭 No backups found");
        return Ok(());
    }

    println!("🗄️  Backups:");
    for index in backups {
        println!("   #{}", index);
    }
    Ok(())
}

/// Replace the current ledger with a backup
pub fn cmd_backup_restore(state: &mut AppState, index: usize) -> CliResult<()> {
    state.ledger = state.storage.restore_backup(index)?;
    state.save()?;

    println!("♻️  Restored backup #{}", index);
    println!("   Total supply: {}", state.ledger.total_supply());
    Ok(())
}
