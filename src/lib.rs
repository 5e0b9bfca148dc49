//! TRD Ledger: a denylist-gated fungible token ledger in Rust
//!
//! This crate provides a single-asset token ledger featuring:
//! - ERC-20 style balances, allowances and delegated transfers
//! - Holder burn and delegated burn
//! - An owner-controlled denylist gating transfers and approvals
//! - Owner-only minting and retrieval of denylisted funds
//! - JSON snapshot persistence with backups
//! - A CLI and a REST/WebSocket host
//!
//! # Example
//!
//! ```rust
//! use trd_ledger::ledger::{to_base_units, Address, Ledger, LedgerConfig};
//!
//! let owner = Address::from_label("owner");
//! let first = Address::from_label("first");
//! let second = Address::from_label("second");
//! let receiver = Address::from_label("receiver");
//!
//! let mut ledger = Ledger::new(LedgerConfig::trd(owner, first, second)).unwrap();
//! assert_eq!(ledger.total_supply(), to_base_units(20_000_000_000, 18));
//!
//! // Only the owner can mint
//! ledger.mint(&owner, &receiver, to_base_units(1_000_000_000, 18)).unwrap();
//! assert!(ledger.mint(&first, &receiver, 1).is_err());
//!
//! assert_eq!(ledger.total_supply(), to_base_units(21_000_000_000, 18));
//! ```

pub mod api;
pub mod cli;
pub mod ledger;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use ledger::{
    Address, Denylist, Ledger, LedgerConfig, LedgerError, LedgerEvent, LedgerMetadata,
};
pub use storage::{Storage, StorageConfig};
