//! Denylist-gated fungible token ledger
//!
//! Provides a single fungible asset with:
//! - Balances per address
//! - Allowances for delegated transfers and burns
//! - An owner-controlled denylist gating transfers and approvals
//! - Owner-only minting and retrieval of denylisted funds
//!
//! # Example
//!
//! ```rust
//! use trd_ledger::ledger::{Address, Ledger, LedgerConfig, LedgerError};
//!
//! let owner = Address::from_label("owner");
//! let alice = Address::from_label("alice");
//! let bob = Address::from_label("bob");
//!
//! let mut ledger = Ledger::new(LedgerConfig::trd(owner, alice, bob)).unwrap();
//!
//! // Move funds
//! ledger.transfer(&alice, &bob, 1000).unwrap();
//!
//! // Denylisted accounts cannot send
//! ledger.add_to_denylist(&owner, &alice).unwrap();
//! assert_eq!(
//!     ledger.transfer(&alice, &bob, 1000),
//!     Err(LedgerError::CallerDenylisted(alice))
//! );
//! ```

pub mod address;
pub mod config;
pub mod denylist;
pub mod error;
pub mod event;
pub mod ledger;

pub use address::{Address, AddressError};
pub use config::{to_base_units, Allocation, ConfigError, LedgerConfig};
pub use denylist::{Denylist, Role};
pub use error::LedgerError;
pub use event::{EventRecord, LedgerEvent, MAX_HISTORY};
pub use ledger::{Ledger, LedgerMetadata};
