//! TRD Ledger CLI Application
//!
//! A command-line interface for operating a denylist-gated token ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trd_ledger::api::{create_router, ApiState};
use trd_ledger::cli::{self, AppState};
use trd_ledger::ledger::{Address, LedgerConfig};
use trd_ledger::storage::{Storage, StorageConfig};

#[derive(Parser)]
#[command(name = "trd")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A denylist-gated fungible token ledger", long_about = None)]
struct Cli {
    /// Data directory for the ledger snapshot
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger
    Init {
        /// Genesis config file (JSON); overrides the TRD defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Owner address
        #[arg(long, required_unless_present = "config")]
        owner: Option<Address>,

        /// First genesis holder (12.2bn TRD)
        #[arg(long, required_unless_present = "config")]
        first: Option<Address>,

        /// Second genesis holder (7.8bn TRD)
        #[arg(long, required_unless_present = "config")]
        second: Option<Address>,

        /// Replace an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Display ledger information
    Info,

    /// Show an account balance
    Balance {
        #[arg(short, long)]
        address: Address,
    },

    /// Show an allowance
    Allowance {
        /// Account that granted the allowance
        #[arg(short, long)]
        owner: Address,

        /// Account allowed to spend
        #[arg(short, long)]
        spender: Address,
    },

    /// Transfer from the caller's balance
    Transfer {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        to: Address,

        /// Amount in base units
        #[arg(short, long)]
        amount: u128,
    },

    /// Set the allowance of a spender
    Approve {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        spender: Address,

        /// Amount in base units (0 revokes)
        #[arg(short, long)]
        amount: u128,
    },

    /// Transfer on behalf of another account
    TransferFrom {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        from: Address,

        #[arg(short, long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Burn the caller's own funds
    Burn {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Burn another account's funds using an allowance
    BurnFrom {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        from: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Mint new funds (owner only)
    Mint {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Denylist operations
    Denylist {
        #[command(subcommand)]
        action: DenylistCommands,
    },

    /// List accounts with a positive balance
    Holders,

    /// Move funds out of a denylisted account (owner only)
    Retrieve {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        from: Address,

        #[arg(short, long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Ownership operations
    Ownership {
        #[command(subcommand)]
        action: OwnershipCommands,
    },

    /// Show recent events
    History {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Account helpers
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Snapshot backups
    Backup {
        #[command(subcommand)]
        action: BackupCommands,
    },

    /// Export the ledger to a file
    Export {
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a ledger from a file
    Import {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum DenylistCommands {
    /// Add an account (owner only)
    Add {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        account: Address,
    },

    /// Remove an account (owner only)
    Remove {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        account: Address,
    },

    /// Check whether an account is denylisted
    Check {
        #[arg(short, long)]
        account: Address,
    },

    /// List denylisted accounts
    List,
}

#[derive(Subcommand)]
enum OwnershipCommands {
    /// Hand ownership to another account
    Transfer {
        #[arg(short, long)]
        caller: Address,

        #[arg(short, long)]
        new_owner: Address,
    },

    /// Give up ownership for good
    Renounce {
        #[arg(short, long)]
        caller: Address,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// List available backups
    List,

    /// Replace the ledger with a backup
    Restore {
        /// Backup index (0 is the most recent)
        #[arg(short, long)]
        index: usize,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Generate an address (random, or derived from a label)
    New {
        #[arg(short, long)]
        label: Option<String>,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a loaded ledger
    match &cli.command {
        Commands::Init {
            config,
            owner,
            first,
            second,
            force,
        } => {
            let genesis = match (config, owner, first, second) {
                (Some(path), _, _, _) => LedgerConfig::from_file(path)?,
                (None, Some(owner), Some(first), Some(second)) => {
                    LedgerConfig::trd(*owner, *first, *second)
                }
                _ => return Err("init needs --config or --owner, --first and --second".into()),
            };
            return cli::cmd_init(&cli.data_dir, genesis, *force);
        }
        Commands::Account {
            action: AccountCommands::New { label },
        } => {
            cli::cmd_account_new(label.as_deref())?;
            return Ok(());
        }
        Commands::Api {
            action: ApiCommands::Start { port },
        } => {
            return run_api_server(*port, &cli.data_dir);
        }
        _ => {}
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Account { .. } | Commands::Api { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Balance { address } => cli::cmd_balance(&state, &address)?,

        Commands::Allowance { owner, spender } => cli::cmd_allowance(&state, &owner, &spender)?,

        Commands::Transfer { caller, to, amount } => {
            cli::cmd_transfer(&mut state, &caller, &to, amount)?;
        }

        Commands::Approve {
            caller,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &caller, &spender, amount)?;
        }

        Commands::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &caller, &from, &to, amount)?;
        }

        Commands::Burn { caller, amount } => {
            cli::cmd_burn(&mut state, &caller, amount)?;
        }

        Commands::BurnFrom {
            caller,
            from,
            amount,
        } => {
            cli::cmd_burn_from(&mut state, &caller, &from, amount)?;
        }

        Commands::Mint { caller, to, amount } => {
            cli::cmd_mint(&mut state, &caller, &to, amount)?;
        }

        Commands::Denylist { action } => match action {
            DenylistCommands::Add { caller, account } => {
                cli::cmd_denylist_add(&mut state, &caller, &account)?;
            }
            DenylistCommands::Remove { caller, account } => {
                cli::cmd_denylist_remove(&mut state, &caller, &account)?;
            }
            DenylistCommands::Check { account } => {
                cli::cmd_denylist_check(&state, &account)?;
            }
            DenylistCommands::List => {
                cli::cmd_denylist_list(&state)?;
            }
        },

        Commands::Holders => cli::cmd_holders(&state)?,

        Commands::Retrieve {
            caller,
            from,
            to,
            amount,
        } => {
            cli::cmd_retrieve(&mut state, &caller, &from, &to, amount)?;
        }

        Commands::Ownership { action } => match action {
            OwnershipCommands::Transfer { caller, new_owner } => {
                cli::cmd_ownership_transfer(&mut state, &caller, &new_owner)?;
            }
            OwnershipCommands::Renounce { caller } => {
                cli::cmd_ownership_renounce(&mut state, &caller)?;
            }
        },

        Commands::History { count } => cli::cmd_history(&state, count)?,

        Commands::Backup { action } => match action {
            BackupCommands::List => cli::cmd_backup_list(&state)?,
            BackupCommands::Restore { index } => cli::cmd_backup_restore(&mut state, index)?,
        },

        Commands::Export { output } => cli::cmd_export(&state, &output)?,

        Commands::Import { input } => cli::cmd_import(&mut state, &input)?,
    }

    Ok(())
}

fn run_api_server(port: u16, data_dir: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let storage = Storage::new(StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        })?;

        if !storage.exists() {
            return Err(format!(
                "No ledger found at {:?}. Create one with: trd init",
                data_dir
            )
            .into());
        }

        println!("📂 Loading ledger...");
        let ledger = storage.load()?;
        let state = ApiState::new(ledger, storage);
        let shutdown_state = state.clone();

        let app = create_router(state);
        let addr = format!("0.0.0.0:{}", port);
        println!("🚀 REST API server starting on http://localhost:{}", port);
        println!();
        println!("📖 Available endpoints:");
        println!("   GET  /health                        - Health check");
        println!("   GET  /ws                            - Event stream");
        println!("   GET  /api/ledger                    - Ledger info");
        println!("   GET  /api/balances/{{addr}}           - Balance");
        println!("   GET  /api/allowances?owner=&spender= - Allowance");
        println!("   GET  /api/holders                   - Holders");
        println!("   GET  /api/denylist                  - Denylisted accounts");
        println!("   GET  /api/history                   - Recent events");
        println!("   POST /api/transfer                  - Transfer");
        println!("   POST /api/approve                   - Approve");
        println!("   POST /api/transfer-from             - Delegated transfer");
        println!("   POST /api/burn                      - Burn");
        println!("   POST /api/burn-from                 - Delegated burn");
        println!("   POST /api/mint                      - Mint (owner)");
        println!("   POST /api/denylist/add              - Denylist (owner)");
        println!("   POST /api/denylist/remove           - Un-denylist (owner)");
        println!("   POST /api/retrieve                  - Retrieve (owner)");
        println!("   POST /api/ownership/transfer        - Transfer ownership (owner)");
        println!();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                println!("\n📴 Shutting down API server...");
            })
            .await?;

        println!("💾 Saving ledger...");
        let ledger = shutdown_state.ledger.read().await;
        shutdown_state.storage.save(&ledger)?;
        println!("✅ Ledger saved successfully!");

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
