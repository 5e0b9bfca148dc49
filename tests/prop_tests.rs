use proptest::prelude::*;

use trd_ledger::ledger::{Address, Ledger, LedgerConfig, LedgerError};

const ACCOUNTS: usize = 5;

/// One randomly generated ledger call
#[derive(Clone, Debug)]
enum Op {
    Transfer {
        caller: usize,
        to: usize,
        amount: u128,
    },
    Approve {
        caller: usize,
        spender: usize,
        amount: u128,
    },
    TransferFrom {
        caller: usize,
        from: usize,
        to: usize,
        amount: u128,
    },
    Burn {
        caller: usize,
        amount: u128,
    },
    BurnFrom {
        caller: usize,
        from: usize,
        amount: u128,
    },
    Mint {
        caller: usize,
        to: usize,
        amount: u128,
    },
    Deny {
        caller: usize,
        account: usize,
    },
    Allow {
        caller: usize,
        account: usize,
    },
    Retrieve {
        caller: usize,
        from: usize,
        to: usize,
        amount: u128,
    },
}

fn accounts() -> Vec<Address> {
    (0..ACCOUNTS)
        .map(|i| Address::from_label(&format!("account-{}", i)))
        .collect()
}

/// Account 0 owns the ledger; accounts 1 and 2 receive the genesis supply.
fn small_ledger(accounts: &[Address]) -> Ledger {
    let mut config = LedgerConfig::trd(accounts[0], accounts[1], accounts[2]);
    config.decimals = 0;
    config.allocations[0].amount = 1_000;
    config.allocations[1].amount = 500;
    Ledger::new(config).unwrap()
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0..ACCOUNTS;
    let amount = 0u128..1_500;
    prop_oneof![
        (idx.clone(), idx.clone(), amount.clone()).prop_map(|(caller, to, amount)| {
            Op::Transfer { caller, to, amount }
        }),
        (idx.clone(), idx.clone(), amount.clone()).prop_map(|(caller, spender, amount)| {
            Op::Approve {
                caller,
                spender,
                amount,
            }
        }),
        (idx.clone(), idx.clone(), idx.clone(), amount.clone()).prop_map(
            |(caller, from, to, amount)| Op::TransferFrom {
                caller,
                from,
                to,
                amount,
            }
        ),
        (idx.clone(), amount.clone()).prop_map(|(caller, amount)| Op::Burn { caller, amount }),
        (idx.clone(), idx.clone(), amount.clone()).prop_map(|(caller, from, amount)| {
            Op::BurnFrom {
                caller,
                from,
                amount,
            }
        }),
        (0..2usize, idx.clone(), amount.clone()).prop_map(|(caller, to, amount)| {
            Op::Mint { caller, to, amount }
        }),
        (0..2usize, idx.clone()).prop_map(|(caller, account)| Op::Deny { caller, account }),
        (0..2usize, idx.clone()).prop_map(|(caller, account)| Op::Allow { caller, account }),
        (0..2usize, idx.clone(), idx, amount).prop_map(|(caller, from, to, amount)| {
            Op::Retrieve {
                caller,
                from,
                to,
                amount,
            }
        }),
    ]
}

fn apply(ledger: &mut Ledger, a: &[Address], op: &Op) -> Result<(), LedgerError> {
    match *op {
        Op::Transfer { caller, to, amount } => ledger.transfer(&a[caller], &a[to], amount),
        Op::Approve {
            caller,
            spender,
            amount,
        } => ledger.approve(&a[caller], &a[spender], amount),
        Op::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => ledger.transfer_from(&a[caller], &a[from], &a[to], amount),
        Op::Burn { caller, amount } => ledger.burn(&a[caller], amount),
        Op::BurnFrom {
            caller,
            from,
            amount,
        } => ledger.burn_from(&a[caller], &a[from], amount),
        Op::Mint { caller, to, amount } => ledger.mint(&a[caller], &a[to], amount),
        Op::Deny { caller, account } => ledger.add_to_denylist(&a[caller], &a[account]),
        Op::Allow { caller, account } => ledger.remove_from_denylist(&a[caller], &a[account]),
        Op::Retrieve {
            caller,
            from,
            to,
            amount,
        } => ledger.retrieve_from_denylist(&a[caller], &a[from], &a[to], amount),
    }
    .map(|_| ())
}

/// Balances, allowances and denylist flags for every account pair
fn observe(ledger: &Ledger, a: &[Address]) -> (u128, Vec<u128>, Vec<u128>, Vec<bool>) {
    let balances = a.iter().map(|x| ledger.balance_of(x)).collect();
    let allowances = a
        .iter()
        .flat_map(|o| a.iter().map(move |s| (o, s)))
        .map(|(o, s)| ledger.allowance(o, s))
        .collect();
    let denied = a.iter().map(|x| ledger.is_denylisted(x)).collect();
    (ledger.total_supply(), balances, allowances, denied)
}

proptest! {
    /// Total supply equals the sum of balances after every call.
    #[test]
    fn supply_is_conserved(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let a = accounts();
        let mut ledger = small_ledger(&a);

        for op in &ops {
            let _ = apply(&mut ledger, &a, op);
            let sum: u128 = a.iter().map(|x| ledger.balance_of(x)).sum();
            prop_assert_eq!(sum, ledger.total_supply());
            prop_assert!(ledger.verify_supply());
        }
    }

    /// A rejected call changes nothing and records no event.
    #[test]
    fn rejections_have_no_effect(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let a = accounts();
        let mut ledger = small_ledger(&a);

        for op in &ops {
            let before = observe(&ledger, &a);
            let events_before = ledger.history().last().map(|r| r.sequence);

            if apply(&mut ledger, &a, op).is_err() {
                prop_assert_eq!(observe(&ledger, &a), before);
                prop_assert_eq!(ledger.history().last().map(|r| r.sequence), events_before);
            }
        }
    }

    /// With caller, from and to all denylisted, transfer_from always blames the caller.
    #[test]
    fn caller_is_checked_first(
        caller in 1..ACCOUNTS,
        from in 1..ACCOUNTS,
        to in 1..ACCOUNTS,
        amount in 0u128..2_000,
    ) {
        let a = accounts();
        let mut ledger = small_ledger(&a);
        for account in [caller, from, to] {
            ledger.add_to_denylist(&a[0], &a[account]).unwrap();
        }

        prop_assert_eq!(
            ledger.transfer_from(&a[caller], &a[from], &a[to], amount),
            Err(LedgerError::CallerDenylisted(a[caller]))
        );
    }

    /// Denylisting then un-denylisting restores transfer behaviour exactly.
    #[test]
    fn denylist_is_reversible(
        account in 1..ACCOUNTS,
        ops in prop::collection::vec(op_strategy(), 0..20),
    ) {
        let a = accounts();
        let mut plain = small_ledger(&a);
        let mut toggled = small_ledger(&a);

        toggled.add_to_denylist(&a[0], &a[account]).unwrap();
        toggled.remove_from_denylist(&a[0], &a[account]).unwrap();

        for op in &ops {
            let r1 = apply(&mut plain, &a, op);
            let r2 = apply(&mut toggled, &a, op);
            prop_assert_eq!(r1, r2);
        }
        prop_assert_eq!(observe(&plain, &a), observe(&toggled, &a));
    }
}
