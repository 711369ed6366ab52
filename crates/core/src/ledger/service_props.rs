//! Property-based tests for LedgerService.
//!
//! - Conservation: transfers never change the sum of balances, top-ups add exactly their amount
//! - Non-negativity: no sequence of operations drives a balance below zero
//! - Atomicity: a rejected transfer leaves every account untouched

use proptest::prelude::*;
use reelpay_shared::types::{AccountId, Coins, VideoId};

use super::error::LedgerError;
use super::policy::WalletPolicy;
use super::service::LedgerService;
use super::types::{AccountSnapshot, GiftRequest, Transfer, VideoInfo};

/// One randomly generated wallet operation over a fixed set of accounts.
#[derive(Debug, Clone)]
enum Op {
    TopUp { to: usize, amount: i64 },
    Gift { from: usize, to: usize, amount: i64 },
    Purchase { buyer: usize, owner: usize, price: i64 },
}

fn op_strategy(accounts: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..accounts, -100i64..12_000).prop_map(|(to, amount)| Op::TopUp { to, amount }),
        (0..accounts, 0..accounts, -10i64..2_000)
            .prop_map(|(from, to, amount)| Op::Gift { from, to, amount }),
        (0..accounts, 0..accounts, 0i64..1_000)
            .prop_map(|(buyer, owner, price)| Op::Purchase { buyer, owner, price }),
    ]
}

fn plan(policy: &WalletPolicy, accounts: &[AccountSnapshot], op: &Op) -> Result<Transfer, LedgerError> {
    match *op {
        Op::TopUp { to, amount } => LedgerService::plan_top_up(policy, accounts[to].id, amount),
        Op::Gift { from, to, amount } => LedgerService::plan_gift(
            policy,
            &GiftRequest {
                sender: accounts[from].id,
                recipient: accounts[to].id,
                amount,
                video_id: None,
                message: None,
            },
        ),
        Op::Purchase {
            buyer,
            owner,
            price,
        } => LedgerService::plan_purchase(
            accounts[buyer].id,
            &VideoInfo {
                id: VideoId::new(),
                owner_id: accounts[owner].id,
                price: Coins(price),
            },
        ),
    }
}

fn total(accounts: &[AccountSnapshot]) -> i64 {
    accounts.iter().map(|a| a.balance.value()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_supply_only_changes_by_top_ups(
        opening in prop::collection::vec(0i64..1_000, 2..5),
        ops in prop::collection::vec(op_strategy(4), 1..40),
    ) {
        let policy = WalletPolicy::default();
        let mut accounts: Vec<AccountSnapshot> = opening
            .iter()
            .map(|&b| AccountSnapshot {
                id: AccountId::new(),
                balance: Coins(b),
                total_earnings: Coins::ZERO,
            })
            .collect();
        let mut expected = total(&accounts);

        for op in &ops {
            let op = match *op {
                Op::TopUp { to, amount } => Op::TopUp { to: to % accounts.len(), amount },
                Op::Gift { from, to, amount } => Op::Gift {
                    from: from % accounts.len(),
                    to: to % accounts.len(),
                    amount,
                },
                Op::Purchase { buyer, owner, price } => Op::Purchase {
                    buyer: buyer % accounts.len(),
                    owner: owner % accounts.len(),
                    price,
                },
            };

            let Ok(transfer) = plan(&policy, &accounts, &op) else {
                continue;
            };
            let before = accounts.clone();
            match LedgerService::apply(&transfer, &mut accounts) {
                Ok(()) => expected += transfer.net_supply_change(),
                Err(_) => prop_assert_eq!(&accounts, &before),
            }

            prop_assert_eq!(total(&accounts), expected);
            prop_assert!(accounts.iter().all(|a| a.balance.value() >= 0));
        }
    }

    #[test]
    fn prop_gift_succeeds_iff_balance_covers(
        balance in 0i64..1_000,
        amount in 1i64..2_000,
    ) {
        let policy = WalletPolicy::default();
        let mut accounts = vec![
            AccountSnapshot { id: AccountId::new(), balance: Coins(balance), total_earnings: Coins::ZERO },
            AccountSnapshot::empty(AccountId::new()),
        ];
        let transfer = LedgerService::plan_gift(&policy, &GiftRequest {
            sender: accounts[0].id,
            recipient: accounts[1].id,
            amount,
            video_id: None,
            message: None,
        }).unwrap();

        let result = LedgerService::apply(&transfer, &mut accounts);
        if amount <= balance {
            prop_assert!(result.is_ok());
            prop_assert_eq!(accounts[0].balance, Coins(balance - amount));
            prop_assert_eq!(accounts[1].balance, Coins(amount));
            prop_assert_eq!(accounts[1].total_earnings, Coins(amount));
        } else {
            prop_assert_eq!(
                result,
                Err(LedgerError::InsufficientBalance { required: Coins(amount), available: Coins(balance) })
            );
            prop_assert_eq!(accounts[0].balance, Coins(balance));
            prop_assert_eq!(accounts[1].balance, Coins::ZERO);
        }
    }

    #[test]
    fn prop_top_up_range(amount in -20_000i64..20_000) {
        let policy = WalletPolicy::default();
        let result = LedgerService::plan_top_up(&policy, AccountId::new(), amount);
        prop_assert_eq!(result.is_ok(), (1..=10_000).contains(&amount));
    }
}
