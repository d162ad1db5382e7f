//! Property-based tests for pool invariants under random operation sequences.

use proptest::prelude::*;
use rpool_common::PoolConfig;
use rpool_share_pool::{RecordingSink, SharePool};

#[derive(Debug, Clone)]
enum Op {
    Submit { who: u8, value: u128 },
    Withdraw { who: u8, shares: u128 },
    Flush { max_units: u64 },
    Report { extra_units: u64, balance_pct: u128 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 1u128..1_000_000).prop_map(|(who, value)| Op::Submit { who, value }),
        (0u8..4, 1u128..1_000_000).prop_map(|(who, shares)| Op::Withdraw { who, shares }),
        (0u64..8).prop_map(|max_units| Op::Flush { max_units }),
        (0u64..3, 50u128..150).prop_map(|(extra_units, balance_pct)| Op::Report {
            extra_units,
            balance_pct,
        }),
    ]
}

const FEE_RECIPIENT: [u8; 32] = [0xFE; 32];

fn owner(who: u8) -> [u8; 32] {
    [who + 1; 32]
}

fn apply(pool: &mut SharePool, op: &Op) {
    // Rejections are part of the exercise; only their atomicity is checked
    let before = pool.clone();
    let result = match *op {
        Op::Submit { who, value } => pool.submit(&owner(who), value).map(|_| ()),
        Op::Withdraw { who, shares } => pool.withdraw(&owner(who), shares).map(|_| ()),
        Op::Flush { max_units } => pool.flush_buffer(max_units, &mut RecordingSink::new()),
        Op::Report { extra_units, balance_pct } => {
            let tracker = pool.tracker();
            let count = (tracker.reported_units() + extra_units).min(tracker.released_units());
            let principal = pool.unit_size().get() * count as u128;
            pool.report_external_state(count, principal * balance_pct / 100)
                .map(|_| ())
        }
    };
    if result.is_err() {
        assert_eq!(*pool, before, "failed {op:?} changed state");
    }
}

proptest! {
    #[test]
    fn balances_always_sum_to_total(ops in prop::collection::vec(op(), 1..40), fee in 0u16..=1000) {
        let mut pool = SharePool::new(PoolConfig::new(10_000, fee, [0xFE; 32]).unwrap()).unwrap();
        for op in &ops {
            apply(&mut pool, op);
            prop_assert!(pool.ledger().is_conserved());
            let tracker = pool.tracker();
            prop_assert_eq!(tracker.buffered() + tracker.external(), pool.total_supply());
        }
    }

    #[test]
    fn flush_never_moves_values(ops in prop::collection::vec(op(), 1..30), max_units in 1u64..10) {
        let mut pool = SharePool::new(PoolConfig::new(10_000, 100, [0xFE; 32]).unwrap()).unwrap();
        for op in &ops {
            apply(&mut pool, op);
        }
        if pool.total_shares() == 0 {
            return Ok(());
        }

        let owners: Vec<_> = (0..4).map(owner).collect();
        let values_before: Vec<_> = owners.iter().map(|o| pool.value_of(o).unwrap()).collect();
        let total_before = pool.total_supply();

        pool.flush_buffer(max_units, &mut RecordingSink::new()).unwrap();

        let values_after: Vec<_> = owners.iter().map(|o| pool.value_of(o).unwrap()).collect();
        prop_assert_eq!(total_before, pool.total_supply());
        prop_assert_eq!(values_before, values_after);
    }

    #[test]
    fn first_deposit_is_one_to_one(value in 1u128..u64::MAX as u128) {
        let mut pool = SharePool::new(PoolConfig::new(32, 10, [0xFE; 32]).unwrap()).unwrap();
        prop_assert_eq!(pool.submit(&owner(0), value).unwrap(), value);
    }

    #[test]
    fn withdraw_never_pays_more_than_deposited(value in 1u128..1_000_000_000, shares_pct in 1u128..=100) {
        let mut pool = SharePool::new(PoolConfig::new(32, 0, [0xFE; 32]).unwrap()).unwrap();
        pool.submit(&owner(0), 12_345).unwrap();
        let minted = pool.submit(&owner(1), value).unwrap();

        let burn = (minted * shares_pct / 100).max(1);
        let paid = pool.withdraw(&owner(1), burn).unwrap();
        prop_assert!(paid <= value);
    }

    #[test]
    fn fee_dilutes_holders_proportionally(
        deposits in prop::collection::vec(1u128..=1_000_000_000_000, 2..6),
        growth_bps in 0u128..5_000,
        fee in 0u16..=1000,
    ) {
        let mut config = PoolConfig::new(1, fee, FEE_RECIPIENT).unwrap();
        config.max_units_per_flush = u64::MAX;
        let mut pool = SharePool::new(config).unwrap();

        for (who, value) in deposits.iter().enumerate() {
            pool.submit(&owner(who as u8), *value).unwrap();
        }
        pool.flush_buffer(u64::MAX, &mut RecordingSink::new()).unwrap();

        let principal: u128 = deposits.iter().sum();
        let growth = principal * growth_bps / 10_000;
        let before: Vec<u128> = (0..deposits.len())
            .map(|who| pool.value_of(&owner(who as u8)).unwrap())
            .collect();

        pool.report_external_state(principal as u64, principal + growth).unwrap();

        let after: Vec<u128> = (0..deposits.len())
            .map(|who| pool.value_of(&owner(who as u8)).unwrap())
            .collect();

        // Each value is floored once, so cross products differ by less than
        // the larger pre-report value
        for i in 0..before.len() {
            for j in (i + 1)..before.len() {
                let lhs = after[i] * before[j];
                let rhs = after[j] * before[i];
                prop_assert!(lhs.abs_diff(rhs) <= before[i].max(before[j]));
            }
        }

        // Fee value in thousandths; the recipient is never overpaid and
        // falls short by less than one share's worth plus one unit
        let fee_milli = growth * u128::from(fee);
        let received_milli = pool.value_of(&FEE_RECIPIENT).unwrap() * 1000;
        prop_assert!(received_milli <= fee_milli);
        let shortfall_milli = fee_milli - received_milli;
        prop_assert!(
            shortfall_milli * pool.total_shares() < (pool.total_supply() + pool.total_shares()) * 1000
        );
        prop_assert!(pool.ledger().is_conserved());
    }
}
