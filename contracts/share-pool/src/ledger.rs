//! Share Ledger
//!
//! Owner -> share balance bookkeeping plus a running total. The ledger has
//! no notion of value; converting shares to value is the rate engine's job.
//!
//! Invariant: the sum of all balances equals `total_shares` after every
//! operation, including failed ones.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use rpool_common::{safe_add, Address, PoolError, PoolResult};

/// Share balances and total supply
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ShareLedger {
    /// Non-zero balances only; a zero balance is indistinguishable from none
    balances: BTreeMap<Address, u128>,
    total_shares: u128,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares held by `owner` (0 if unknown)
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Credit `amount` shares to `owner`
    ///
    /// Both new values are computed before either is written, so an
    /// overflow leaves the ledger untouched.
    pub fn mint(&mut self, owner: &Address, amount: u128) -> PoolResult<()> {
        let new_total = safe_add(self.total_shares, amount)?;
        let new_balance = safe_add(self.balance_of(owner), amount)?;

        if new_balance > 0 {
            self.balances.insert(*owner, new_balance);
        }
        self.total_shares = new_total;
        Ok(())
    }

    /// Debit `amount` shares from `owner`
    pub fn burn(&mut self, owner: &Address, amount: u128) -> PoolResult<()> {
        let balance = self.balance_of(owner);
        if amount > balance {
            return Err(PoolError::InsufficientShares {
                available: balance,
                requested: amount,
            });
        }

        let remaining = balance - amount;
        if remaining == 0 {
            self.balances.remove(owner);
        } else {
            self.balances.insert(*owner, remaining);
        }
        // amount <= balance <= total_shares
        self.total_shares -= amount;
        Ok(())
    }

    /// Non-zero holders in identity order
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Recompute the balance sum and compare it to the running total
    pub fn is_conserved(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |sum, balance| sum.checked_add(*balance))
            == Some(self.total_shares)
    }
}
