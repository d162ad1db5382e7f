//! Pooled Value Tracker
//!
//! Holds the two halves of total pooled value:
//!
//! ```text
//! total_pooled_value = buffered + external
//!
//! buffered  - deposited, not yet released to the external facility
//! external  - released principal plus whatever the oracle last reported
//! ```
//!
//! Every mutation keeps `buffered + external` representable as `u128`, so
//! `total_pooled_value()` never overflows.

use borsh::{BorshDeserialize, BorshSerialize};
use rpool_common::{safe_add, PoolError, PoolResult, UnitSize};

use crate::batcher::ReleasedBatch;

/// Buffered / external value split plus release bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PooledValueTracker {
    buffered: u128,
    external: u128,
    /// Units handed to the facility since genesis
    released_units: u64,
    /// Units covered by the last adopted report
    reported_units: u64,
}

impl PooledValueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffered(&self) -> u128 {
        self.buffered
    }

    pub fn external(&self) -> u128 {
        self.external
    }

    pub fn released_units(&self) -> u64 {
        self.released_units
    }

    pub fn reported_units(&self) -> u64 {
        self.reported_units
    }

    pub fn total_pooled_value(&self) -> u128 {
        // Checked on every write
        self.buffered + self.external
    }

    /// Add deposited value to the buffer
    pub fn buffer_value(&mut self, amount: u128) -> PoolResult<()> {
        safe_add(self.total_pooled_value(), amount)?;
        self.buffered += amount;
        Ok(())
    }

    /// Move `count` whole units from buffered to external
    ///
    /// Total pooled value is unchanged. The returned batch is the only proof
    /// that the release was committed; the facility is handed that proof.
    pub fn release_units(&mut self, count: u64, unit_size: UnitSize) -> PoolResult<ReleasedBatch> {
        let amount = unit_size.value_of(count)?;
        if amount > self.buffered {
            return Err(PoolError::InsufficientBuffer {
                available: self.buffered,
                requested: amount,
            });
        }
        let released_units = self
            .released_units
            .checked_add(count)
            .ok_or(PoolError::Overflow)?;

        self.buffered -= amount;
        self.external += amount;
        self.released_units = released_units;

        Ok(ReleasedBatch::new(count, unit_size, amount))
    }

    /// Return a refused batch to the buffer
    ///
    /// Only valid while nothing but deposits and withdrawals happened since
    /// the release; total pooled value is unchanged.
    pub fn revert_release(&mut self, batch: &ReleasedBatch) -> PoolResult<()> {
        let external = self
            .external
            .checked_sub(batch.amount())
            .ok_or(PoolError::Underflow)?;
        let released_units = self
            .released_units
            .checked_sub(batch.units())
            .ok_or(PoolError::Underflow)?;

        self.external = external;
        self.buffered += batch.amount();
        self.released_units = released_units;
        Ok(())
    }

    /// Adopt an externally reported value, up or down
    ///
    /// Only fails if `buffered + new_value` would not fit in `u128`.
    pub fn report_external_value(&mut self, new_value: u128) -> PoolResult<()> {
        safe_add(self.buffered, new_value)?;
        self.external = new_value;
        Ok(())
    }

    /// Record how many released units the adopted report covers
    pub fn record_reported_units(&mut self, units: u64) {
        self.reported_units = units;
    }

    /// Released principal not yet covered by a report
    pub fn pending_principal(&self, unit_size: UnitSize) -> PoolResult<u128> {
        let pending_units = self
            .released_units
            .checked_sub(self.reported_units)
            .ok_or(PoolError::Underflow)?;
        unit_size.value_of(pending_units)
    }

    /// Pay out buffered value to a withdrawing holder
    pub fn withdraw_buffered(&mut self, amount: u128) -> PoolResult<()> {
        if amount > self.buffered {
            return Err(PoolError::InsufficientLiquidity {
                available: self.buffered,
                requested: amount,
            });
        }
        self.buffered -= amount;
        Ok(())
    }
}
