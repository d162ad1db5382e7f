//! Deposit Batcher
//!
//! Releases buffered value to the external staking facility, but only in
//! whole multiples of the unit size:
//!
//! ```text
//! available = buffered / unit_size
//! count     = min(available, max_units)
//! ```
//!
//! ## Commit Before Call-Out
//!
//! The tracker is updated before the facility sees anything. The facility
//! is handed a [`ReleasedBatch`], which only the tracker can construct, so
//! there is no way to reach [`StakeSink::accept`] with an uncommitted
//! release. A sink that calls back into the pool observes the reduced
//! buffer. It may deposit and withdraw, but it cannot flush or report
//! until the outer flush returns.

use rpool_common::{PoolResult, UnitSize};
use tracing::debug;

use crate::tracker::PooledValueTracker;
use crate::SharePool;

/// Proof that `units` whole units were moved out of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasedBatch {
    units: u64,
    unit_size: UnitSize,
    amount: u128,
}

impl ReleasedBatch {
    pub(crate) fn new(units: u64, unit_size: UnitSize, amount: u128) -> Self {
        Self { units, unit_size, amount }
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn unit_size(&self) -> UnitSize {
        self.unit_size
    }

    /// `units * unit_size`
    pub fn amount(&self) -> u128 {
        self.amount
    }
}

/// The external facility that takes released units
///
/// `pool` is the same pool that released the batch, already committed. An
/// `Err` returns this batch's units to the buffer; anything else the sink
/// did through `pool` stands.
pub trait StakeSink {
    fn accept(&mut self, batch: ReleasedBatch, pool: &mut SharePool) -> Result<(), String>;
}

/// Sink that accepts everything and remembers what it got
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    batches: Vec<ReleasedBatch>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[ReleasedBatch] {
        &self.batches
    }

    pub fn total_units(&self) -> u64 {
        self.batches.iter().map(ReleasedBatch::units).sum()
    }

    pub fn total_amount(&self) -> u128 {
        self.batches.iter().map(ReleasedBatch::amount).sum()
    }
}

impl StakeSink for RecordingSink {
    fn accept(&mut self, batch: ReleasedBatch, _pool: &mut SharePool) -> Result<(), String> {
        self.batches.push(batch);
        Ok(())
    }
}

/// Whole-unit release policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositBatcher {
    unit_size: UnitSize,
}

impl DepositBatcher {
    pub fn new(unit_size: UnitSize) -> Self {
        Self { unit_size }
    }

    pub fn unit_size(&self) -> UnitSize {
        self.unit_size
    }

    /// Units that a flush with no cap would release right now
    pub fn available_units(&self, tracker: &PooledValueTracker) -> u64 {
        let units = tracker.buffered() / self.unit_size.get();
        u64::try_from(units).unwrap_or(u64::MAX)
    }

    /// Commit the release of up to `max_units` whole units
    ///
    /// Returns `None` when nothing is eligible, leaving the tracker as it was.
    pub fn flush(
        &self,
        tracker: &mut PooledValueTracker,
        max_units: u64,
    ) -> PoolResult<Option<ReleasedBatch>> {
        let count = self.available_units(tracker).min(max_units);
        if count == 0 {
            debug!(buffered = tracker.buffered(), max_units, "flush: nothing eligible");
            return Ok(None);
        }

        let batch = tracker.release_units(count, self.unit_size)?;
        debug!(
            units = batch.units(),
            amount = batch.amount(),
            buffered = tracker.buffered(),
            "flush: units released"
        );
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher() -> DepositBatcher {
        DepositBatcher::new(UnitSize::new(32).unwrap())
    }

    fn tracker_with(buffered: u128) -> PooledValueTracker {
        let mut tracker = PooledValueTracker::new();
        tracker.buffer_value(buffered).unwrap();
        tracker
    }

    #[test]
    fn test_flush_whole_units_only() {
        let mut tracker = tracker_with(100);
        let batch = batcher().flush(&mut tracker, 10).unwrap().unwrap();

        assert_eq!(batch.units(), 3);
        assert_eq!(batch.amount(), 96);
        assert_eq!(tracker.buffered(), 4);
        assert_eq!(tracker.total_pooled_value(), 100);
    }

    #[test]
    fn test_flush_respects_max_units() {
        let mut tracker = tracker_with(320);
        let batch = batcher().flush(&mut tracker, 4).unwrap().unwrap();

        assert_eq!(batch.units(), 4);
        assert_eq!(tracker.buffered(), 192);
        assert_eq!(batcher().available_units(&tracker), 6);
    }

    #[test]
    fn test_flush_below_one_unit_is_noop() {
        let mut tracker = tracker_with(31);
        assert!(batcher().flush(&mut tracker, 10).unwrap().is_none());
        assert_eq!(tracker.buffered(), 31);
        assert_eq!(tracker.released_units(), 0);
    }

    #[test]
    fn test_flush_zero_cap_is_noop() {
        let mut tracker = tracker_with(64);
        assert!(batcher().flush(&mut tracker, 0).unwrap().is_none());
        assert_eq!(tracker.buffered(), 64);
    }
}
