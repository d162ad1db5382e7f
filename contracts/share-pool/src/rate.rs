//! Exchange Rate Engine
//!
//! Converts between shares and value at the pool's current rate:
//!
//! ```text
//! shares = floor(value  * total_shares / total_pooled_value)
//! value  = floor(shares * total_pooled_value / total_shares)
//! ```
//!
//! Both directions truncate, so a round trip never pays out more than went
//! in. With no shares outstanding the first depositor gets 1:1.

use rpool_common::{
    constants::precision::RATE_PRECISION, mul_div_floor, FixedPointDecimal, PoolError,
    PoolResult,
};

use crate::ledger::ShareLedger;
use crate::tracker::PooledValueTracker;

/// Read-only view over ledger and tracker that prices shares
#[derive(Debug, Clone, Copy)]
pub struct ExchangeRateEngine<'a> {
    ledger: &'a ShareLedger,
    tracker: &'a PooledValueTracker,
}

impl<'a> ExchangeRateEngine<'a> {
    pub fn new(ledger: &'a ShareLedger, tracker: &'a PooledValueTracker) -> Self {
        Self { ledger, tracker }
    }

    /// Shares minted for `value` at the current rate
    ///
    /// Returns `value` unchanged when no shares exist, and also when shares
    /// exist but the pool holds no value: such a deposit sets a fresh 1:1
    /// basis instead of dividing by zero.
    pub fn value_to_shares(&self, value: u128) -> PoolResult<u128> {
        let total_shares = self.ledger.total_shares();
        let total_value = self.tracker.total_pooled_value();

        if total_shares == 0 || total_value == 0 {
            return Ok(value);
        }
        mul_div_floor(value, total_shares, total_value)
    }

    /// Value backing `shares` at the current rate
    ///
    /// # Errors
    /// - `DivisionByZero` if no shares exist
    pub fn shares_to_value(&self, shares: u128) -> PoolResult<u128> {
        let total_shares = self.ledger.total_shares();
        if total_shares == 0 {
            return Err(PoolError::DivisionByZero);
        }
        mul_div_floor(shares, self.tracker.total_pooled_value(), total_shares)
    }

    /// Value per share with 18 fractional digits (1 before any deposit)
    pub fn rate(&self) -> PoolResult<FixedPointDecimal> {
        let total_shares = self.ledger.total_shares();
        if total_shares == 0 {
            return FixedPointDecimal::from_integer(1u8, RATE_PRECISION);
        }

        FixedPointDecimal::from_integer(self.tracker.total_pooled_value(), RATE_PRECISION)?
            .checked_div(&FixedPointDecimal::from_integer(total_shares, RATE_PRECISION)?)
    }
}
