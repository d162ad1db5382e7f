//! Reward Distributor
//!
//! Turns an oracle report into fee shares and a new external value.
//!
//! ## Fee Formula
//!
//! ```text
//! growth     = reported - expected_principal
//! fee_value  = growth * bp / 1000
//! fee_shares = floor(growth * bp * S / (T * 1000 - growth * bp))
//! ```
//!
//! `S` is total shares before the mint and `T` is the total pooled value once
//! the report is adopted. Minting `fee_shares` dilutes every holder so that
//! the recipient ends up owning `fee_value` (within one unit of truncation).
//!
//! Fee shares are minted before the tracker adopts the report. Every checked
//! sum is computed up front, so once the mint succeeds the adoption cannot
//! fail.

use rpool_common::{
    constants::fees::{FEE_DENOMINATOR, FEE_VALUE_PRECISION},
    safe_add, Address, FeeConfig, FixedPointDecimal, PoolResult,
};
use tracing::{debug, info, warn};

use crate::ledger::ShareLedger;
use crate::tracker::PooledValueTracker;

/// What a single report did to the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardOutcome {
    /// `reported - expected_principal`, may be negative
    pub growth: FixedPointDecimal,
    /// Value owed to the fee recipient, 3 fractional digits
    pub fee_value: FixedPointDecimal,
    /// Shares minted to the fee recipient
    pub fee_shares: u128,
    /// Total pooled value after the report
    pub new_total: u128,
}

/// Fee policy applied to oracle reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDistributor {
    fee: FeeConfig,
    fee_recipient: Address,
}

impl RewardDistributor {
    pub fn new(fee: FeeConfig, fee_recipient: Address) -> Self {
        Self { fee, fee_recipient }
    }

    pub fn fee(&self) -> FeeConfig {
        self.fee
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    /// Mint fee shares for positive growth, then adopt the report
    ///
    /// `pending_principal` is released value the report does not cover yet;
    /// it stays in the external half alongside the reported figure.
    pub fn apply_oracle_report(
        &self,
        ledger: &mut ShareLedger,
        tracker: &mut PooledValueTracker,
        reported_external_value: u128,
        expected_principal: u128,
        pending_principal: u128,
    ) -> PoolResult<RewardOutcome> {
        let adopted = safe_add(reported_external_value, pending_principal)?;
        let new_total = safe_add(tracker.buffered(), adopted)?;

        let growth = FixedPointDecimal::from(reported_external_value)
            - FixedPointDecimal::from(expected_principal);
        let bp = FixedPointDecimal::from(u64::from(self.fee.fee_rate_basis_points));

        // growth * bp is the fee value scaled by 1000, i.e. exactly the
        // scaled integer at 3 fractional digits
        let fee_value = if growth.is_positive() {
            let scaled_fee = growth.mul(&bp);
            FixedPointDecimal::from_scaled_integer(scaled_fee.scaled_value().clone(), FEE_VALUE_PRECISION)
        } else {
            FixedPointDecimal::zero(FEE_VALUE_PRECISION)
        };

        let fee_shares = if fee_value.is_positive() {
            self.fee_shares(ledger.total_shares(), new_total, &growth, &bp)?
        } else {
            debug!(growth = %growth, "report: no positive growth, no fee");
            0
        };

        ledger.mint(&self.fee_recipient, fee_shares)?;
        tracker.report_external_value(adopted)?;

        info!(
            reported = reported_external_value,
            expected = expected_principal,
            growth = %growth,
            fee_value = %fee_value,
            fee_shares,
            new_total,
            "report: applied"
        );

        Ok(RewardOutcome {
            growth,
            fee_value,
            fee_shares,
            new_total,
        })
    }

    /// `floor(growth * bp * S / (T * 1000 - growth * bp))`, 0 when the
    /// denominator is not positive
    fn fee_shares(
        &self,
        total_shares: u128,
        new_total: u128,
        growth: &FixedPointDecimal,
        bp: &FixedPointDecimal,
    ) -> PoolResult<u128> {
        let scaled_fee = growth.mul(bp);
        let numerator = scaled_fee.mul(&FixedPointDecimal::from(total_shares));
        let denominator = FixedPointDecimal::from(new_total)
            .mul(&FixedPointDecimal::from(u64::from(FEE_DENOMINATOR)))
            - scaled_fee;

        if !denominator.is_positive() {
            // Fee would claim the whole pool
            warn!(
                growth = %growth,
                new_total,
                "report: fee denominator not positive, fee skipped"
            );
            return Ok(0);
        }

        numerator.checked_div(&denominator)?.to_u128()
    }
}
