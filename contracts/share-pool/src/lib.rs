//! rpool Share Pool
//!
//! A rebasing pool: depositors receive shares, value is batched out to an
//! external staking facility in whole units, and oracle reports move the
//! value behind every share at once.
//!
//! ## Data Flow
//!
//! ```text
//! submit   -> ExchangeRateEngine -> ShareLedger::mint -> tracker.buffer_value
//! flush    -> DepositBatcher (commit) -> StakeSink::accept
//! report   -> RewardDistributor (mint fee shares) -> tracker adopts value
//! withdraw -> ExchangeRateEngine -> ShareLedger::burn -> tracker.withdraw_buffered
//! ```
//!
//! ## Atomicity
//!
//! Every operation either commits completely or returns an error with the
//! pool exactly as it was. The one exception is a refused flush: the batch
//! goes back to the buffer, but deposits and withdrawals the sink made
//! while handling it are kept. Authorization is the caller's concern; see the
//! `rpool-oracle` crate for the report access layer.

pub mod batcher;
pub mod ledger;
pub mod rate;
pub mod rewards;
pub mod shared;
pub mod snapshot;
pub mod tracker;


use rpool_common::{safe_add, Address, FixedPointDecimal, PoolConfig, PoolError, PoolResult, UnitSize};
use tracing::{debug, info, warn};

pub use batcher::{DepositBatcher, RecordingSink, ReleasedBatch, StakeSink};
pub use ledger::ShareLedger;
pub use rate::ExchangeRateEngine;
pub use rewards::{RewardDistributor, RewardOutcome};
pub use shared::SharedPool;
pub use snapshot::{HolderSnapshot, PoolSnapshot};
pub use tracker::PooledValueTracker;

// ============ Share Pool ============

/// Ledger and value state of one pool, mutated only through its operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePool {
    config: PoolConfig,
    ledger: ShareLedger,
    tracker: PooledValueTracker,
    batcher: DepositBatcher,
    distributor: RewardDistributor,
    paused: bool,
    /// Set while a stake sink is handling a batch
    flushing: bool,
}

impl SharePool {
    /// Empty pool; `config` is validated first
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        info!(
            unit_size = config.unit_size.get(),
            fee_bp = config.fee.fee_rate_basis_points,
            fee_recipient = %hex::encode(config.fee_recipient),
            "pool created"
        );

        Ok(Self {
            batcher: DepositBatcher::new(config.unit_size),
            distributor: RewardDistributor::new(config.fee, config.fee_recipient),
            ledger: ShareLedger::new(),
            tracker: PooledValueTracker::new(),
            paused: false,
            flushing: false,
            config,
        })
    }

    fn ensure_active(&self) -> PoolResult<()> {
        if self.paused {
            return Err(PoolError::PoolPaused);
        }
        Ok(())
    }

    fn ensure_not_flushing(&self) -> PoolResult<()> {
        if self.flushing {
            return Err(PoolError::FlushInProgress);
        }
        Ok(())
    }

    fn engine(&self) -> ExchangeRateEngine<'_> {
        ExchangeRateEngine::new(&self.ledger, &self.tracker)
    }

    // ============ Mutations ============

    /// Deposit `value` for `owner` and return the shares minted
    ///
    /// # Errors
    /// - `ZeroDeposit` if `value` is 0
    /// - `DepositTooSmall` if the current rate turns `value` into 0 shares
    /// - `Overflow` if total shares or total value would not fit
    pub fn submit(&mut self, owner: &Address, value: u128) -> PoolResult<u128> {
        self.ensure_active()?;
        if value == 0 {
            return Err(PoolError::ZeroDeposit);
        }

        let shares = self.engine().value_to_shares(value)?;
        if shares == 0 {
            return Err(PoolError::DepositTooSmall { value });
        }

        // buffer_value cannot fail once this passes
        safe_add(self.tracker.total_pooled_value(), value)?;
        self.ledger.mint(owner, shares)?;
        self.tracker.buffer_value(value)?;

        debug!(
            owner = %hex::encode(owner),
            value,
            shares,
            buffered = self.tracker.buffered(),
            "submit"
        );
        Ok(shares)
    }

    /// Burn `shares` from `owner` and return the value paid out
    ///
    /// Payouts come from the buffer only; value already released to the
    /// facility cannot be withdrawn until it comes back.
    ///
    /// # Errors
    /// - `InvalidInput` if `shares` is 0
    /// - `InsufficientShares` if `owner` holds fewer than `shares`
    /// - `InsufficientLiquidity` if the buffer cannot cover the value
    pub fn withdraw(&mut self, owner: &Address, shares: u128) -> PoolResult<u128> {
        self.ensure_active()?;
        if shares == 0 {
            return Err(PoolError::InvalidInput {
                param: "shares",
                reason: "must be non-zero",
            });
        }

        let balance = self.ledger.balance_of(owner);
        if shares > balance {
            return Err(PoolError::InsufficientShares {
                available: balance,
                requested: shares,
            });
        }

        let value = self.engine().shares_to_value(shares)?;
        if value > self.tracker.buffered() {
            return Err(PoolError::InsufficientLiquidity {
                available: self.tracker.buffered(),
                requested: value,
            });
        }

        self.ledger.burn(owner, shares)?;
        self.tracker.withdraw_buffered(value)?;

        debug!(owner = %hex::encode(owner), shares, value, "withdraw");
        Ok(value)
    }

    /// Release up to `max_units` whole units to `sink`
    ///
    /// The cap is further limited by `max_units_per_flush`. Nothing eligible
    /// is a no-op. The release is committed before `sink` runs, and `sink`
    /// may deposit into or withdraw from this pool. If `sink` refuses the
    /// batch, its units return to the buffer; the sink's own deposits and
    /// withdrawals stand.
    ///
    /// # Errors
    /// - `PoolPaused`
    /// - `FlushInProgress` if called from inside a sink
    /// - `SinkRejected` if `sink` returns an error
    pub fn flush_buffer<S>(&mut self, max_units: u64, sink: &mut S) -> PoolResult<()>
    where
        S: StakeSink + ?Sized,
    {
        self.ensure_active()?;
        self.ensure_not_flushing()?;

        let cap = max_units.min(self.config.max_units_per_flush);
        let Some(batch) = self.batcher.flush(&mut self.tracker, cap)? else {
            return Ok(());
        };

        self.flushing = true;
        let accepted = sink.accept(batch, self);
        self.flushing = false;

        match accepted {
            Ok(()) => {
                info!(
                    units = batch.units(),
                    amount = batch.amount(),
                    buffered = self.tracker.buffered(),
                    external = self.tracker.external(),
                    "flush: batch accepted"
                );
                Ok(())
            }
            Err(reason) => {
                // Only deposits and withdrawals can have run since the release
                self.tracker.revert_release(&batch)?;
                warn!(units = batch.units(), %reason, "flush: sink rejected batch, release reverted");
                Err(PoolError::SinkRejected {
                    units: batch.units(),
                    reason,
                })
            }
        }
    }

    /// Adopt the facility's reported balance for `validator_count` units
    ///
    /// The expected principal is `validator_count * unit_size`; growth over
    /// it is charged the protocol fee. Released units the report does not
    /// cover yet stay in the external value at principal.
    ///
    /// # Errors
    /// - `FlushInProgress` if called from inside a sink
    /// - `InvalidReport` if `validator_count` exceeds the released units or
    ///   falls below the previously reported count
    pub fn report_external_state(
        &mut self,
        validator_count: u64,
        reported_balance: u128,
    ) -> PoolResult<RewardOutcome> {
        self.ensure_not_flushing()?;

        let released = self.tracker.released_units();
        if validator_count > released {
            return Err(PoolError::InvalidReport {
                reason: "validator count exceeds released units",
            });
        }
        if validator_count < self.tracker.reported_units() {
            return Err(PoolError::InvalidReport {
                reason: "validator count below previous report",
            });
        }

        let unit_size = self.config.unit_size;
        let expected_principal = unit_size.value_of(validator_count)?;
        let pending_principal = unit_size.value_of(released - validator_count)?;

        let outcome = self.distributor.apply_oracle_report(
            &mut self.ledger,
            &mut self.tracker,
            reported_balance,
            expected_principal,
            pending_principal,
        )?;
        self.tracker.record_reported_units(validator_count);

        Ok(outcome)
    }

    /// Stop deposits, withdrawals and flushes; reports still apply
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!("pool paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!("pool resumed");
        }
    }

    // ============ Reads ============

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn unit_size(&self) -> UnitSize {
        self.config.unit_size
    }

    /// Total pooled value: buffered plus external
    pub fn total_supply(&self) -> u128 {
        self.tracker.total_pooled_value()
    }

    pub fn total_shares(&self) -> u128 {
        self.ledger.total_shares()
    }

    pub fn shares_of(&self, owner: &Address) -> u128 {
        self.ledger.balance_of(owner)
    }

    /// Value currently backing `owner`'s shares (0 for no shares)
    pub fn value_of(&self, owner: &Address) -> PoolResult<u128> {
        let shares = self.shares_of(owner);
        if shares == 0 {
            return Ok(0);
        }
        self.shares_to_value(shares)
    }

    pub fn shares_to_value(&self, shares: u128) -> PoolResult<u128> {
        self.engine().shares_to_value(shares)
    }

    pub fn value_to_shares(&self, value: u128) -> PoolResult<u128> {
        self.engine().value_to_shares(value)
    }

    /// Value per share at 18 fractional digits
    pub fn exchange_rate(&self) -> PoolResult<FixedPointDecimal> {
        self.engine().rate()
    }

    pub fn buffered(&self) -> u128 {
        self.tracker.buffered()
    }

    pub fn external(&self) -> u128 {
        self.tracker.external()
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn tracker(&self) -> &PooledValueTracker {
        &self.tracker
    }
}
