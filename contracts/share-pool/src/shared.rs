//! Shared Pool Handle
//!
//! `SharedPool` puts a [`SharePool`] behind `Arc<RwLock<_>>` for callers that
//! need it from several threads. Each mutation holds the write lock for its
//! whole duration, so readers only ever see fully applied state.

use std::sync::Arc;

use parking_lot::RwLock;
use rpool_common::{Address, PoolConfig, PoolResult};

use crate::batcher::StakeSink;
use crate::rewards::RewardOutcome;
use crate::snapshot::PoolSnapshot;
use crate::SharePool;

/// Cloneable, thread-safe handle to one pool
#[derive(Debug, Clone)]
pub struct SharedPool {
    inner: Arc<RwLock<SharePool>>,
}

impl SharedPool {
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        Ok(Self::from_pool(SharePool::new(config)?))
    }

    pub fn from_pool(pool: SharePool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pool)),
        }
    }

    pub fn submit(&self, owner: &Address, value: u128) -> PoolResult<u128> {
        self.inner.write().submit(owner, value)
    }

    pub fn withdraw(&self, owner: &Address, shares: u128) -> PoolResult<u128> {
        self.inner.write().withdraw(owner, shares)
    }

    /// The sink runs under the write lock and gets the pool itself, not
    /// this handle; calling back through a `SharedPool` clone would deadlock.
    pub fn flush_buffer<S>(&self, max_units: u64, sink: &mut S) -> PoolResult<()>
    where
        S: StakeSink + ?Sized,
    {
        self.inner.write().flush_buffer(max_units, sink)
    }

    pub fn report_external_state(
        &self,
        validator_count: u64,
        reported_balance: u128,
    ) -> PoolResult<RewardOutcome> {
        self.inner
            .write()
            .report_external_state(validator_count, reported_balance)
    }

    pub fn pause(&self) {
        self.inner.write().pause();
    }

    pub fn resume(&self) {
        self.inner.write().resume();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.read().is_paused()
    }

    pub fn total_supply(&self) -> u128 {
        self.inner.read().total_supply()
    }

    pub fn total_shares(&self) -> u128 {
        self.inner.read().total_shares()
    }

    pub fn shares_of(&self, owner: &Address) -> u128 {
        self.inner.read().shares_of(owner)
    }

    pub fn value_of(&self, owner: &Address) -> PoolResult<u128> {
        self.inner.read().value_of(owner)
    }

    pub fn shares_to_value(&self, shares: u128) -> PoolResult<u128> {
        self.inner.read().shares_to_value(shares)
    }

    pub fn value_to_shares(&self, value: u128) -> PoolResult<u128> {
        self.inner.read().value_to_shares(value)
    }

    /// Owned copy of the whole pool
    pub fn to_pool(&self) -> SharePool {
        self.inner.read().clone()
    }

    pub fn snapshot(&self) -> PoolResult<PoolSnapshot> {
        self.inner.read().snapshot()
    }

    /// Run `f` with exclusive access, e.g. to batch several operations
    pub fn with_pool<R>(&self, f: impl FnOnce(&mut SharePool) -> R) -> R {
        f(&mut *self.inner.write())
    }
}
