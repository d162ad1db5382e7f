//! Pool Snapshots
//!
//! Two views of the full pool state:
//!
//! - [`PoolSnapshot`]: serde form for inspection and export. Every amount is
//!   a decimal in token units (18 fractional digits) in the wire format
//!   `{ "kind": "Decimal", "value": "..." }`.
//! - [`SharePool::state_commitment`]: SHA-256 over the borsh encoding of the
//!   canonical state. Two pools commit to the same hash iff they hold the
//!   same config, balances, value split and pause flag.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use rpool_common::{constants::units::DECIMALS, FixedPointDecimal, PoolResult};

use crate::SharePool;

/// One non-zero holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderSnapshot {
    /// Hex-encoded identity
    pub owner: String,
    pub shares: FixedPointDecimal,
    pub value: FixedPointDecimal,
}

/// Serializable point-in-time view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub total_pooled_value: FixedPointDecimal,
    pub buffered: FixedPointDecimal,
    pub external: FixedPointDecimal,
    pub pending_principal: FixedPointDecimal,
    pub total_shares: FixedPointDecimal,
    /// Value per share
    pub exchange_rate: FixedPointDecimal,
    pub unit_size: FixedPointDecimal,
    pub fee_rate_basis_points: u16,
    pub released_units: u64,
    pub reported_units: u64,
    pub paused: bool,
    /// Holders in identity order
    pub holders: Vec<HolderSnapshot>,
    /// Hex SHA-256 of the canonical state
    pub commitment: String,
}

impl PoolSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Base units to token units
fn tokens(amount: u128) -> FixedPointDecimal {
    FixedPointDecimal::from_scaled_integer(amount, DECIMALS)
}

impl SharePool {
    /// Owned, serializable copy of the current state
    pub fn snapshot(&self) -> PoolResult<PoolSnapshot> {
        let engine = self.engine();

        let holders = self
            .ledger
            .holders()
            .map(|(owner, shares)| {
                Ok(HolderSnapshot {
                    owner: hex::encode(owner),
                    shares: tokens(*shares),
                    value: tokens(engine.shares_to_value(*shares)?),
                })
            })
            .collect::<PoolResult<Vec<_>>>()?;

        Ok(PoolSnapshot {
            total_pooled_value: tokens(self.tracker.total_pooled_value()),
            buffered: tokens(self.tracker.buffered()),
            external: tokens(self.tracker.external()),
            pending_principal: tokens(self.tracker.pending_principal(self.config.unit_size)?),
            total_shares: tokens(self.ledger.total_shares()),
            exchange_rate: engine.rate()?,
            unit_size: tokens(self.config.unit_size.get()),
            fee_rate_basis_points: self.config.fee.fee_rate_basis_points,
            released_units: self.tracker.released_units(),
            reported_units: self.tracker.reported_units(),
            paused: self.paused,
            holders,
            commitment: hex::encode(self.state_commitment()),
        })
    }

    /// SHA-256 of the borsh-encoded canonical state
    pub fn state_commitment(&self) -> [u8; 32] {
        let encoded =
            borsh::to_vec(&(&self.config, &self.ledger, &self.tracker, self.paused))
                .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }
}
