//! Core Types for the rpool Engine
//!
//! Identity aliases and the deployment configuration shared by every crate.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::{batching, fees};
use crate::errors::{PoolError, PoolResult};

/// Type alias for owner identities (32-byte hash)
pub type Address = [u8; 32];

// ============ Fee Types ============

/// Protocol fee taken from reported growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeeConfig {
    /// Fee rate over a 1000 scale (100 = 10%)
    pub fee_rate_basis_points: u16,
}

impl FeeConfig {
    /// Creates a fee config, rejecting rates above 100%
    pub fn new(fee_rate_basis_points: u16) -> PoolResult<Self> {
        let config = Self { fee_rate_basis_points };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.fee_rate_basis_points > fees::MAX_FEE_RATE {
            return Err(PoolError::InvalidConfig {
                param: "fee_rate_basis_points",
                reason: format!(
                    "{} exceeds {}",
                    self.fee_rate_basis_points,
                    fees::MAX_FEE_RATE
                ),
            });
        }
        Ok(())
    }

    /// True when no fee is taken
    pub fn is_zero(&self) -> bool {
        self.fee_rate_basis_points == 0
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fee_rate_basis_points: fees::DEFAULT_FEE_RATE,
        }
    }
}

// ============ Batching Types ============

/// Fixed granularity at which buffered value is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(transparent)]
pub struct UnitSize(u128);

impl UnitSize {
    pub fn new(size: u128) -> PoolResult<Self> {
        if size == 0 {
            return Err(PoolError::InvalidConfig {
                param: "unit_size",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(Self(size))
    }

    pub fn get(self) -> u128 {
        self.0
    }

    /// Value of `count` whole units
    pub fn value_of(self, count: u64) -> PoolResult<u128> {
        crate::math::safe_mul(self.0, count as u128)
    }
}

impl Default for UnitSize {
    fn default() -> Self {
        Self(batching::DEFAULT_UNIT_SIZE)
    }
}

// ============ Pool Config ============

/// Deployment configuration of a share pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolConfig {
    /// Release granularity
    pub unit_size: UnitSize,
    /// Protocol fee
    pub fee: FeeConfig,
    /// Recipient of newly minted fee shares
    pub fee_recipient: Address,
    /// Cap on units released by a single flush
    pub max_units_per_flush: u64,
}

impl PoolConfig {
    pub fn new(unit_size: u128, fee_rate_basis_points: u16, fee_recipient: Address) -> PoolResult<Self> {
        let config = Self {
            unit_size: UnitSize::new(unit_size)?,
            fee: FeeConfig::new(fee_rate_basis_points)?,
            fee_recipient,
            max_units_per_flush: batching::DEFAULT_MAX_UNITS_PER_FLUSH,
        };
        Ok(config)
    }

    /// Validate every field (deserialized configs bypass the constructors)
    pub fn validate(&self) -> PoolResult<()> {
        if self.unit_size.get() == 0 {
            return Err(PoolError::InvalidConfig {
                param: "unit_size",
                reason: "must be non-zero".to_string(),
            });
        }
        self.fee.validate()?;
        if self.max_units_per_flush == 0 {
            return Err(PoolError::InvalidConfig {
                param: "max_units_per_flush",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> PoolResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| PoolError::InvalidConfig {
            param: "json",
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
