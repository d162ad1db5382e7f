//! Committee configuration

use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use rpool_common::{
    constants::oracle::{DEFAULT_MAX_INCREASE_BPS, DEFAULT_QUORUM, MAX_MEMBERS},
    Address, PoolError, PoolResult,
};

/// Initial committee setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CommitteeConfig {
    /// Manages members and parameters
    pub admin: Address,
    /// Initial oracle members
    pub members: Vec<Address>,
    /// May pause and resume the pool
    #[serde(default)]
    pub pausers: Vec<Address>,
    /// Matching reports needed to apply one
    pub quorum: usize,
    /// Largest accepted rise of the external balance per report, in bps
    #[serde(default)]
    pub max_increase_bps: Option<u64>,
}

impl CommitteeConfig {
    /// Single-member committee with default bounds
    pub fn single(admin: Address, member: Address) -> Self {
        Self {
            admin,
            members: vec![member],
            pausers: Vec::new(),
            quorum: DEFAULT_QUORUM,
            max_increase_bps: Some(DEFAULT_MAX_INCREASE_BPS),
        }
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.members.is_empty() || self.members.len() > MAX_MEMBERS {
            return Err(PoolError::InvalidConfig {
                param: "members",
                reason: format!("need 1..={} members, got {}", MAX_MEMBERS, self.members.len()),
            });
        }

        let unique: BTreeSet<_> = self.members.iter().collect();
        if unique.len() != self.members.len() {
            return Err(PoolError::InvalidConfig {
                param: "members",
                reason: "duplicate member".to_string(),
            });
        }

        if self.quorum == 0 || self.quorum > self.members.len() {
            return Err(PoolError::InvalidConfig {
                param: "quorum",
                reason: format!("must be in 1..={}", self.members.len()),
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
