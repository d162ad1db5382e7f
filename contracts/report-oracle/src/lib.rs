//! Report Oracle Committee
//!
//! The access layer in front of [`SharePool::report_external_state`]. The
//! pool trusts whatever it is told; the committee decides what it is told.
//!
//! ## Key Features
//!
//! - **Membership**: Reports are accepted from oracle members only
//! - **Quorum**: A report is applied once `quorum` members submitted the
//!   identical `(validator_count, balance)` pair for the current epoch
//! - **Epochs**: One applied report per epoch; stale and future epochs are
//!   rejected, and each member votes at most once per epoch; the admin can
//!   reset a split epoch
//! - **Sanity Bound**: Optional cap on how far a report may raise the
//!   external balance above its baseline
//! - **Pausing**: Pausers can pause and resume the pool
//!
//! ## Deviation Baseline
//!
//! ```text
//! baseline = last_balance + (validator_count - last_count) * unit_size
//! ```
//!
//! Newly reported units enter at principal, so only growth counts against
//! the bound. Decreases are never bounded.

pub mod config;

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rpool_common::{
    constants::oracle::MAX_MEMBERS, deviation_bps, safe_add, AccessControlState, Address,
    Permission, PoolError, PoolResult, Role,
};
use rpool_share_pool::{RewardOutcome, SharePool};

pub use config::CommitteeConfig;

// ============ Types ============

/// One member's view of the facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ExternalReport {
    pub validator_count: u64,
    pub balance: u128,
}

/// Committee actions, dispatched by [`OracleCommittee::execute`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OracleAction {
    SubmitReport { epoch: u64, report: ExternalReport },
    AddMember { member: Address },
    RemoveMember { member: Address },
    SetQuorum { quorum: usize },
    SetMaxIncrease { max_increase_bps: Option<u64> },
    ResetEpoch,
    PausePool,
    ResumePool,
}

/// Result of a single report submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Vote recorded; `votes` members agree so far
    Pending { votes: usize },
    /// Quorum reached and the pool adopted the report
    Applied(RewardOutcome),
}

// ============ Committee ============

/// Members, quorum and per-epoch votes
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OracleCommittee {
    access: AccessControlState,
    quorum: usize,
    max_increase_bps: Option<u64>,
    /// Epoch currently collecting votes
    epoch: u64,
    votes: BTreeMap<Address, ExternalReport>,
    last_applied: Option<ExternalReport>,
}

impl OracleCommittee {
    pub fn new(config: CommitteeConfig) -> PoolResult<Self> {
        config.validate()?;

        let mut access = AccessControlState::new(config.admin);
        for member in &config.members {
            access.grant_role(&config.admin, *member, Role::OracleMember)?;
        }
        for pauser in &config.pausers {
            access.grant_role(&config.admin, *pauser, Role::Pauser)?;
        }

        info!(
            members = config.members.len(),
            quorum = config.quorum,
            "oracle committee created"
        );
        Ok(Self {
            access,
            quorum: config.quorum,
            max_increase_bps: config.max_increase_bps,
            epoch: 0,
            votes: BTreeMap::new(),
            last_applied: None,
        })
    }

    // ============ Reads ============

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn max_increase_bps(&self) -> Option<u64> {
        self.max_increase_bps
    }

    pub fn members(&self) -> Vec<Address> {
        self.access.holders(Role::OracleMember)
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.access.has_role(address, Role::OracleMember)
    }

    pub fn last_applied(&self) -> Option<ExternalReport> {
        self.last_applied
    }

    /// Members agreeing on `report` in the current epoch
    pub fn votes_for(&self, report: &ExternalReport) -> usize {
        self.votes.values().filter(|vote| *vote == report).count()
    }

    pub fn access(&self) -> &AccessControlState {
        &self.access
    }

    // ============ Dispatch ============

    /// Run `action` on behalf of `caller`
    pub fn execute(
        &mut self,
        pool: &mut SharePool,
        caller: &Address,
        action: &OracleAction,
    ) -> PoolResult<Option<SubmitOutcome>> {
        match action {
            OracleAction::SubmitReport { epoch, report } => {
                self.submit_report(pool, caller, *epoch, *report).map(Some)
            }
            OracleAction::AddMember { member } => self.add_member(caller, *member).map(|_| None),
            OracleAction::RemoveMember { member } => {
                self.remove_member(caller, member).map(|_| None)
            }
            OracleAction::SetQuorum { quorum } => self.set_quorum(caller, *quorum).map(|_| None),
            OracleAction::SetMaxIncrease { max_increase_bps } => self
                .set_max_increase(caller, *max_increase_bps)
                .map(|_| None),
            OracleAction::ResetEpoch => self.reset_epoch(caller).map(|_| None),
            OracleAction::PausePool => self.pause_pool(pool, caller).map(|_| None),
            OracleAction::ResumePool => self.resume_pool(pool, caller).map(|_| None),
        }
    }

    // ============ Reports ============

    /// Record `member`'s vote and apply the report once quorum agrees
    ///
    /// The vote is only kept if it was recorded without applying, or if the
    /// pool accepted the report; a report the pool rejects leaves the
    /// committee unchanged.
    pub fn submit_report(
        &mut self,
        pool: &mut SharePool,
        member: &Address,
        epoch: u64,
        report: ExternalReport,
    ) -> PoolResult<SubmitOutcome> {
        self.access.require(member, Permission::SubmitReport)?;

        if epoch < self.epoch {
            return Err(PoolError::InvalidReport { reason: "stale epoch" });
        }
        if epoch > self.epoch {
            return Err(PoolError::InvalidReport { reason: "future epoch" });
        }
        if self.votes.contains_key(member) {
            return Err(PoolError::DuplicateVote { epoch });
        }

        self.check_deviation(pool, &report)?;

        let votes = self.votes_for(&report) + 1;
        if votes < self.quorum {
            self.votes.insert(*member, report);
            debug!(
                epoch,
                member = %hex::encode(member),
                votes,
                quorum = self.quorum,
                "report vote recorded"
            );
            return Ok(SubmitOutcome::Pending { votes });
        }

        let outcome = pool.report_external_state(report.validator_count, report.balance)?;

        info!(
            epoch,
            validator_count = report.validator_count,
            balance = report.balance,
            votes,
            "report applied"
        );
        self.votes.clear();
        self.last_applied = Some(report);
        self.epoch += 1;

        Ok(SubmitOutcome::Applied(outcome))
    }

    /// Reject reports raising the balance more than `max_increase_bps`
    /// above the baseline
    fn check_deviation(&self, pool: &SharePool, report: &ExternalReport) -> PoolResult<()> {
        let Some(max_bps) = self.max_increase_bps else {
            return Ok(());
        };

        let (last_count, last_balance) = self
            .last_applied
            .map(|last| (last.validator_count, last.balance))
            .unwrap_or((0, 0));
        let new_units = report.validator_count.saturating_sub(last_count);
        let baseline = safe_add(last_balance, pool.unit_size().value_of(new_units)?)?;

        if report.balance <= baseline {
            return Ok(());
        }

        let deviation = deviation_bps(baseline, report.balance);
        if deviation > max_bps {
            warn!(
                baseline,
                balance = report.balance,
                deviation_bps = deviation,
                max_bps,
                "report rejected: increase too large"
            );
            return Err(PoolError::OracleDeviation {
                deviation_bps: deviation,
                max_bps,
            });
        }
        Ok(())
    }

    // ============ Administration ============

    pub fn add_member(&mut self, caller: &Address, member: Address) -> PoolResult<()> {
        self.access.require(caller, Permission::ManageRoles)?;

        if self.is_member(&member) {
            return Err(PoolError::InvalidInput {
                param: "member",
                reason: "already a member",
            });
        }
        if self.members().len() >= MAX_MEMBERS {
            return Err(PoolError::InvalidInput {
                param: "member",
                reason: "committee is full",
            });
        }

        self.access.grant_role(caller, member, Role::OracleMember)?;
        info!(member = %hex::encode(member), "oracle member added");
        Ok(())
    }

    /// Remove `member` and drop their vote in the current epoch
    pub fn remove_member(&mut self, caller: &Address, member: &Address) -> PoolResult<()> {
        self.access.require(caller, Permission::ManageRoles)?;

        if !self.is_member(member) {
            return Err(PoolError::InvalidInput {
                param: "member",
                reason: "not a member",
            });
        }
        if self.members().len() <= self.quorum {
            return Err(PoolError::InvalidInput {
                param: "member",
                reason: "would leave fewer members than quorum",
            });
        }

        self.access.revoke_role(caller, member, Role::OracleMember)?;
        self.votes.remove(member);
        info!(member = %hex::encode(member), "oracle member removed");
        Ok(())
    }

    pub fn set_quorum(&mut self, caller: &Address, quorum: usize) -> PoolResult<()> {
        self.access.require(caller, Permission::UpdateParams)?;

        if quorum == 0 || quorum > self.members().len() {
            return Err(PoolError::InvalidInput {
                param: "quorum",
                reason: "must be between 1 and the member count",
            });
        }

        // Votes cast under the old quorum stay valid
        self.quorum = quorum;
        info!(quorum, "oracle quorum updated");
        Ok(())
    }

    pub fn set_max_increase(&mut self, caller: &Address, max_increase_bps: Option<u64>) -> PoolResult<()> {
        self.access.require(caller, Permission::UpdateParams)?;
        self.max_increase_bps = max_increase_bps;
        info!(?max_increase_bps, "oracle sanity bound updated");
        Ok(())
    }

    /// Discard every vote of the current epoch so members can vote again
    ///
    /// Split votes can otherwise leave an epoch unable to reach quorum. The
    /// epoch number is kept.
    pub fn reset_epoch(&mut self, caller: &Address) -> PoolResult<()> {
        self.access.require(caller, Permission::UpdateParams)?;
        let discarded = self.votes.len();
        self.votes.clear();
        warn!(epoch = self.epoch, discarded, "oracle epoch votes reset");
        Ok(())
    }

    /// Grant or revoke the pauser role
    pub fn set_pauser(&mut self, caller: &Address, pauser: Address, enabled: bool) -> PoolResult<()> {
        if enabled {
            self.access.grant_role(caller, pauser, Role::Pauser)
        } else {
            self.access.revoke_role(caller, &pauser, Role::Pauser)
        }
    }

    // ============ Pausing ============

    pub fn pause_pool(&self, pool: &mut SharePool, caller: &Address) -> PoolResult<()> {
        self.access.require(caller, Permission::Pause)?;
        pool.pause();
        Ok(())
    }

    pub fn resume_pool(&self, pool: &mut SharePool, caller: &Address) -> PoolResult<()> {
        self.access.require(caller, Permission::Pause)?;
        pool.resume();
        Ok(())
    }
}

// ============ Tests ============
