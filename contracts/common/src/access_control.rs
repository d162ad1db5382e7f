//! Access Control Module
//!
//! Role-based authorization for the operations the accounting core takes
//! as already authorized: oracle reports, committee management and pausing.
//!
//! ## Key Features
//!
//! - **Role-Based Access**: Admin, oracle member and pauser roles
//! - **Permission Mapping**: Each permission names the role it requires
//! - **Admin Rotation**: Only the current admin can hand over the admin role

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{PoolError, PoolResult};
use crate::types::Address;

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Role {
    /// Can manage roles and committee parameters
    Admin = 0,
    /// Can submit external-value reports
    OracleMember = 1,
    /// Can pause and resume the pool
    Pauser = 2,
}

/// Permission types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Grant or revoke roles
    ManageRoles,
    /// Change quorum and sanity bounds
    UpdateParams,
    /// Submit an oracle report
    SubmitReport,
    /// Pause or resume the pool
    Pause,
}

impl Permission {
    /// Role required for this permission
    pub fn required_role(&self) -> Role {
        match self {
            Permission::ManageRoles | Permission::UpdateParams => Role::Admin,
            Permission::SubmitReport => Role::OracleMember,
            Permission::Pause => Role::Pauser,
        }
    }
}

/// Access control state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessControlState {
    /// Current admin address
    admin: Address,
    /// Role assignments (admin is implicit)
    roles: BTreeMap<Address, BTreeSet<Role>>,
}

impl AccessControlState {
    /// Create new access control state with an admin
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            roles: BTreeMap::new(),
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Check if address holds a role
    pub fn has_role(&self, address: &Address, role: Role) -> bool {
        if role == Role::Admin {
            return *address == self.admin;
        }
        self.roles
            .get(address)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }

    /// Addresses holding `role`, in address order
    pub fn holders(&self, role: Role) -> Vec<Address> {
        if role == Role::Admin {
            return vec![self.admin];
        }
        self.roles
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(address, _)| *address)
            .collect()
    }

    /// Fail with `Unauthorized` unless `caller` may exercise `permission`
    pub fn require(&self, caller: &Address, permission: Permission) -> PoolResult<()> {
        let role = permission.required_role();
        if self.has_role(caller, role) {
            return Ok(());
        }

        warn!(?permission, ?role, "unauthorized caller");
        let expected = (role == Role::Admin).then_some(self.admin);
        Err(PoolError::Unauthorized {
            expected,
            actual: *caller,
        })
    }

    /// Grant a role (admin only)
    pub fn grant_role(&mut self, caller: &Address, address: Address, role: Role) -> PoolResult<()> {
        self.require(caller, Permission::ManageRoles)?;

        if role == Role::Admin {
            return Err(PoolError::InvalidInput {
                param: "role",
                reason: "use transfer_admin for the admin role",
            });
        }

        self.roles.entry(address).or_default().insert(role);
        debug!(?role, "role granted");
        Ok(())
    }

    /// Revoke a role (admin only); revoking an absent role is a no-op
    pub fn revoke_role(&mut self, caller: &Address, address: &Address, role: Role) -> PoolResult<()> {
        self.require(caller, Permission::ManageRoles)?;

        if let Some(roles) = self.roles.get_mut(address) {
            roles.remove(&role);
            if roles.is_empty() {
                self.roles.remove(address);
            }
        }
        debug!(?role, "role revoked");
        Ok(())
    }

    /// Hand the admin role to a new address
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> PoolResult<()> {
        self.require(caller, Permission::ManageRoles)?;

        if new_admin == self.admin {
            return Err(PoolError::InvalidInput {
                param: "new_admin",
                reason: "same as current",
            });
        }

        self.admin = new_admin;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        [1u8; 32]
    }

    fn member() -> Address {
        [2u8; 32]
    }

    fn stranger() -> Address {
        [9u8; 32]
    }

    #[test]
    fn test_admin_is_implicit() {
        let acl = AccessControlState::new(admin());
        assert!(acl.has_role(&admin(), Role::Admin));
        assert!(acl.require(&admin(), Permission::ManageRoles).is_ok());
        assert!(acl.require(&admin(), Permission::SubmitReport).is_err());
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut acl = AccessControlState::new(admin());
        acl.grant_role(&admin(), member(), Role::OracleMember).unwrap();
        assert!(acl.require(&member(), Permission::SubmitReport).is_ok());
        assert_eq!(acl.holders(Role::OracleMember), vec![member()]);

        acl.revoke_role(&admin(), &member(), Role::OracleMember).unwrap();
        assert!(acl.require(&member(), Permission::SubmitReport).is_err());
        assert!(acl.holders(Role::OracleMember).is_empty());
    }

    #[test]
    fn test_only_admin_manages_roles() {
        let mut acl = AccessControlState::new(admin());
        let result = acl.grant_role(&stranger(), stranger(), Role::Pauser);
        assert_eq!(
            result,
            Err(PoolError::Unauthorized {
                expected: Some(admin()),
                actual: stranger(),
            })
        );
    }

    #[test]
    fn test_admin_role_cannot_be_granted() {
        let mut acl = AccessControlState::new(admin());
        assert!(matches!(
            acl.grant_role(&admin(), member(), Role::Admin),
            Err(PoolError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_transfer_admin() {
        let mut acl = AccessControlState::new(admin());
        acl.transfer_admin(&admin(), member()).unwrap();
        assert_eq!(acl.admin(), member());
        assert!(acl.require(&admin(), Permission::ManageRoles).is_err());
        assert!(acl.transfer_admin(&member(), member()).is_err());
    }
}
