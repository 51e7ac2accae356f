//! Role identifiers and role membership.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

/// Capabilities a vault owner can delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Admin of every role without an explicit admin.
    DefaultAdmin,
    Fund,
    Withdraw,
    Mint,
    Burn,
    Rebalance,
    PauseBeaconChainDeposits,
    ResumeBeaconChainDeposits,
    RequestValidatorExit,
    TriggerValidatorWithdrawal,
    VoluntaryDisconnect,
    /// Manages node operator settings; admin of itself.
    NodeOperatorManager,
    /// May mark growth as exempt from the node operator fee.
    NodeOperatorFeeExempt,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 13] = [
        Role::DefaultAdmin,
        Role::Fund,
        Role::Withdraw,
        Role::Mint,
        Role::Burn,
        Role::Rebalance,
        Role::PauseBeaconChainDeposits,
        Role::ResumeBeaconChainDeposits,
        Role::RequestValidatorExit,
        Role::TriggerValidatorWithdrawal,
        Role::VoluntaryDisconnect,
        Role::NodeOperatorManager,
        Role::NodeOperatorFeeExempt,
    ];

    /// Namespaced role name; its keccak256 is the role id.
    pub const fn name(&self) -> &'static str {
        match self {
            Role::DefaultAdmin => "DEFAULT_ADMIN_ROLE",
            Role::Fund => "vaults.Permissions.Fund",
            Role::Withdraw => "vaults.Permissions.Withdraw",
            Role::Mint => "vaults.Permissions.Mint",
            Role::Burn => "vaults.Permissions.Burn",
            Role::Rebalance => "vaults.Permissions.Rebalance",
            Role::PauseBeaconChainDeposits => "vaults.Permissions.PauseDeposits",
            Role::ResumeBeaconChainDeposits => "vaults.Permissions.ResumeDeposits",
            Role::RequestValidatorExit => "vaults.Permissions.RequestValidatorExit",
            Role::TriggerValidatorWithdrawal => "vaults.Permissions.TriggerValidatorWithdrawal",
            Role::VoluntaryDisconnect => "vaults.Permissions.VoluntaryDisconnect",
            Role::NodeOperatorManager => "vaults.NodeOperatorFee.NodeOperatorManagerRole",
            Role::NodeOperatorFeeExempt => "vaults.NodeOperatorFee.FeeExemptRole",
        }
    }

    /// 32-byte role id. The default admin role is zero.
    pub fn id(&self) -> B256 {
        match self {
            Role::DefaultAdmin => B256::ZERO,
            other => keccak256(other.name()),
        }
    }

    /// Look a role up by its id.
    pub fn from_id(id: B256) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == s || format!("{role:?}").eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Role membership and the role → admin role mapping.
///
/// Membership is direct. A role without an explicit admin is administered by
/// [`Role::DefaultAdmin`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Address>>,
    admins: BTreeMap<Role, Role>,
}

impl AccessControl {
    /// Create an empty access control list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct membership check.
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members.get(&role).is_some_and(|members| members.contains(&account))
    }

    /// Whether `account` may exercise `role`: as a member or as a member of its admin role.
    pub fn has_capability(&self, account: Address, role: Role) -> bool {
        self.has_role(role, account) || self.has_role(self.admin_of(role), account)
    }

    /// Admin role of `role`.
    pub fn admin_of(&self, role: Role) -> Role {
        self.admins.get(&role).copied().unwrap_or(Role::DefaultAdmin)
    }

    /// Add a member. Returns `false` if it already was one.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Remove a member. Returns `false` if it was not one.
    pub fn revoke(&mut self, role: Role, account: Address) -> bool {
        let Some(members) = self.members.get_mut(&role) else {
            return false;
        };
        let removed = members.remove(&account);
        if members.is_empty() {
            self.members.remove(&role);
        }
        removed
    }

    /// Set the admin role of `role`, returning the previous one.
    pub fn set_admin(&mut self, role: Role, admin: Role) -> Role {
        let previous = self.admin_of(role);
        if admin == Role::DefaultAdmin {
            self.admins.remove(&role);
        } else {
            self.admins.insert(role, admin);
        }
        previous
    }

    /// Members of `role`, in address order.
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members.get(&role).map(|m| m.iter().copied().collect()).unwrap_or_default()
    }
}
