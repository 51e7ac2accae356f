//! Events emitted by the permissions and fee layers.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::permissions::Role;

/// Audit record of a state change.
///
/// Events are appended to the owning engine's journal and drained by the
/// caller with `take_events`. Values carry both old and new state so the
/// journal can be replayed without reading storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// An account was granted a role.
    RoleGranted { role: Role, account: Address, sender: Address },
    /// An account lost a role.
    RoleRevoked { role: Role, account: Address, sender: Address },
    /// A role's admin role changed.
    RoleAdminChanged { role: Role, previous_admin: Role, new_admin: Role },
    /// A role member confirmed a pending call.
    RoleMemberConfirmed {
        member: Address,
        role: Role,
        confirm_timestamp: u64,
        expiry_timestamp: u64,
        call_hash: B256,
    },
    /// The confirmation expiry window changed.
    ConfirmExpirySet { sender: Address, old_confirm_expiry: u64, new_confirm_expiry: u64 },
    /// The node operator fee rate changed.
    FeeRateSet { sender: Address, old_fee_rate: u16, new_fee_rate: u16 },
    /// The node operator fee was paid out.
    FeeDisbursed { sender: Address, fee: u128, recipient: Address },
    /// The fee recipient changed.
    FeeRecipientSet { sender: Address, old_recipient: Address, new_recipient: Address },
    /// The settled growth baseline moved.
    SettledGrowthSet { old_settled_growth: i128, new_settled_growth: i128 },
    /// A manual correction or exemption was recorded.
    CorrectionTimestampUpdated { timestamp: u64 },
}
