//! Role-gated vault operations.
//!
//! [`Permissions`] sits between the vault owner's delegates and the hub. Every
//! sensitive operation requires a capability (the role, or the role's admin
//! role); changes to shared settings additionally require confirmation from
//! every confirming role.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Permissions<H>                      │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌───────────────────────────┐  │
//! │  │ AccessControl  │   │      Confirmations        │  │
//! │  │ members/admins │   │ call hash → role → time   │  │
//! │  └────────────────┘   └───────────────────────────┘  │
//! │                events: Vec<VaultEvent>               │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ VaultOperations
//!                            ▼
//!                        VaultHub (H)
//! ```

mod confirmations;
mod error;
mod roles;

pub use confirmations::{
    validate_confirm_expiry, ConfirmationOutcome, Confirmations, PendingConfirmation,
    DEFAULT_CONFIRM_EXPIRY, MAX_CONFIRM_EXPIRY, MIN_CONFIRM_EXPIRY,
};
pub use error::PermissionsError;
pub use roles::{AccessControl, Role};

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use crate::beacon::{split_pubkeys, withdrawal_requests};
use crate::hub::VaultHub;
use crate::vault::{CallContext, VaultEvent};

/// Roles whose members must all confirm shared-setting changes.
pub const CONFIRMING_ROLES: [Role; 2] = [Role::DefaultAdmin, Role::NodeOperatorManager];

sol! {
    /// Call confirmed when changing the confirmation window.
    function setConfirmExpiry(uint256 newConfirmExpiry);
}

/// Local state that a failed call must roll back.
#[derive(Debug, Clone)]
pub(crate) struct PermissionsSnapshot {
    access: AccessControl,
    confirmations: Confirmations,
    events: usize,
}

/// Role-gated access to one vault on a hub.
#[derive(Debug)]
pub struct Permissions<H> {
    hub: H,
    vault: Address,
    access: AccessControl,
    confirmations: Confirmations,
    events: Vec<VaultEvent>,
}

impl<H: VaultHub> Permissions<H> {
    /// Create the permissions for `vault`, granting `default_admin` the admin role.
    pub fn new(
        hub: H,
        vault: Address,
        default_admin: Address,
        confirm_expiry: u64,
    ) -> Result<Self, PermissionsError> {
        if default_admin.is_zero() {
            return Err(PermissionsError::ZeroAddress("default_admin"));
        }
        let mut permissions = Self {
            hub,
            vault,
            access: AccessControl::new(),
            confirmations: Confirmations::new(confirm_expiry)?,
            events: Vec::new(),
        };
        permissions.grant_unchecked(Role::DefaultAdmin, default_admin, default_admin);
        permissions.emit(VaultEvent::ConfirmExpirySet {
            sender: default_admin,
            old_confirm_expiry: 0,
            new_confirm_expiry: confirm_expiry,
        });
        Ok(permissions)
    }

    /// The hub.
    pub fn hub(&self) -> &H {
        &self.hub
    }

    /// The vault this instance controls.
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Role membership.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Direct membership check.
    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.access.has_role(role, account)
    }

    /// Membership of `role` or of its admin role.
    pub fn has_capability(&self, account: Address, role: Role) -> bool {
        self.access.has_capability(account, role)
    }

    /// Reject callers without `role` capability.
    pub fn check_capability(&self, ctx: &CallContext, role: Role) -> Result<(), PermissionsError> {
        if !self.has_capability(ctx.sender, role) {
            debug!(target: "vaults::permissions", sender = %ctx.sender, %role, "Unauthorized call");
            return Err(PermissionsError::AccessControlUnauthorizedAccount {
                account: ctx.sender,
                role,
            });
        }
        Ok(())
    }

    /// Reject callers that are not direct members of `role`.
    fn check_role(&self, ctx: &CallContext, role: Role) -> Result<(), PermissionsError> {
        if !self.has_role(role, ctx.sender) {
            return Err(PermissionsError::AccessControlUnauthorizedAccount {
                account: ctx.sender,
                role,
            });
        }
        Ok(())
    }

    /// Grant `role` to `account`. Caller must hold the role's admin role.
    ///
    /// Returns `false` if `account` already had the role.
    pub fn grant_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
    ) -> Result<bool, PermissionsError> {
        if account.is_zero() {
            return Err(PermissionsError::ZeroAddress("account"));
        }
        self.check_role(ctx, self.access.admin_of(role))?;
        Ok(self.grant_unchecked(role, account, ctx.sender))
    }

    /// Grant several roles at once; fails without changes if any grant is unauthorized.
    pub fn grant_roles(
        &mut self,
        ctx: &CallContext,
        assignments: &[(Role, Address)],
    ) -> Result<(), PermissionsError> {
        if assignments.is_empty() {
            return Ok(());
        }
        for (role, account) in assignments {
            if account.is_zero() {
                return Err(PermissionsError::ZeroAddress("account"));
            }
            self.check_role(ctx, self.access.admin_of(*role))?;
        }
        for (role, account) in assignments {
            self.grant_unchecked(*role, *account, ctx.sender);
        }
        Ok(())
    }

    /// Revoke `role` from `account`. Caller must hold the role's admin role.
    pub fn revoke_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
    ) -> Result<bool, PermissionsError> {
        self.check_role(ctx, self.access.admin_of(role))?;
        Ok(self.revoke_unchecked(role, account, ctx.sender))
    }

    /// Give up `role`. `account` must be the caller.
    pub fn renounce_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
    ) -> Result<bool, PermissionsError> {
        if account != ctx.sender {
            return Err(PermissionsError::AccessControlBadConfirmation);
        }
        Ok(self.revoke_unchecked(role, account, ctx.sender))
    }

    /// Change the admin role of `role`. Caller must hold the current admin role.
    pub fn set_role_admin(
        &mut self,
        ctx: &CallContext,
        role: Role,
        admin: Role,
    ) -> Result<(), PermissionsError> {
        self.check_role(ctx, self.access.admin_of(role))?;
        self.set_role_admin_unchecked(role, admin);
        Ok(())
    }

    pub(crate) fn set_role_admin_unchecked(&mut self, role: Role, admin: Role) {
        let previous_admin = self.access.set_admin(role, admin);
        info!(target: "vaults::permissions", %role, %previous_admin, new_admin = %admin, "Role admin changed");
        self.emit(VaultEvent::RoleAdminChanged { role, previous_admin, new_admin: admin });
    }

    pub(crate) fn grant_unchecked(&mut self, role: Role, account: Address, sender: Address) -> bool {
        let granted = self.access.grant(role, account);
        if granted {
            info!(target: "vaults::permissions", %role, %account, %sender, "Role granted");
            self.emit(VaultEvent::RoleGranted { role, account, sender });
        }
        granted
    }

    fn revoke_unchecked(&mut self, role: Role, account: Address, sender: Address) -> bool {
        let revoked = self.access.revoke(role, account);
        if revoked {
            info!(target: "vaults::permissions", %role, %account, %sender, "Role revoked");
            self.emit(VaultEvent::RoleRevoked { role, account, sender });
        }
        revoked
    }

    /// Current confirmation window in seconds.
    pub fn confirm_expiry(&self) -> u64 {
        self.confirmations.expiry()
    }

    /// Open confirmations.
    pub fn confirmations(&self) -> &Confirmations {
        &self.confirmations
    }

    /// Submit the caller's confirmation of `call_data` on behalf of every
    /// confirming role it holds. Returns `true` once all roles have confirmed.
    pub(crate) fn collect_confirmations(
        &mut self,
        ctx: &CallContext,
        call_data: &[u8],
    ) -> Result<bool, PermissionsError> {
        let (outcome, events) = self.confirmations.confirm(
            &self.access,
            &CONFIRMING_ROLES,
            call_data,
            ctx.sender,
            ctx.timestamp,
        )?;
        self.events.extend(events);
        Ok(outcome.is_executed())
    }

    /// Change the confirmation window. Needs every confirming role.
    ///
    /// Returns `false` while confirmations are pending.
    pub fn set_confirm_expiry(
        &mut self,
        ctx: &CallContext,
        new_confirm_expiry: u64,
    ) -> Result<bool, PermissionsError> {
        validate_confirm_expiry(new_confirm_expiry)?;
        let call =
            setConfirmExpiryCall { newConfirmExpiry: U256::from(new_confirm_expiry) }.abi_encode();
        if !self.collect_confirmations(ctx, &call)? {
            return Ok(false);
        }

        let old_confirm_expiry = self.confirmations.set_expiry(new_confirm_expiry)?;
        info!(
            target: "vaults::permissions",
            old_confirm_expiry,
            new_confirm_expiry,
            "Confirm expiry set"
        );
        self.emit(VaultEvent::ConfirmExpirySet {
            sender: ctx.sender,
            old_confirm_expiry,
            new_confirm_expiry,
        });
        Ok(true)
    }

    /// Fund the vault.
    pub fn fund(&mut self, ctx: &CallContext, amount: u128) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::Fund)?;
        self.hub.fund(self.vault, amount)?;
        Ok(())
    }

    /// Withdraw ether from the vault to `recipient`.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
        amount: u128,
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::Withdraw)?;
        self.withdraw_unchecked(recipient, amount)
    }

    /// Hub withdrawal without a role check, for callers that gate it themselves.
    pub(crate) fn withdraw_unchecked(
        &self,
        recipient: Address,
        amount: u128,
    ) -> Result<(), PermissionsError> {
        if recipient.is_zero() {
            return Err(PermissionsError::ZeroAddress("recipient"));
        }
        self.hub.withdraw(self.vault, recipient, amount)?;
        Ok(())
    }

    /// Mint liability shares to `recipient`.
    pub fn mint_shares(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
        shares: u128,
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::Mint)?;
        if recipient.is_zero() {
            return Err(PermissionsError::ZeroAddress("recipient"));
        }
        self.hub.mint_shares(self.vault, recipient, shares)?;
        Ok(())
    }

    /// Burn liability shares.
    pub fn burn_shares(&mut self, ctx: &CallContext, shares: u128) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::Burn)?;
        self.hub.burn_shares(self.vault, shares)?;
        Ok(())
    }

    /// Repay liability shares with vault ether.
    pub fn rebalance_vault(
        &mut self,
        ctx: &CallContext,
        shares: u128,
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::Rebalance)?;
        self.hub.rebalance(self.vault, shares)?;
        Ok(())
    }

    /// Stop beacon chain deposits.
    pub fn pause_beacon_chain_deposits(&mut self, ctx: &CallContext) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::PauseBeaconChainDeposits)?;
        self.hub.pause_beacon_chain_deposits(self.vault)?;
        Ok(())
    }

    /// Resume beacon chain deposits.
    pub fn resume_beacon_chain_deposits(
        &mut self,
        ctx: &CallContext,
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::ResumeBeaconChainDeposits)?;
        self.hub.resume_beacon_chain_deposits(self.vault)?;
        Ok(())
    }

    /// Ask the node operator to exit the validators in `packed_pubkeys`.
    pub fn request_validator_exit(
        &mut self,
        ctx: &CallContext,
        packed_pubkeys: &[u8],
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::RequestValidatorExit)?;
        let pubkeys = split_pubkeys(packed_pubkeys)?;
        self.hub.request_validator_exit(self.vault, &pubkeys)?;
        Ok(())
    }

    /// Trigger EIP-7002 withdrawals; empty `amounts_gwei` requests full exits.
    pub fn trigger_validator_withdrawals(
        &mut self,
        ctx: &CallContext,
        packed_pubkeys: &[u8],
        amounts_gwei: &[u64],
        refund_recipient: Address,
    ) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::TriggerValidatorWithdrawal)?;
        if refund_recipient.is_zero() {
            return Err(PermissionsError::ZeroAddress("refund_recipient"));
        }
        let requests = withdrawal_requests(packed_pubkeys, amounts_gwei)?;
        self.hub.trigger_validator_withdrawals(self.vault, &requests, refund_recipient)?;
        Ok(())
    }

    /// Disconnect the vault from the hub.
    pub fn voluntary_disconnect(&mut self, ctx: &CallContext) -> Result<(), PermissionsError> {
        self.check_capability(ctx, Role::VoluntaryDisconnect)?;
        self.hub.voluntary_disconnect(self.vault)?;
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: VaultEvent) {
        self.events.push(event);
    }

    /// Events emitted since the last call, oldest first.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Drain the event journal.
    pub fn take_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn snapshot(&self) -> PermissionsSnapshot {
        PermissionsSnapshot {
            access: self.access.clone(),
            confirmations: self.confirmations.clone(),
            events: self.events.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: PermissionsSnapshot) {
        self.access = snapshot.access;
        self.confirmations = snapshot.confirmations;
        self.events.truncate(snapshot.events);
    }
}
