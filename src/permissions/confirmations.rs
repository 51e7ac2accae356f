//! Multi-role confirmation of calls.
//!
//! A call executes only once a member of every required role has submitted the
//! exact same call data within the expiry window. Each submission records the
//! roles the sender holds; the last missing role triggers execution and clears
//! the entry.
//!
//! ```text
//!   submit(call, sender)
//!        │
//!        ▼
//!   sweep expired roles of `call`
//!        │
//!        ▼
//!   sender holds a required role? ── no ──▶ SenderNotMember
//!        │ yes
//!        ▼
//!   all roles confirmed? ── no ──▶ record, Pending
//!        │ yes
//!        ▼
//!   clear entry, Executed
//! ```

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, B256};
use tracing::debug;

use super::error::PermissionsError;
use super::roles::{AccessControl, Role};
use crate::vault::VaultEvent;

/// Shortest allowed confirmation window.
pub const MIN_CONFIRM_EXPIRY: u64 = 60 * 60;

/// Longest allowed confirmation window.
pub const MAX_CONFIRM_EXPIRY: u64 = 30 * 24 * 60 * 60;

/// Default confirmation window.
pub const DEFAULT_CONFIRM_EXPIRY: u64 = 7 * 24 * 60 * 60;

/// Result of submitting a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Some roles have not confirmed yet.
    Pending,
    /// Every role confirmed; the call may run.
    Executed,
}

impl ConfirmationOutcome {
    /// Whether the call may run.
    pub fn is_executed(&self) -> bool {
        matches!(self, ConfirmationOutcome::Executed)
    }
}

/// Confirmations collected for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// keccak256 of the call data.
    pub call_hash: B256,
    /// When each role confirmed.
    pub confirmed_at: BTreeMap<Role, u64>,
}

impl PendingConfirmation {
    fn new(call_hash: B256) -> Self {
        Self { call_hash, confirmed_at: BTreeMap::new() }
    }

    /// Drop confirmations older than `expiry` at `now`.
    fn sweep(&mut self, now: u64, expiry: u64) {
        self.confirmed_at.retain(|_, at| is_live(*at, now, expiry));
    }
}

fn is_live(confirmed_at: u64, now: u64, expiry: u64) -> bool {
    now <= confirmed_at.saturating_add(expiry)
}

/// Open confirmations keyed by call hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmations {
    expiry: u64,
    pending: BTreeMap<B256, PendingConfirmation>,
}

impl Confirmations {
    /// Create an empty set with the given expiry window.
    pub fn new(expiry: u64) -> Result<Self, PermissionsError> {
        validate_confirm_expiry(expiry)?;
        Ok(Self { expiry, pending: BTreeMap::new() })
    }

    /// Current expiry window in seconds.
    pub fn expiry(&self) -> u64 {
        self.expiry
    }

    /// Change the expiry window, returning the old one.
    ///
    /// Applies to already recorded confirmations as well.
    pub fn set_expiry(&mut self, expiry: u64) -> Result<u64, PermissionsError> {
        validate_confirm_expiry(expiry)?;
        Ok(std::mem::replace(&mut self.expiry, expiry))
    }

    /// Entry for `call_data`, if any (may contain expired roles until the next submission).
    pub fn pending(&self, call_data: &[u8]) -> Option<&PendingConfirmation> {
        self.pending.get(&keccak256(call_data))
    }

    /// Expiry timestamp of `role`'s confirmation of `call_data`, if still live at `now`.
    pub fn confirmation(&self, call_data: &[u8], role: Role, now: u64) -> Option<u64> {
        let at = *self.pending(call_data)?.confirmed_at.get(&role)?;
        is_live(at, now, self.expiry).then_some(at.saturating_add(self.expiry))
    }

    /// Number of calls with an open entry.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no call is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record `sender`'s confirmation of `call_data` for every role in `roles`
    /// it is a direct member of.
    pub fn confirm(
        &mut self,
        access: &AccessControl,
        roles: &[Role],
        call_data: &[u8],
        sender: Address,
        now: u64,
    ) -> Result<(ConfirmationOutcome, Vec<VaultEvent>), PermissionsError> {
        let call_hash = keccak256(call_data);
        let sender_roles: Vec<Role> =
            roles.iter().copied().filter(|role| access.has_role(*role, sender)).collect();
        if sender_roles.is_empty() {
            return Err(PermissionsError::SenderNotMember);
        }

        let mut entry =
            self.pending.remove(&call_hash).unwrap_or_else(|| PendingConfirmation::new(call_hash));
        entry.sweep(now, self.expiry);

        let expiry_timestamp = now.saturating_add(self.expiry);
        let mut events = Vec::with_capacity(sender_roles.len());
        for role in &sender_roles {
            entry.confirmed_at.insert(*role, now);
            events.push(VaultEvent::RoleMemberConfirmed {
                member: sender,
                role: *role,
                confirm_timestamp: now,
                expiry_timestamp,
                call_hash,
            });
        }

        let confirmed = roles.iter().filter(|role| entry.confirmed_at.contains_key(role)).count();
        let outcome = if confirmed == roles.len() {
            ConfirmationOutcome::Executed
        } else {
            self.pending.insert(call_hash, entry);
            ConfirmationOutcome::Pending
        };

        debug!(
            target: "vaults::permissions",
            %sender,
            %call_hash,
            confirmed,
            required = roles.len(),
            ?outcome,
            "Collected confirmation"
        );
        Ok((outcome, events))
    }
}

impl Default for Confirmations {
    fn default() -> Self {
        Self { expiry: DEFAULT_CONFIRM_EXPIRY, pending: BTreeMap::new() }
    }
}

/// Check a confirmation window against its bounds.
pub fn validate_confirm_expiry(expiry: u64) -> Result<(), PermissionsError> {
    if !(MIN_CONFIRM_EXPIRY..=MAX_CONFIRM_EXPIRY).contains(&expiry) {
        return Err(PermissionsError::ConfirmExpiryOutOfBounds(expiry));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 2] = [Role::DefaultAdmin, Role::NodeOperatorManager];

    fn admin() -> Address {
        Address::repeat_byte(0x01)
    }

    fn operator() -> Address {
        Address::repeat_byte(0x02)
    }

    fn acl() -> AccessControl {
        let mut acl = AccessControl::new();
        acl.grant(Role::DefaultAdmin, admin());
        acl.grant(Role::NodeOperatorManager, operator());
        acl
    }

    #[test]
    fn test_two_role_handshake() {
        let acl = acl();
        let mut confirmations = Confirmations::default();

        let (outcome, events) = confirmations.confirm(&acl, &ROLES, b"call", admin(), 100).unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Pending);
        assert_eq!(events.len(), 1);
        assert_eq!(
            confirmations.confirmation(b"call", Role::DefaultAdmin, 100),
            Some(100 + DEFAULT_CONFIRM_EXPIRY)
        );

        let (outcome, _) = confirmations.confirm(&acl, &ROLES, b"call", operator(), 200).unwrap();
        assert!(outcome.is_executed());
        assert!(confirmations.is_empty());
    }

    #[test]
    fn test_same_role_does_not_double_count() {
        let acl = acl();
        let mut confirmations = Confirmations::default();
        confirmations.confirm(&acl, &ROLES, b"call", admin(), 100).unwrap();
        let (outcome, _) = confirmations.confirm(&acl, &ROLES, b"call", admin(), 101).unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Pending);
        assert_eq!(confirmations.pending(b"call").unwrap().confirmed_at.len(), 1);
    }

    #[test]
    fn test_no_replay_across_call_data() {
        let acl = acl();
        let mut confirmations = Confirmations::default();
        confirmations.confirm(&acl, &ROLES, b"call-a", admin(), 100).unwrap();
        let (outcome, _) = confirmations.confirm(&acl, &ROLES, b"call-b", operator(), 100).unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Pending);
        assert_eq!(confirmations.len(), 2);
    }

    #[test]
    fn test_expired_confirmation_is_swept() {
        let acl = acl();
        let mut confirmations = Confirmations::new(MIN_CONFIRM_EXPIRY).unwrap();
        confirmations.confirm(&acl, &ROLES, b"call", admin(), 1_000).unwrap();

        // still live exactly at the boundary
        assert!(confirmations.confirmation(b"call", Role::DefaultAdmin, 1_000 + MIN_CONFIRM_EXPIRY).is_some());

        let late = 1_000 + MIN_CONFIRM_EXPIRY + 1;
        assert!(confirmations.confirmation(b"call", Role::DefaultAdmin, late).is_none());
        let (outcome, _) = confirmations.confirm(&acl, &ROLES, b"call", operator(), late).unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Pending);

        let entry = confirmations.pending(b"call").unwrap();
        assert!(!entry.confirmed_at.contains_key(&Role::DefaultAdmin));
        assert!(entry.confirmed_at.contains_key(&Role::NodeOperatorManager));
    }

    #[test]
    fn test_member_of_both_roles_executes_alone() {
        let mut acl = acl();
        acl.grant(Role::NodeOperatorManager, admin());
        let mut confirmations = Confirmations::default();
        let (outcome, events) = confirmations.confirm(&acl, &ROLES, b"call", admin(), 5).unwrap();
        assert!(outcome.is_executed());
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_sender_not_member() {
        let acl = acl();
        let mut confirmations = Confirmations::default();
        assert_eq!(
            confirmations.confirm(&acl, &ROLES, b"call", Address::repeat_byte(0x09), 5),
            Err(PermissionsError::SenderNotMember)
        );
        assert!(confirmations.is_empty());
    }

    #[test]
    fn test_expiry_bounds() {
        assert_eq!(
            Confirmations::new(MIN_CONFIRM_EXPIRY - 1),
            Err(PermissionsError::ConfirmExpiryOutOfBounds(MIN_CONFIRM_EXPIRY - 1))
        );
        let mut confirmations = Confirmations::new(MAX_CONFIRM_EXPIRY).unwrap();
        assert_eq!(confirmations.set_expiry(MIN_CONFIRM_EXPIRY).unwrap(), MAX_CONFIRM_EXPIRY);
        assert!(confirmations.set_expiry(MAX_CONFIRM_EXPIRY + 1).is_err());
        assert_eq!(confirmations.expiry(), MIN_CONFIRM_EXPIRY);
    }
}
