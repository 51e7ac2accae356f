//! Error types for role checks and confirmations.

use alloy_primitives::Address;

use super::roles::Role;
use crate::beacon::RequestError;
use crate::hub::HubError;

/// Errors raised by the permissions layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionsError {
    /// Caller lacks the role and its admin role.
    #[error("account {account} is missing role {role}")]
    AccessControlUnauthorizedAccount {
        /// Caller.
        account: Address,
        /// Required role.
        role: Role,
    },

    /// An account tried to renounce a role on behalf of someone else.
    #[error("roles can only be renounced for self")]
    AccessControlBadConfirmation,

    /// Caller holds none of the confirming roles.
    #[error("sender is not a member of any confirming role")]
    SenderNotMember,

    /// Confirmation expiry outside `[1 hour, 30 days]`.
    #[error("confirm expiry {0}s out of bounds")]
    ConfirmExpiryOutOfBounds(u64),

    /// Zero address where an account is required.
    #[error("zero address: {0}")]
    ZeroAddress(&'static str),

    /// Hub rejected the operation.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Validator request could not be built.
    #[error(transparent)]
    Request(#[from] RequestError),
}
