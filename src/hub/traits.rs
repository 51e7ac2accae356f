//! Hub traits consumed by the permissions and fee layers.

use alloy_primitives::{Address, FixedBytes};

use crate::beacon::WithdrawalRequest;
use crate::vault::{Quarantine, Report};

/// Error type for hub operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// Vault is not connected to the hub.
    #[error("vault {0} is not connected")]
    VaultNotConnected(Address),

    /// Not enough ether in the vault.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Vault balance in wei.
        available: u128,
        /// Requested amount in wei.
        requested: u128,
    },

    /// Burning or rebalancing more shares than minted.
    #[error("insufficient liability shares: minted {minted}, requested {requested}")]
    InsufficientShares {
        /// Currently minted shares.
        minted: u128,
        /// Requested shares.
        requested: u128,
    },

    /// A zero amount was passed where a positive one is required.
    #[error("zero argument: {0}")]
    ZeroArgument(&'static str),

    /// Deposits are already paused.
    #[error("beacon chain deposits already paused")]
    DepositsAlreadyPaused,

    /// Deposits are already running.
    #[error("beacon chain deposits already resumed")]
    DepositsAlreadyResumed,

    /// Arithmetic overflow in the hub ledger.
    #[error("arithmetic overflow in hub ledger")]
    Overflow,

    /// Backend failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Read-only access to oracle reports and quarantine state.
pub trait ReportProvider {
    /// Latest report for the vault.
    fn latest_report(&self, vault: Address) -> Result<Report, HubError>;

    /// Whether the latest report is fresh enough to act on.
    fn is_report_fresh(&self, vault: Address) -> Result<bool, HubError>;

    /// Timestamp of the latest report.
    fn latest_report_timestamp(&self, vault: Address) -> Result<u64, HubError> {
        Ok(self.latest_report(vault)?.timestamp)
    }

    /// Active quarantine, if any.
    fn quarantine(&self, vault: Address) -> Result<Option<Quarantine>, HubError>;

    /// Whether the vault is currently quarantined.
    fn is_quarantined(&self, vault: Address) -> Result<bool, HubError> {
        Ok(self.quarantine(vault)?.is_some())
    }
}

/// State-changing vault operations.
///
/// Implementations must reject the whole operation on failure; callers rely on
/// a failed call leaving hub state untouched.
pub trait VaultOperations {
    /// Add ether to the vault.
    fn fund(&self, vault: Address, amount: u128) -> Result<(), HubError>;

    /// Move ether out of the vault to `recipient`.
    fn withdraw(&self, vault: Address, recipient: Address, amount: u128) -> Result<(), HubError>;

    /// Mint liability shares to `recipient`.
    fn mint_shares(&self, vault: Address, recipient: Address, shares: u128) -> Result<(), HubError>;

    /// Burn liability shares.
    fn burn_shares(&self, vault: Address, shares: u128) -> Result<(), HubError>;

    /// Repay liability shares with vault ether.
    fn rebalance(&self, vault: Address, shares: u128) -> Result<(), HubError>;

    /// Stop beacon chain deposits from the vault.
    fn pause_beacon_chain_deposits(&self, vault: Address) -> Result<(), HubError>;

    /// Resume beacon chain deposits from the vault.
    fn resume_beacon_chain_deposits(&self, vault: Address) -> Result<(), HubError>;

    /// Signal that the given validators should exit.
    fn request_validator_exit(
        &self,
        vault: Address,
        pubkeys: &[FixedBytes<48>],
    ) -> Result<(), HubError>;

    /// Submit EIP-7002 withdrawal requests; excess fee goes to `refund_recipient`.
    fn trigger_validator_withdrawals(
        &self,
        vault: Address,
        requests: &[WithdrawalRequest],
        refund_recipient: Address,
    ) -> Result<(), HubError>;

    /// Disconnect the vault from the hub.
    fn voluntary_disconnect(&self, vault: Address) -> Result<(), HubError>;
}

/// Combined hub access.
pub trait VaultHub: ReportProvider + VaultOperations {}

impl<T> VaultHub for T where T: ReportProvider + VaultOperations {}
