//! Error types for the node operator fee engine.

use crate::hub::HubError;
use crate::permissions::PermissionsError;
use crate::safe_arith::ArithError;

/// Errors raised by [`NodeOperatorFee`](super::NodeOperatorFee).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    /// Fee rate above 100%.
    #[error("fee rate {0} bp exceeds 10000 bp")]
    FeeRateTooHigh(u16),

    /// The latest report is not fresh.
    #[error("report is stale")]
    ReportStale,

    /// A correction was made at or after the latest report.
    #[error("correction at {correction} is not older than report at {report}")]
    CorrectionAfterReport {
        /// Latest correction timestamp.
        correction: u64,
        /// Latest report timestamp.
        report: u64,
    },

    /// The vault is in quarantine.
    #[error("vault is quarantined")]
    VaultQuarantined,

    /// Fee above the abnormal-fee threshold.
    #[error("abnormally high fee {fee}, threshold {threshold}")]
    AbnormallyHighFee {
        /// Accrued fee in wei.
        fee: u128,
        /// Threshold in wei.
        threshold: u128,
    },

    /// Settled growth moved since the caller read it.
    #[error("unexpected settled growth: expected {expected}, actual {actual}")]
    UnexpectedSettledGrowth {
        /// Value the caller expected.
        expected: i128,
        /// Current value.
        actual: i128,
    },

    /// Correction to the current settled growth.
    #[error("settled growth unchanged")]
    SameSettledGrowth,

    /// Zero address where an account is required.
    #[error("zero address: {0}")]
    ZeroAddress(&'static str),

    /// New fee recipient equals the current one.
    #[error("fee recipient unchanged")]
    SameRecipient,

    /// A zero amount was passed where a positive one is required.
    #[error("zero argument: {0}")]
    ZeroArgument(&'static str),

    /// Exemption above the sane maximum.
    #[error("unexpected fee exemption amount {0}")]
    UnexpectedFeeExemptionAmount(u128),

    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Role check or confirmation failed.
    #[error(transparent)]
    Permissions(#[from] PermissionsError),

    /// Hub rejected the operation.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Fee arithmetic overflowed.
    #[error("fee arithmetic: {0}")]
    Arith(#[from] ArithError),
}
