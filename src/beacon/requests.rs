//! Execution-layer triggered validator requests.
//!
//! - EIP-7002 withdrawal requests: `pubkey (48) ‖ amount_gwei (8, big endian)`
//! - EIP-7251 consolidation requests: `source_pubkey (48) ‖ target_pubkey (48)`
//!
//! Pubkeys arrive packed back to back, the way they are passed to the system
//! contracts.

use alloy_primitives::{address, Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

use crate::safe_arith::SafeArith;

/// EIP-7002 withdrawal request contract address.
pub const WITHDRAWAL_REQUEST_CONTRACT: Address =
    address!("0x00000961Ef480Eb55e80D19ad83579A64c007002");

/// EIP-7251 consolidation request contract address.
pub const CONSOLIDATION_REQUEST_CONTRACT: Address =
    address!("0x0000BBdDc7CE488642fb579F8B00f3a590007251");

/// Length of a BLS public key.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Length of EIP-7002 request calldata.
pub const WITHDRAWAL_REQUEST_CALLDATA_LENGTH: usize = 56;

/// Length of EIP-7251 request calldata.
pub const CONSOLIDATION_REQUEST_CALLDATA_LENGTH: usize = 96;

/// Errors building validator requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// No pubkeys were supplied.
    #[error("no requests supplied")]
    NoRequests,

    /// Packed pubkeys are not a multiple of 48 bytes.
    #[error("invalid packed public keys length {0}")]
    InvalidPublicKeysLength(usize),

    /// Pubkey and amount counts differ.
    #[error("mismatched array lengths: {keys} keys, {amounts} amounts")]
    MismatchedArrayLengths {
        /// Number of pubkeys.
        keys: usize,
        /// Number of amounts.
        amounts: usize,
    },

    /// Attached fee does not cover all requests.
    #[error("insufficient request fee: provided {provided}, required {required}")]
    InsufficientFee {
        /// Fee attached.
        provided: U256,
        /// Fee required.
        required: U256,
    },

    /// Fee arithmetic overflowed.
    #[error("request fee overflow")]
    FeeOverflow,

    /// Summed withdrawal amounts overflowed.
    #[error("requested amount overflow")]
    AmountOverflow,
}

/// A single EIP-7002 withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Validator public key.
    pub pubkey: FixedBytes<48>,
    /// Amount in gwei; zero requests a full exit.
    pub amount_gwei: u64,
}

impl WithdrawalRequest {
    /// Whether this is a full exit request.
    pub fn is_full_exit(&self) -> bool {
        self.amount_gwei == 0
    }

    /// Calldata sent to the withdrawal request contract.
    pub fn calldata(&self) -> Bytes {
        let mut data = Vec::with_capacity(WITHDRAWAL_REQUEST_CALLDATA_LENGTH);
        data.extend_from_slice(self.pubkey.as_slice());
        data.extend_from_slice(&self.amount_gwei.to_be_bytes());
        Bytes::from(data)
    }
}

/// A single EIP-7251 consolidation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationRequest {
    /// Validator being consolidated away.
    pub source_pubkey: FixedBytes<48>,
    /// Validator receiving the balance.
    pub target_pubkey: FixedBytes<48>,
}

impl ConsolidationRequest {
    /// Calldata sent to the consolidation request contract.
    pub fn calldata(&self) -> Bytes {
        let mut data = Vec::with_capacity(CONSOLIDATION_REQUEST_CALLDATA_LENGTH);
        data.extend_from_slice(self.source_pubkey.as_slice());
        data.extend_from_slice(self.target_pubkey.as_slice());
        Bytes::from(data)
    }
}

/// Split packed pubkeys into 48-byte keys.
pub fn split_pubkeys(packed: &[u8]) -> Result<Vec<FixedBytes<48>>, RequestError> {
    if packed.is_empty() {
        return Err(RequestError::NoRequests);
    }
    if packed.len() % PUBLIC_KEY_LENGTH != 0 {
        return Err(RequestError::InvalidPublicKeysLength(packed.len()));
    }
    Ok(packed.chunks_exact(PUBLIC_KEY_LENGTH).map(FixedBytes::<48>::from_slice).collect())
}

/// Full exit requests (amount zero) for every packed pubkey.
pub fn full_exit_requests(packed: &[u8]) -> Result<Vec<WithdrawalRequest>, RequestError> {
    Ok(split_pubkeys(packed)?
        .into_iter()
        .map(|pubkey| WithdrawalRequest { pubkey, amount_gwei: 0 })
        .collect())
}

/// Partial withdrawal requests pairing each pubkey with its amount.
pub fn partial_withdrawal_requests(
    packed: &[u8],
    amounts_gwei: &[u64],
) -> Result<Vec<WithdrawalRequest>, RequestError> {
    let keys = split_pubkeys(packed)?;
    if keys.len() != amounts_gwei.len() {
        return Err(RequestError::MismatchedArrayLengths {
            keys: keys.len(),
            amounts: amounts_gwei.len(),
        });
    }
    Ok(keys
        .into_iter()
        .zip(amounts_gwei.iter().copied())
        .map(|(pubkey, amount_gwei)| WithdrawalRequest { pubkey, amount_gwei })
        .collect())
}

/// Withdrawal requests: full exits when `amounts_gwei` is empty, partial otherwise.
pub fn withdrawal_requests(
    packed: &[u8],
    amounts_gwei: &[u64],
) -> Result<Vec<WithdrawalRequest>, RequestError> {
    if amounts_gwei.is_empty() {
        full_exit_requests(packed)
    } else {
        partial_withdrawal_requests(packed, amounts_gwei)
    }
}

/// Consolidation requests pairing sources with targets.
pub fn consolidation_requests(
    sources: &[u8],
    targets: &[u8],
) -> Result<Vec<ConsolidationRequest>, RequestError> {
    let sources = split_pubkeys(sources)?;
    let targets = split_pubkeys(targets)?;
    if sources.len() != targets.len() {
        return Err(RequestError::MismatchedArrayLengths {
            keys: sources.len(),
            amounts: targets.len(),
        });
    }
    Ok(sources
        .into_iter()
        .zip(targets)
        .map(|(source_pubkey, target_pubkey)| ConsolidationRequest { source_pubkey, target_pubkey })
        .collect())
}

/// Check that `provided` covers `count` requests at `fee_per_request`.
///
/// Returns the excess to refund.
pub fn check_request_fee(
    count: usize,
    fee_per_request: U256,
    provided: U256,
) -> Result<U256, RequestError> {
    let required = fee_per_request
        .checked_mul(U256::from(count))
        .ok_or(RequestError::FeeOverflow)?;
    if provided < required {
        return Err(RequestError::InsufficientFee { provided, required });
    }
    Ok(provided - required)
}

/// Total amount requested across partial withdrawals, in gwei.
pub fn total_requested_gwei(requests: &[WithdrawalRequest]) -> Result<u64, RequestError> {
    requests
        .iter()
        .try_fold(0u64, |acc, r| acc.safe_add(r.amount_gwei))
        .map_err(|_| RequestError::AmountOverflow)
}
