//! Beacon-chain facing call builders.
//!
//! - [`deposit`]: withdrawal credentials and verified deposit contract calls
//! - [`requests`]: EIP-7002 withdrawal and EIP-7251 consolidation requests

pub mod deposit;
pub mod requests;

pub use deposit::{
    withdrawal_credentials, DepositTransaction, VerifiedDeposit, COMPOUNDING_WITHDRAWAL_PREFIX,
    ETH1_ADDRESS_WITHDRAWAL_PREFIX, MAINNET_DEPOSIT_CONTRACT,
};
pub use requests::{
    check_request_fee, consolidation_requests, split_pubkeys, total_requested_gwei,
    withdrawal_requests, ConsolidationRequest, RequestError, WithdrawalRequest,
};
