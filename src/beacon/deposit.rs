//! Deposit contract call builders.
//!
//! Deposits are only turned into call data after their BLS signature has been
//! verified, see [`VerifiedDeposit::new`].

use alloy_primitives::{address, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bls::{amount_to_gwei, verify_deposit_message, Bls12381Precompiles, BlsError, DepositY};
use crate::ssz::{deposit_data_root, DepositData};

/// Mainnet beacon deposit contract.
pub const MAINNET_DEPOSIT_CONTRACT: Address =
    address!("0x00000000219ab540356cBB839Cbe05303d7705Fa");

/// Withdrawal credentials prefix for execution-layer addresses.
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

/// Withdrawal credentials prefix for compounding validators (EIP-7251).
pub const COMPOUNDING_WITHDRAWAL_PREFIX: u8 = 0x02;

sol! {
    /// Beacon deposit contract entry point.
    function deposit(
        bytes pubkey,
        bytes withdrawal_credentials,
        bytes signature,
        bytes32 deposit_data_root
    ) external payable;
}

/// Withdrawal credentials pointing at `withdrawal_address`.
///
/// `prefix || 11 zero bytes || address`.
pub fn withdrawal_credentials(prefix: u8, withdrawal_address: Address) -> B256 {
    let mut credentials = [0u8; 32];
    credentials[0] = prefix;
    credentials[12..].copy_from_slice(withdrawal_address.as_slice());
    B256::from(credentials)
}

/// Unsigned transaction to the deposit contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTransaction {
    /// Deposit contract address.
    pub to: Address,
    /// ABI-encoded `deposit(...)` call.
    pub data: Bytes,
    /// Ether sent with the call, in wei.
    pub value: U256,
}

/// A deposit whose signature has been checked against its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedDeposit {
    data: DepositData,
    deposit_data_root: B256,
}

impl VerifiedDeposit {
    /// Verify the deposit signature and compute its data root.
    ///
    /// `amount_wei` must be a whole number of gwei.
    pub fn new<P: Bls12381Precompiles>(
        precompiles: &P,
        pubkey: FixedBytes<48>,
        signature: FixedBytes<96>,
        amount_wei: u128,
        deposit_y: &DepositY,
        withdrawal_credentials: B256,
        domain: B256,
    ) -> Result<Self, BlsError> {
        verify_deposit_message(
            precompiles,
            pubkey.as_slice(),
            signature.as_slice(),
            amount_wei,
            deposit_y,
            withdrawal_credentials,
            domain,
        )?;

        let amount = amount_to_gwei(amount_wei)?;
        let root =
            deposit_data_root(pubkey.as_slice(), withdrawal_credentials, signature.as_slice(), amount)?;
        debug!(target: "vaults::bls", %pubkey, %root, "Deposit verified");

        Ok(Self {
            data: DepositData { pubkey, withdrawal_credentials, amount, signature },
            deposit_data_root: root,
        })
    }

    /// The verified deposit data; amount in gwei.
    pub fn data(&self) -> &DepositData {
        &self.data
    }

    /// SSZ root of the deposit data.
    pub fn deposit_data_root(&self) -> B256 {
        self.deposit_data_root
    }

    /// Deposit amount in wei.
    pub fn value(&self) -> U256 {
        U256::from(self.data.amount) * U256::from(crate::vault::GWEI)
    }

    /// ABI-encoded `deposit(bytes,bytes,bytes,bytes32)` call.
    pub fn calldata(&self) -> Bytes {
        let call = depositCall {
            pubkey: Bytes::copy_from_slice(self.data.pubkey.as_slice()),
            withdrawal_credentials: Bytes::copy_from_slice(
                self.data.withdrawal_credentials.as_slice(),
            ),
            signature: Bytes::copy_from_slice(self.data.signature.as_slice()),
            deposit_data_root: self.deposit_data_root,
        };
        Bytes::from(call.abi_encode())
    }

    /// Unsigned transaction depositing to `deposit_contract`.
    pub fn transaction(&self, deposit_contract: Address) -> DepositTransaction {
        let tx = DepositTransaction {
            to: deposit_contract,
            data: self.calldata(),
            value: self.value(),
        };
        info!(target: "vaults::bls", to = %tx.to, value = %tx.value, "Built deposit transaction");
        tx
    }
}
