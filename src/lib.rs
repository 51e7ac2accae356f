//! Staking vault core
//!
//! Fee accounting and role-gated operations for a staking vault connected to a
//! vault hub, plus the BLS12-381 and SSZ machinery used to check validator
//! deposits before they are sent to the deposit contract.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         staking-vaults                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────────────┐          ┌─────────────────────────────┐   │
//! │  │  NodeOperatorFee    │          │        VerifiedDeposit      │   │
//! │  │  (fee)              │          │        (beacon)             │   │
//! │  └──────────┬──────────┘          └──────────────┬──────────────┘   │
//! │             │                                    │                  │
//! │  ┌──────────▼──────────┐          ┌──────────────▼──────────────┐   │
//! │  │  Permissions        │          │  verify_deposit_message     │   │
//! │  │  roles + confirms   │          │  (bls)                      │   │
//! │  └──────────┬──────────┘          └──────┬───────────────┬──────┘   │
//! │             │                            │               │          │
//! │  ┌──────────▼──────────┐          ┌──────▼──────┐ ┌──────▼──────┐   │
//! │  │  VaultHub (hub)     │          │ hash_to_g2  │ │ signing root│   │
//! │  │  reports, withdraw  │          │ pairing     │ │ (ssz)       │   │
//! │  └─────────────────────┘          └─────────────┘ └─────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`fee`]: node operator fee engine
//! - [`permissions`]: roles, capabilities and multi-role confirmations
//! - [`hub`]: vault hub traits and an in-memory hub
//! - [`bls`]: BLS12-381 deposit signature verification
//! - [`ssz`]: SSZ merkleization and Merkle proofs
//! - [`beacon`]: deposit call data and EIP-7002/7251 requests
//! - [`vault`]: reports, events and call context
//! - [`safe_arith`]: overflow-checked arithmetic

#![warn(unused_crate_dependencies)]
// Dependencies used by the binary
use clap as _;
use eyre as _;
use tracing_subscriber as _;

pub mod beacon;
pub mod bls;
pub mod fee;
pub mod hub;
pub mod permissions;
pub mod safe_arith;
pub mod ssz;
pub mod vault;

pub use beacon::{withdrawal_credentials, DepositTransaction, VerifiedDeposit, WithdrawalRequest};
pub use bls::{verify_deposit_message, BlsError, BlstPrecompiles, DepositY};
pub use fee::{FeeBreakdown, FeeError, NodeOperatorFee, VaultConfig};
pub use hub::{HubError, InMemoryVaultHub, ReportProvider, VaultHub, VaultOperations};
pub use permissions::{Permissions, PermissionsError, Role};
pub use ssz::{verify_proof, GIndex, HashTreeRoot, SszError};
pub use vault::{CallContext, Quarantine, Report, VaultEvent};
