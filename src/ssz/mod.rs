//! SSZ merkleization for beacon-chain containers.
//!
//! Provides:
//! - hash tree roots of `BeaconBlockHeader`, `Validator` and deposit containers
//! - Merkle branch verification against a generalized index
//! - the deposit signing root shared with the BLS verifier
//!
//! ```text
//!                root (gindex 1)
//!              /                \
//!          2                      3
//!        /   \                  /   \
//!      4       5              6       7
//!     / \     / \            / \     / \
//!    8   9  10   11        12   13 14   15      <- 8 leaves (depth 3)
//!  slot prop parent state  body  0    0    0    <- BeaconBlockHeader
//! ```

mod error;
mod gindex;
mod merkle;
mod types;
mod utils;

pub use error::SszError;
pub use gindex::GIndex;
pub use merkle::{
    compute_deposit_domain, deposit_data_root, deposit_message_signing_root,
    pubkey_hash_tree_root, signature_hash_tree_root, verify_proof, HashTreeRoot, MerkleTree,
    DOMAIN_DEPOSIT, MAX_TREE_DEPTH, PUBKEY_LENGTH, SIGNATURE_LENGTH,
};
pub use types::{BeaconBlockHeader, DepositData, DepositMessage, Validator};
pub use utils::{sha256, sha256_pair, to_little_endian, tree_height, zero_tree_root};
