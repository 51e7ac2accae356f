//! SSZ hash-tree-roots and Merkle proof verification.

use alloy_primitives::B256;
use tracing::trace;

use super::error::SszError;
use super::gindex::GIndex;
use super::types::{BeaconBlockHeader, DepositData, DepositMessage, Validator};
use super::utils::{bool_chunk, sha256_pair, to_little_endian, tree_height, zero_tree_root};

/// Length of a compressed BLS public key.
pub const PUBKEY_LENGTH: usize = 48;

/// Length of a compressed BLS signature.
pub const SIGNATURE_LENGTH: usize = 96;

/// Types with an SSZ hash tree root.
pub trait HashTreeRoot {
    /// Root of the SSZ Merkle tree of `self`.
    fn hash_tree_root(&self) -> B256;
}

/// Merkleize a power-of-two number of chunks by halving in place.
fn merkleize_fixed<const N: usize>(mut nodes: [B256; N]) -> B256 {
    debug_assert!(N.is_power_of_two());
    let mut count = N;
    while count > 1 {
        for i in 0..count / 2 {
            nodes[i] = sha256_pair(&nodes[2 * i], &nodes[2 * i + 1]);
        }
        count /= 2;
    }
    nodes[0]
}

/// Hash tree root of a 48-byte BLS public key (`Bytes48`: two chunks).
pub fn pubkey_hash_tree_root(pubkey: &[u8]) -> Result<B256, SszError> {
    if pubkey.len() != PUBKEY_LENGTH {
        return Err(SszError::InvalidPubkeyLength(pubkey.len()));
    }
    let mut chunks = [B256::ZERO; 2];
    chunks[0].copy_from_slice(&pubkey[..32]);
    chunks[1][..16].copy_from_slice(&pubkey[32..]);
    Ok(merkleize_fixed(chunks))
}

/// Hash tree root of a 96-byte BLS signature (`Bytes96`: three chunks, padded to four).
pub fn signature_hash_tree_root(signature: &[u8]) -> Result<B256, SszError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SszError::InvalidSignatureLength(signature.len()));
    }
    let mut chunks = [B256::ZERO; 4];
    for (chunk, bytes) in chunks.iter_mut().zip(signature.chunks(32)) {
        chunk.copy_from_slice(bytes);
    }
    Ok(merkleize_fixed(chunks))
}

impl HashTreeRoot for BeaconBlockHeader {
    fn hash_tree_root(&self) -> B256 {
        merkleize_fixed([
            to_little_endian(self.slot),
            to_little_endian(self.proposer_index),
            self.parent_root,
            self.state_root,
            self.body_root,
            B256::ZERO,
            B256::ZERO,
            B256::ZERO,
        ])
    }
}

impl HashTreeRoot for Validator {
    fn hash_tree_root(&self) -> B256 {
        // FixedBytes<48> always has the right length
        let pubkey_root = merkleize_fixed(split_pubkey(self.pubkey.as_slice()));
        merkleize_fixed([
            pubkey_root,
            self.withdrawal_credentials,
            to_little_endian(self.effective_balance),
            bool_chunk(self.slashed),
            to_little_endian(self.activation_eligibility_epoch),
            to_little_endian(self.activation_epoch),
            to_little_endian(self.exit_epoch),
            to_little_endian(self.withdrawable_epoch),
        ])
    }
}

impl HashTreeRoot for DepositMessage {
    fn hash_tree_root(&self) -> B256 {
        let pubkey_root = merkleize_fixed(split_pubkey(self.pubkey.as_slice()));
        merkleize_fixed([
            pubkey_root,
            self.withdrawal_credentials,
            to_little_endian(self.amount),
            B256::ZERO,
        ])
    }
}

impl HashTreeRoot for DepositData {
    fn hash_tree_root(&self) -> B256 {
        let pubkey_root = merkleize_fixed(split_pubkey(self.pubkey.as_slice()));
        let mut signature_chunks = [B256::ZERO; 4];
        for (chunk, bytes) in signature_chunks.iter_mut().zip(self.signature.chunks(32)) {
            chunk.copy_from_slice(bytes);
        }
        merkleize_fixed([
            pubkey_root,
            self.withdrawal_credentials,
            to_little_endian(self.amount),
            merkleize_fixed(signature_chunks),
        ])
    }
}

fn split_pubkey(pubkey: &[u8]) -> [B256; 2] {
    let mut chunks = [B256::ZERO; 2];
    chunks[0].copy_from_slice(&pubkey[..32]);
    chunks[1][..16].copy_from_slice(&pubkey[32..PUBKEY_LENGTH]);
    chunks
}

/// Signing root of a deposit message: `H(message_root || domain)`.
///
/// Deposits are signed over the bare deposit domain (no genesis validators
/// root), so `domain` is passed in ready to use.
pub fn deposit_message_signing_root(
    pubkey: &[u8],
    amount_gwei: u64,
    withdrawal_credentials: B256,
    domain: B256,
) -> Result<B256, SszError> {
    let pubkey_root = pubkey_hash_tree_root(pubkey)?;
    let message_root = sha256_pair(
        &sha256_pair(&pubkey_root, &withdrawal_credentials),
        &sha256_pair(&to_little_endian(amount_gwei), &B256::ZERO),
    );
    let signing_root = sha256_pair(&message_root, &domain);
    trace!(target: "vaults::ssz", %message_root, %signing_root, "Deposit signing root");
    Ok(signing_root)
}

/// Root passed as `deposit_data_root` to the deposit contract.
pub fn deposit_data_root(
    pubkey: &[u8],
    withdrawal_credentials: B256,
    signature: &[u8],
    amount_gwei: u64,
) -> Result<B256, SszError> {
    let pubkey_root = pubkey_hash_tree_root(pubkey)?;
    let signature_root = signature_hash_tree_root(signature)?;
    Ok(sha256_pair(
        &sha256_pair(&pubkey_root, &withdrawal_credentials),
        &sha256_pair(&to_little_endian(amount_gwei), &signature_root),
    ))
}

/// Domain type for deposits.
pub const DOMAIN_DEPOSIT: [u8; 4] = [0x03, 0x00, 0x00, 0x00];

/// Deposit domain for a genesis fork version.
///
/// `DOMAIN_DEPOSIT || fork_data_root[..28]` where the fork data root is taken
/// over the fork version and an all-zero genesis validators root.
pub fn compute_deposit_domain(genesis_fork_version: [u8; 4]) -> B256 {
    let mut version_chunk = B256::ZERO;
    version_chunk[..4].copy_from_slice(&genesis_fork_version);
    let fork_data_root = sha256_pair(&version_chunk, &B256::ZERO);

    let mut domain = B256::ZERO;
    domain[..4].copy_from_slice(&DOMAIN_DEPOSIT);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Verify a Merkle branch for `leaf` at `gindex` against `root`.
///
/// The low bit of the index picks the concatenation order at each level:
/// even means the current node is a left child. The walk must end exactly at
/// the root (index `1`) when the proof is exhausted.
pub fn verify_proof(
    proof: &[B256],
    root: B256,
    leaf: B256,
    gindex: GIndex,
) -> Result<(), SszError> {
    if proof.is_empty() {
        return Err(SszError::InvalidProof);
    }

    let mut index = gindex.index();
    let mut node = leaf;

    for sibling in proof {
        node = if index & 1 == 0 {
            sha256_pair(&node, sibling)
        } else {
            sha256_pair(sibling, &node)
        };
        index >>= 1;
        if index == 0 {
            return Err(SszError::BranchHasExtraItem);
        }
    }

    if index != 1 {
        return Err(SszError::BranchHasMissingItem);
    }

    if node != root {
        return Err(SszError::InvalidProof);
    }

    Ok(())
}

/// Deepest [`MerkleTree`]; leaves of deeper trees have no `u64` generalized index.
pub const MAX_TREE_DEPTH: usize = 63;

/// Fully materialised binary Merkle tree over 32-byte leaves.
///
/// Leaves are zero-padded up to the next power of two. Used to produce
/// branches for [`verify_proof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `layers[0]` are the padded leaves, the last layer holds the root.
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Build a tree over `leaves`.
    pub fn new(leaves: &[B256]) -> Result<Self, SszError> {
        Self::with_depth(leaves, tree_height(leaves.len()))
    }

    /// Build a tree of fixed `depth`, padding with zero subtrees.
    ///
    /// `depth` is at most [`MAX_TREE_DEPTH`] so every leaf has a `u64`
    /// generalized index. Leaves beyond `2^depth` are ignored.
    pub fn with_depth(leaves: &[B256], depth: usize) -> Result<Self, SszError> {
        if depth > MAX_TREE_DEPTH {
            return Err(SszError::GIndexOverflow);
        }
        let width = 1usize.checked_shl(depth as u32).ok_or(SszError::GIndexOverflow)?;
        let mut layer: Vec<B256> = leaves.iter().copied().take(width).collect();
        layer.resize(width, zero_tree_root(0));

        let mut layers = vec![layer];
        for height in 0..depth {
            let next = layers[height]
                .chunks_exact(2)
                .map(|pair| sha256_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(next);
        }

        Ok(Self { layers })
    }

    /// Tree depth.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Tree root.
    pub fn root(&self) -> B256 {
        self.layers[self.depth()][0]
    }

    /// Generalized index of leaf `index`.
    pub fn gindex(&self, index: usize) -> Result<GIndex, SszError> {
        GIndex::from_depth_and_position(self.depth() as u32, index as u64)
    }

    /// Sibling hashes from leaf `index` up to (not including) the root.
    pub fn proof(&self, index: usize) -> Result<Vec<B256>, SszError> {
        let len = self.layers[0].len();
        if index >= len {
            return Err(SszError::LeafOutOfBounds { index, len });
        }
        let mut position = index;
        let mut branch = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.depth()] {
            branch.push(layer[position ^ 1]);
            position >>= 1;
        }
        Ok(branch)
    }
}
