//! Hashing helpers shared by the merkleizer.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

/// Height of the smallest power-of-two tree holding `n_leaves`.
pub fn tree_height(n_leaves: usize) -> usize {
    if n_leaves <= 1 {
        return 0;
    }

    let mut height = 0;
    let mut size = 1;

    while size < n_leaves {
        size <<= 1;
        height += 1;
    }

    height
}

/// Compute the Merkle root of an all-zero SSZ-style tree of `height`.
///
/// Height meaning:
/// - 0 → leaf: zero hash
/// - n → hash upward n times (H(node || node))
pub fn zero_tree_root(height: usize) -> B256 {
    let mut node = B256::ZERO;
    for _ in 0..height {
        node = sha256_pair(&node, &node);
    }
    node
}

/// `SHA256(left || right)`.
#[inline]
pub fn sha256_pair(left: &B256, right: &B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(left.as_slice());
    hasher.update(right.as_slice());
    B256::from_slice(&hasher.finalize())
}

/// `SHA256(data)`.
#[inline]
pub fn sha256(data: &[u8]) -> B256 {
    B256::from_slice(&Sha256::digest(data))
}

/// SSZ basic-type chunk for a `uint64`: little endian, right padded.
#[inline]
pub fn to_little_endian(value: u64) -> B256 {
    let mut chunk = B256::ZERO;
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    chunk
}

/// SSZ chunk for a `boolean`.
#[inline]
pub fn bool_chunk(value: bool) -> B256 {
    let mut chunk = B256::ZERO;
    chunk[0] = value as u8;
    chunk
}
