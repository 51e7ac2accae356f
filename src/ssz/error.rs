//! Error types for SSZ merkleization and proof verification.

/// Errors raised by the SSZ helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SszError {
    /// Proof is empty or the reconstructed root does not match.
    #[error("invalid merkle proof")]
    InvalidProof,

    /// Proof ran out before the generalized index reached the root.
    #[error("merkle branch has a missing item")]
    BranchHasMissingItem,

    /// Generalized index reached the root before the proof ran out.
    #[error("merkle branch has an extra item")]
    BranchHasExtraItem,

    /// Public key is not 48 bytes.
    #[error("invalid pubkey length {0}, expected 48")]
    InvalidPubkeyLength(usize),

    /// Signature is not 96 bytes.
    #[error("invalid signature length {0}, expected 96")]
    InvalidSignatureLength(usize),

    /// Generalized index zero does not address a node.
    #[error("generalized index cannot be zero")]
    ZeroGIndex,

    /// Generalized index arithmetic left the `u64` range.
    #[error("generalized index overflow")]
    GIndexOverflow,

    /// Shift moved a generalized index outside its depth.
    #[error("generalized index {index} shifted by {shift} leaves depth {depth}")]
    IndexOutOfRange {
        /// Original index.
        index: u64,
        /// Requested shift.
        shift: u64,
        /// Depth of the index.
        depth: u32,
    },

    /// Leaf position outside the tree.
    #[error("leaf {index} out of bounds for {len} leaves")]
    LeafOutOfBounds {
        /// Requested leaf.
        index: usize,
        /// Leaf count (padded).
        len: usize,
    },
}
