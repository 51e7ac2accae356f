//! Error types for BLS deposit verification.

use crate::ssz::SszError;

/// Failure of a single EIP-2537 precompile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PrecompileError {
    /// Input has the wrong number of bytes.
    #[error("invalid precompile input length {actual}, expected {expected}")]
    InvalidInputLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Field element padding is non-zero or the value is not below the modulus.
    #[error("field element is not canonical")]
    NonCanonicalFieldElement,

    /// Point does not satisfy the curve equation.
    #[error("point is not on the curve")]
    PointNotOnCurve,

    /// Point is on the curve but outside the prime-order subgroup.
    #[error("point is not in the correct subgroup")]
    PointNotInSubgroup,
}

/// Errors raised by deposit signature verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlsError {
    /// Public key is not 48 bytes.
    #[error("invalid pubkey length {0}, expected 48")]
    InvalidPubkeyLength(usize),

    /// Signature is not 96 bytes.
    #[error("invalid signature length {0}, expected 96")]
    InvalidSignatureLength(usize),

    /// Compression flag of a compressed point is not set.
    #[error("compression flag is not set")]
    InvalidCompressionFlag,

    /// Infinity flag is set, or a point decodes to infinity.
    #[error("input has infinity points")]
    InputHasInfinityPoints,

    /// Sign flag disagrees with the supplied Y coordinate.
    #[error("compressed component sign bit does not match Y coordinate")]
    InvalidCompressedComponentSignBit,

    /// Output or DST length outside what `expand_message_xmd` supports.
    #[error("expand_message_xmd: cannot produce {len_in_bytes} bytes with a {dst_len}-byte dst")]
    InvalidExpandLength {
        /// Requested output length.
        len_in_bytes: usize,
        /// Domain separation tag length.
        dst_len: usize,
    },

    /// Deposit amount is not a whole number of gwei or does not fit `u64` gwei.
    #[error("invalid deposit amount {0} wei")]
    InvalidDepositAmount(u128),

    /// `MAP_FP2_TO_G2` failed.
    #[error("map fp2 to g2 failed: {0}")]
    MapFp2ToG2Failed(PrecompileError),

    /// `G2ADD` failed.
    #[error("g2 add failed: {0}")]
    AddG2Failed(PrecompileError),

    /// `PAIRING_CHECK` failed to run.
    #[error("pairing check failed: {0}")]
    PairingFailed(PrecompileError),

    /// Pairing ran and returned false.
    #[error("invalid signature")]
    InvalidSignature,

    /// Signing root computation failed.
    #[error(transparent)]
    Ssz(#[from] SszError),
}
