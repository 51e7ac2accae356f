//! BLS12-381 field elements and points in EIP-2537 byte layout.
//!
//! ```text
//! Fp        64 bytes   16 zero bytes ‖ 48-byte big-endian value
//! Fp2      128 bytes   c0 ‖ c1
//! G1 point 128 bytes   x ‖ y                 (Fp each)
//! G2 point 256 bytes   x.c0 ‖ x.c1 ‖ y.c0 ‖ y.c1
//! ```
//!
//! The point at infinity is encoded as all zeros.

use alloy_primitives::FixedBytes;
use hex_literal::hex;
use serde::{Deserialize, Serialize};

use super::error::PrecompileError;

/// Unpadded field element length.
pub const FP_LENGTH: usize = 48;

/// Field element length in precompile encoding.
pub const PADDED_FP_LENGTH: usize = 64;

/// Zero padding in front of each encoded field element.
pub const FP_PADDING_LENGTH: usize = PADDED_FP_LENGTH - FP_LENGTH;

/// Encoded `Fp2` length.
pub const PADDED_FP2_LENGTH: usize = 2 * PADDED_FP_LENGTH;

/// Encoded G1 point length.
pub const G1_POINT_LENGTH: usize = 2 * PADDED_FP_LENGTH;

/// Encoded G2 point length.
pub const G2_POINT_LENGTH: usize = 2 * PADDED_FP2_LENGTH;

/// One `(G1, G2)` pair of pairing-check input.
pub const PAIRING_PAIR_LENGTH: usize = G1_POINT_LENGTH + G2_POINT_LENGTH;

/// Big-endian base field element.
pub type Fp = FixedBytes<FP_LENGTH>;

/// Base field modulus `p`.
pub const FIELD_MODULUS: Fp = FixedBytes(hex!(
    "1a0111ea397fe69a4b1ba7b6434bacd764774b84f38512bf6730d2a0f6b0f6241eabfffeb153ffffb9feffffffffaaab"
));

/// `(p - 1) / 2`; elements above it are "lexicographically largest".
pub const HALF_FIELD_MODULUS: Fp = FixedBytes(hex!(
    "0d0088f51cbff34d258dd3db21a5d66bb23ba5c279c2895fb39869507b587b120f55ffff58a9ffffdcff7fffffffd555"
));

/// X coordinate of the G1 generator.
pub const G1_GENERATOR_X: Fp = FixedBytes(hex!(
    "17f1d3a73197d7942695638c4fa9ac0fc3688c4f9774b905a14e3a3f171bac586c55e83ff97a1aeffb3af00adb22c6bb"
));

/// Y coordinate of the negated G1 generator, `p - G1.y`.
pub const NEG_G1_GENERATOR_Y: Fp = FixedBytes(hex!(
    "114d1d6855d545a8aa7d76c8cf2e21f267816aef1db507c96655b9d5caac42364e6f38ba0ecb751bad54dcd6b939c2ca"
));

/// Whether `fp < p`. Equal-length big-endian arrays compare numerically.
pub fn is_canonical(fp: &Fp) -> bool {
    *fp < FIELD_MODULUS
}

/// Whether `fp > (p - 1) / 2`.
pub fn is_lexicographically_largest(fp: &Fp) -> bool {
    *fp > HALF_FIELD_MODULUS
}

/// Encode a field element with its 16-byte zero padding.
pub fn encode_fp(fp: &Fp, out: &mut [u8]) {
    out[..FP_PADDING_LENGTH].fill(0);
    out[FP_PADDING_LENGTH..PADDED_FP_LENGTH].copy_from_slice(fp.as_slice());
}

/// Decode a padded field element, rejecting non-zero padding and values `>= p`.
pub fn decode_fp(bytes: &[u8]) -> Result<Fp, PrecompileError> {
    if bytes.len() != PADDED_FP_LENGTH {
        return Err(PrecompileError::InvalidInputLength {
            expected: PADDED_FP_LENGTH,
            actual: bytes.len(),
        });
    }
    if bytes[..FP_PADDING_LENGTH].iter().any(|b| *b != 0) {
        return Err(PrecompileError::NonCanonicalFieldElement);
    }
    let fp = Fp::from_slice(&bytes[FP_PADDING_LENGTH..]);
    if !is_canonical(&fp) {
        return Err(PrecompileError::NonCanonicalFieldElement);
    }
    Ok(fp)
}

/// Element of the quadratic extension `Fp2 = Fp[u] / (u^2 + 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fp2 {
    /// Real component.
    pub c0: Fp,
    /// Imaginary component.
    pub c1: Fp,
}

impl Fp2 {
    /// Create a new element.
    pub const fn new(c0: Fp, c1: Fp) -> Self {
        Self { c0, c1 }
    }

    /// Sign of the element: taken from `c1`, or from `c0` when `c1` is zero.
    pub fn is_lexicographically_largest(&self) -> bool {
        if self.c1.is_zero() {
            is_lexicographically_largest(&self.c0)
        } else {
            is_lexicographically_largest(&self.c1)
        }
    }

    /// Whether both components are zero.
    pub fn is_zero(&self) -> bool {
        self.c0.is_zero() && self.c1.is_zero()
    }

    /// Precompile encoding.
    pub fn encode(&self) -> [u8; PADDED_FP2_LENGTH] {
        let mut out = [0u8; PADDED_FP2_LENGTH];
        encode_fp(&self.c0, &mut out[..PADDED_FP_LENGTH]);
        encode_fp(&self.c1, &mut out[PADDED_FP_LENGTH..]);
        out
    }

    /// Decode from precompile encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, PrecompileError> {
        if bytes.len() != PADDED_FP2_LENGTH {
            return Err(PrecompileError::InvalidInputLength {
                expected: PADDED_FP2_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            c0: decode_fp(&bytes[..PADDED_FP_LENGTH])?,
            c1: decode_fp(&bytes[PADDED_FP_LENGTH..])?,
        })
    }
}

/// Affine G1 point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct G1Point {
    pub x: Fp,
    pub y: Fp,
}

impl G1Point {
    /// `-G1`, the negated generator.
    pub const NEG_GENERATOR: G1Point = G1Point { x: G1_GENERATOR_X, y: NEG_G1_GENERATOR_Y };

    /// Whether this is the all-zero encoding of infinity.
    pub fn is_infinity(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Precompile encoding.
    pub fn encode(&self) -> [u8; G1_POINT_LENGTH] {
        let mut out = [0u8; G1_POINT_LENGTH];
        encode_fp(&self.x, &mut out[..PADDED_FP_LENGTH]);
        encode_fp(&self.y, &mut out[PADDED_FP_LENGTH..]);
        out
    }

    /// Decode from precompile encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, PrecompileError> {
        if bytes.len() != G1_POINT_LENGTH {
            return Err(PrecompileError::InvalidInputLength {
                expected: G1_POINT_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            x: decode_fp(&bytes[..PADDED_FP_LENGTH])?,
            y: decode_fp(&bytes[PADDED_FP_LENGTH..])?,
        })
    }
}

/// Affine G2 point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct G2Point {
    pub x: Fp2,
    pub y: Fp2,
}

impl G2Point {
    /// Whether this is the all-zero encoding of infinity.
    pub fn is_infinity(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Precompile encoding.
    pub fn encode(&self) -> [u8; G2_POINT_LENGTH] {
        let mut out = [0u8; G2_POINT_LENGTH];
        out[..PADDED_FP2_LENGTH].copy_from_slice(&self.x.encode());
        out[PADDED_FP2_LENGTH..].copy_from_slice(&self.y.encode());
        out
    }

    /// Decode from precompile encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, PrecompileError> {
        if bytes.len() != G2_POINT_LENGTH {
            return Err(PrecompileError::InvalidInputLength {
                expected: G2_POINT_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            x: Fp2::decode(&bytes[..PADDED_FP2_LENGTH])?,
            y: Fp2::decode(&bytes[PADDED_FP2_LENGTH..])?,
        })
    }
}
