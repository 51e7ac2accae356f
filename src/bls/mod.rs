//! BLS12-381 deposit signature verification over EIP-2537 precompiles.
//!
//! ```text
//!  pubkey (48) ─┐                 signature (96) ─┐
//!  pubkey_y ────┤ flags            signature_y ────┤ flags
//!               ▼                                  ▼
//!            G1 point                          G2 point
//!                                                  │
//!  deposit message ── signing root ── hash_to_g2 ──┤
//!                                                  ▼
//!          PAIRING_CHECK( pk, H(m) ; -G1, sig ) == 1
//! ```
//!
//! Points arrive compressed, with their Y coordinates supplied next to them
//! ([`DepositY`]); the verifier checks that the Y values agree with the sign
//! flags instead of decompressing.

mod error;
mod fields;
mod hash_to_curve;
mod precompile;
mod verify;

pub use error::{BlsError, PrecompileError};
pub use fields::{
    Fp, Fp2, G1Point, G2Point, FIELD_MODULUS, G1_POINT_LENGTH, G2_POINT_LENGTH,
    PAIRING_PAIR_LENGTH,
};
pub use hash_to_curve::{expand_message_xmd, hash_to_field_fp2, hash_to_g2, DST};
pub use precompile::{Bls12381Precompiles, BlstPrecompiles};
pub use verify::{
    amount_to_gwei, validate_compressed_pubkey_flags, validate_compressed_signature_flags,
    verify_deposit_message, DepositY,
};

#[cfg(test)]
pub(crate) use verify::tests::{deposit_vector, DepositVector};
