//! Hash to G2 for the proof-of-possession ciphersuite (RFC 9380).

use alloy_primitives::U512;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::BlsError;
use super::fields::{Fp, Fp2, G2Point, FIELD_MODULUS, FP_LENGTH, G2_POINT_LENGTH};
use super::precompile::Bls12381Precompiles;

/// Domain separation tag of the Ethereum consensus BLS signature scheme.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// SHA-256 input block size.
const S_IN_BYTES: usize = 64;

/// SHA-256 output size.
const B_IN_BYTES: usize = 32;

/// Most SHA-256 blocks `expand_message_xmd` may produce.
const MAX_ELL: usize = 255;

/// Bytes per field element drawn from the expanded message (`L` in RFC 9380).
const L: usize = 64;

/// Uniform bytes needed for two `Fp2` elements.
const LEN_IN_BYTES: usize = 2 * 2 * L;

/// `expand_message_xmd` with SHA-256.
///
/// Fails when `len_in_bytes` is zero or above `255 * 32`, or `dst` is longer
/// than 255 bytes.
pub fn expand_message_xmd(
    message: &[u8],
    dst: &[u8],
    len_in_bytes: usize,
) -> Result<Vec<u8>, BlsError> {
    let invalid = || BlsError::InvalidExpandLength { len_in_bytes, dst_len: dst.len() };
    let ell = len_in_bytes.div_ceil(B_IN_BYTES);
    if len_in_bytes == 0 || ell > MAX_ELL {
        return Err(invalid());
    }
    let dst_len = u8::try_from(dst.len()).map_err(|_| invalid())?;
    let len_prefix = u16::try_from(len_in_bytes).map_err(|_| invalid())?;

    let mut dst_prime = dst.to_vec();
    dst_prime.push(dst_len);

    let b_0 = Sha256::new()
        .chain_update([0u8; S_IN_BYTES])
        .chain_update(message)
        .chain_update(len_prefix.to_be_bytes())
        .chain_update([0u8])
        .chain_update(&dst_prime)
        .finalize();

    let mut uniform = Vec::with_capacity(ell * B_IN_BYTES);
    let mut b_i = Sha256::new()
        .chain_update(b_0)
        .chain_update([1u8])
        .chain_update(&dst_prime)
        .finalize();
    uniform.extend_from_slice(&b_i);

    for i in 2..=ell as u8 {
        let mut xored = [0u8; B_IN_BYTES];
        for (out, (a, b)) in xored.iter_mut().zip(b_0.iter().zip(b_i.iter())) {
            *out = a ^ b;
        }
        b_i = Sha256::new()
            .chain_update(xored)
            .chain_update([i])
            .chain_update(&dst_prime)
            .finalize();
        uniform.extend_from_slice(&b_i);
    }

    uniform.truncate(len_in_bytes);
    Ok(uniform)
}

/// Reduce a 64-byte big-endian integer modulo `p`.
fn reduce(chunk: &[u8]) -> Fp {
    let mut modulus = [0u8; L];
    modulus[L - FP_LENGTH..].copy_from_slice(FIELD_MODULUS.as_slice());

    let mut wide = [0u8; L];
    wide.copy_from_slice(chunk);

    let reduced = U512::from_be_bytes(wide) % U512::from_be_bytes(modulus);
    let bytes: [u8; L] = reduced.to_be_bytes();
    Fp::from_slice(&bytes[L - FP_LENGTH..])
}

/// `hash_to_field` producing two `Fp2` elements.
pub fn hash_to_field_fp2(message: &[u8]) -> Result<[Fp2; 2], BlsError> {
    let uniform = expand_message_xmd(message, DST, LEN_IN_BYTES)?;
    let e: Vec<Fp> = uniform.chunks_exact(L).map(reduce).collect();
    Ok([Fp2::new(e[0], e[1]), Fp2::new(e[2], e[3])])
}

/// Hash a message to a G2 point using the `MAP_FP2_TO_G2` and `G2ADD` precompiles.
pub fn hash_to_g2<P: Bls12381Precompiles>(
    precompiles: &P,
    message: &[u8],
) -> Result<G2Point, BlsError> {
    let [u0, u1] = hash_to_field_fp2(message)?;

    let q0 = precompiles.map_fp2_to_g2(&u0.encode()).map_err(BlsError::MapFp2ToG2Failed)?;
    let q1 = precompiles.map_fp2_to_g2(&u1.encode()).map_err(BlsError::MapFp2ToG2Failed)?;

    let mut input = [0u8; 2 * G2_POINT_LENGTH];
    input[..G2_POINT_LENGTH].copy_from_slice(&q0);
    input[G2_POINT_LENGTH..].copy_from_slice(&q1);
    let sum = precompiles.g2_add(&input).map_err(BlsError::AddG2Failed)?;

    let point = G2Point::decode(&sum).map_err(BlsError::AddG2Failed)?;
    debug!(target: "vaults::bls", x_c0 = %point.x.c0, "Hashed message to G2");
    Ok(point)
}
