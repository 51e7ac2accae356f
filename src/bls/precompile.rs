//! EIP-2537 precompile interface and its `blst` backend.
//!
//! The verifier only needs three operations: `MAP_FP2_TO_G2`, `G2ADD` and
//! `PAIRING_CHECK`. They are grouped behind [`Bls12381Precompiles`] so the
//! verification algorithm is independent of the curve backend.

use blst::{
    blst_bendian_from_fp, blst_final_exp, blst_fp, blst_fp12, blst_fp12_is_one, blst_fp12_mul,
    blst_fp12_one, blst_fp2, blst_fp_from_bendian, blst_map_to_g2, blst_miller_loop, blst_p1_affine,
    blst_p1_affine_in_g1, blst_p1_affine_is_inf, blst_p1_affine_on_curve, blst_p2, blst_p2_add_or_double,
    blst_p2_affine, blst_p2_affine_in_g2, blst_p2_affine_is_inf, blst_p2_affine_on_curve,
    blst_p2_from_affine, blst_p2_to_affine,
};
use tracing::debug;

use super::error::PrecompileError;
use super::fields::{
    decode_fp, FP_PADDING_LENGTH, G1_POINT_LENGTH, G2_POINT_LENGTH, PADDED_FP2_LENGTH,
    PADDED_FP_LENGTH, PAIRING_PAIR_LENGTH,
};

/// BLS12-381 precompiles used by deposit verification, with EIP-2537 layouts.
pub trait Bls12381Precompiles {
    /// `MAP_FP2_TO_G2`: 128-byte `Fp2` in, 256-byte G2 point out.
    fn map_fp2_to_g2(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError>;

    /// `G2ADD`: two 256-byte G2 points in, their sum out.
    fn g2_add(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError>;

    /// `PAIRING_CHECK`: `k` 384-byte `(G1, G2)` pairs in, whether the product
    /// of pairings is the identity.
    fn pairing_check(&self, input: &[u8]) -> Result<bool, PrecompileError>;
}

/// Precompiles backed by the `blst` library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlstPrecompiles;

impl Bls12381Precompiles for BlstPrecompiles {
    fn map_fp2_to_g2(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError> {
        check_length(input, PADDED_FP2_LENGTH)?;
        let u = read_fp2(input)?;

        let mut out = blst_p2::default();
        // SAFETY: all pointers reference live stack values; a null `v` maps a single element.
        unsafe { blst_map_to_g2(&mut out, &u, std::ptr::null()) };

        Ok(write_g2(&out))
    }

    fn g2_add(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError> {
        check_length(input, 2 * G2_POINT_LENGTH)?;
        let a = read_g2(&input[..G2_POINT_LENGTH], false)?;
        let b = read_g2(&input[G2_POINT_LENGTH..], false)?;

        let mut a_proj = blst_p2::default();
        let mut b_proj = blst_p2::default();
        let mut sum = blst_p2::default();
        // SAFETY: all pointers reference live stack values.
        unsafe {
            blst_p2_from_affine(&mut a_proj, &a);
            blst_p2_from_affine(&mut b_proj, &b);
            blst_p2_add_or_double(&mut sum, &a_proj, &b_proj);
        }

        Ok(write_g2(&sum))
    }

    fn pairing_check(&self, input: &[u8]) -> Result<bool, PrecompileError> {
        if input.is_empty() || input.len() % PAIRING_PAIR_LENGTH != 0 {
            return Err(PrecompileError::InvalidInputLength {
                expected: PAIRING_PAIR_LENGTH,
                actual: input.len(),
            });
        }

        // SAFETY: blst returns a pointer to a static constant.
        let mut acc: blst_fp12 = unsafe { *blst_fp12_one() };
        for pair in input.chunks_exact(PAIRING_PAIR_LENGTH) {
            let p = read_g1(&pair[..G1_POINT_LENGTH])?;
            let q = read_g2(&pair[G1_POINT_LENGTH..], true)?;

            // SAFETY: `p` and `q` are validated affine points on the stack.
            let skip = unsafe { blst_p1_affine_is_inf(&p) || blst_p2_affine_is_inf(&q) };
            if skip {
                continue;
            }

            let mut loop_result = blst_fp12::default();
            let previous = acc;
            // SAFETY: all pointers reference live stack values.
            unsafe {
                blst_miller_loop(&mut loop_result, &q, &p);
                blst_fp12_mul(&mut acc, &previous, &loop_result);
            }
        }

        let mut result = blst_fp12::default();
        // SAFETY: all pointers reference live stack values.
        let is_one = unsafe {
            blst_final_exp(&mut result, &acc);
            blst_fp12_is_one(&result)
        };
        debug!(target: "vaults::bls", pairs = input.len() / PAIRING_PAIR_LENGTH, is_one, "Pairing check");
        Ok(is_one)
    }
}

fn check_length(input: &[u8], expected: usize) -> Result<(), PrecompileError> {
    if input.len() != expected {
        return Err(PrecompileError::InvalidInputLength { expected, actual: input.len() });
    }
    Ok(())
}

fn read_fp(bytes: &[u8]) -> Result<blst_fp, PrecompileError> {
    let canonical = decode_fp(bytes)?;
    let mut fp = blst_fp::default();
    // SAFETY: `canonical` holds exactly 48 bytes.
    unsafe { blst_fp_from_bendian(&mut fp, canonical.as_ptr()) };
    Ok(fp)
}

fn read_fp2(bytes: &[u8]) -> Result<blst_fp2, PrecompileError> {
    Ok(blst_fp2 {
        fp: [read_fp(&bytes[..PADDED_FP_LENGTH])?, read_fp(&bytes[PADDED_FP_LENGTH..PADDED_FP2_LENGTH])?],
    })
}

fn read_g1(bytes: &[u8]) -> Result<blst_p1_affine, PrecompileError> {
    let point = blst_p1_affine {
        x: read_fp(&bytes[..PADDED_FP_LENGTH])?,
        y: read_fp(&bytes[PADDED_FP_LENGTH..G1_POINT_LENGTH])?,
    };
    // SAFETY: `point` is a live stack value.
    unsafe {
        if !blst_p1_affine_on_curve(&point) {
            return Err(PrecompileError::PointNotOnCurve);
        }
        if !blst_p1_affine_in_g1(&point) {
            return Err(PrecompileError::PointNotInSubgroup);
        }
    }
    Ok(point)
}

fn read_g2(bytes: &[u8], subgroup_check: bool) -> Result<blst_p2_affine, PrecompileError> {
    let point = blst_p2_affine {
        x: read_fp2(&bytes[..PADDED_FP2_LENGTH])?,
        y: read_fp2(&bytes[PADDED_FP2_LENGTH..G2_POINT_LENGTH])?,
    };
    // SAFETY: `point` is a live stack value.
    unsafe {
        if !blst_p2_affine_on_curve(&point) {
            return Err(PrecompileError::PointNotOnCurve);
        }
        if subgroup_check && !blst_p2_affine_in_g2(&point) {
            return Err(PrecompileError::PointNotInSubgroup);
        }
    }
    Ok(point)
}

/// Serialize a projective G2 point in precompile layout.
pub(crate) fn write_g2(point: &blst_p2) -> [u8; G2_POINT_LENGTH] {
    let mut affine = blst_p2_affine::default();
    // SAFETY: all pointers reference live stack values.
    unsafe { blst_p2_to_affine(&mut affine, point) };

    let mut out = [0u8; G2_POINT_LENGTH];
    let coordinates = [&affine.x.fp[0], &affine.x.fp[1], &affine.y.fp[0], &affine.y.fp[1]];
    for (i, fp) in coordinates.into_iter().enumerate() {
        let start = i * PADDED_FP_LENGTH + FP_PADDING_LENGTH;
        // SAFETY: the destination slice has 48 bytes left at `start`.
        unsafe { blst_bendian_from_fp(out[start..].as_mut_ptr(), fp) };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls::fields::{G1Point, G2Point};

    fn generator_g2() -> [u8; G2_POINT_LENGTH] {
        let mut point = blst_p2::default();
        // SAFETY: generator pointer is a static constant.
        unsafe { blst_p2_from_affine(&mut point, blst::blst_p2_affine_generator()) };
        write_g2(&point)
    }

    fn generator_g1() -> [u8; G1_POINT_LENGTH] {
        let mut out = [0u8; G1_POINT_LENGTH];
        unsafe {
            let g1 = blst::blst_p1_affine_generator();
            blst_bendian_from_fp(out[16..].as_mut_ptr(), &(*g1).x);
            blst_bendian_from_fp(out[80..].as_mut_ptr(), &(*g1).y);
        }
        out
    }

    #[test]
    fn test_g2_add_doubles_generator() {
        let g = generator_g2();
        let mut input = Vec::with_capacity(512);
        input.extend_from_slice(&g);
        input.extend_from_slice(&g);
        let doubled = BlstPrecompiles.g2_add(&input).unwrap();

        let mut expected = blst_p2::default();
        unsafe {
            let mut proj = blst_p2::default();
            blst_p2_from_affine(&mut proj, blst::blst_p2_affine_generator());
            blst::blst_p2_double(&mut expected, &proj);
        }
        assert_eq!(doubled, write_g2(&expected));
    }

    #[test]
    fn test_g2_add_with_infinity() {
        let g = generator_g2();
        let mut input = vec![0u8; 256];
        input.extend_from_slice(&g);
        assert_eq!(BlstPrecompiles.g2_add(&input).unwrap(), g);
    }

    #[test]
    fn test_pairing_of_generator_and_negation() {
        // e(G1, G2) * e(-G1, G2) == 1
        let mut input = Vec::with_capacity(768);
        input.extend_from_slice(&generator_g1());
        input.extend_from_slice(&generator_g2());
        input.extend_from_slice(&G1Point::NEG_GENERATOR.encode());
        input.extend_from_slice(&generator_g2());
        assert!(BlstPrecompiles.pairing_check(&input).unwrap());

        // e(G1, G2) alone is not the identity
        assert!(!BlstPrecompiles.pairing_check(&input[..384]).unwrap());
    }

    #[test]
    fn test_pairing_skips_infinity_pairs() {
        let mut input = vec![0u8; 128];
        input.extend_from_slice(&generator_g2());
        assert!(BlstPrecompiles.pairing_check(&input).unwrap());
    }

    #[test]
    fn test_pairing_rejects_bad_input() {
        assert!(matches!(
            BlstPrecompiles.pairing_check(&[0u8; 100]),
            Err(PrecompileError::InvalidInputLength { .. })
        ));
        assert!(matches!(
            BlstPrecompiles.pairing_check(&[]),
            Err(PrecompileError::InvalidInputLength { .. })
        ));

        // G1 point (1, 1) is not on the curve
        let mut bad = G1Point::default();
        bad.x.0[47] = 1;
        bad.y.0[47] = 1;
        let mut input = bad.encode().to_vec();
        input.extend_from_slice(&generator_g2());
        assert_eq!(BlstPrecompiles.pairing_check(&input), Err(PrecompileError::PointNotOnCurve));
    }

    #[test]
    fn test_map_rejects_non_canonical() {
        let mut input = [0u8; 128];
        input[0] = 1;
        assert_eq!(
            BlstPrecompiles.map_fp2_to_g2(&input),
            Err(PrecompileError::NonCanonicalFieldElement)
        );
        assert!(matches!(
            BlstPrecompiles.map_fp2_to_g2(&input[..64]),
            Err(PrecompileError::InvalidInputLength { expected: 128, actual: 64 })
        ));
    }

    #[test]
    fn test_map_output_is_valid_g2() {
        let mut input = [0u8; 128];
        input[63] = 7;
        input[127] = 9;
        let out = BlstPrecompiles.map_fp2_to_g2(&input).unwrap();
        let point = G2Point::decode(&out).unwrap();
        assert!(!point.is_infinity());
        read_g2(&out, true).unwrap();
    }
}
