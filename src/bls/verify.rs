//! Deposit message signature verification.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::BlsError;
use super::fields::{
    is_lexicographically_largest, Fp, Fp2, G1Point, G2Point, FP_LENGTH, G1_POINT_LENGTH,
    G2_POINT_LENGTH, PAIRING_PAIR_LENGTH,
};
use super::hash_to_curve::hash_to_g2;
use super::precompile::Bls12381Precompiles;
use crate::ssz::{deposit_message_signing_root, PUBKEY_LENGTH, SIGNATURE_LENGTH};
use crate::vault::GWEI;

/// Compressed point flag: set on every compressed encoding.
const COMPRESSION_FLAG: u8 = 0x80;

/// Compressed point flag: the point at infinity.
const INFINITY_FLAG: u8 = 0x40;

/// Compressed point flag: `Y` is the lexicographically larger root.
const SIGN_FLAG: u8 = 0x20;

/// Mask clearing all three flags.
const FLAGS_MASK: u8 = 0x1f;

/// Y coordinates of the pubkey and signature, supplied out of band so the
/// verifier never has to take a square root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositY {
    /// Y of the G1 public key.
    pub pubkey_y: Fp,
    /// Y of the G2 signature.
    pub signature_y: Fp2,
}

fn check_flags(first_byte: u8, y_is_largest: bool) -> Result<(), BlsError> {
    if first_byte & COMPRESSION_FLAG == 0 {
        return Err(BlsError::InvalidCompressionFlag);
    }
    if first_byte & INFINITY_FLAG != 0 {
        return Err(BlsError::InputHasInfinityPoints);
    }
    if (first_byte & SIGN_FLAG != 0) != y_is_largest {
        return Err(BlsError::InvalidCompressedComponentSignBit);
    }
    Ok(())
}

/// Check the flag bits of a compressed G1 public key against its Y coordinate.
pub fn validate_compressed_pubkey_flags(pubkey: &[u8], y: &Fp) -> Result<(), BlsError> {
    if pubkey.len() != PUBKEY_LENGTH {
        return Err(BlsError::InvalidPubkeyLength(pubkey.len()));
    }
    check_flags(pubkey[0], is_lexicographically_largest(y))
}

/// Check the flag bits of a compressed G2 signature against its Y coordinate.
pub fn validate_compressed_signature_flags(signature: &[u8], y: &Fp2) -> Result<(), BlsError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(BlsError::InvalidSignatureLength(signature.len()));
    }
    check_flags(signature[0], y.is_lexicographically_largest())
}

/// Rebuild the affine G1 point from a compressed pubkey and its Y.
fn pubkey_point(pubkey: &[u8], y: Fp) -> G1Point {
    let mut x = Fp::from_slice(&pubkey[..FP_LENGTH]);
    x[0] &= FLAGS_MASK;
    G1Point { x, y }
}

/// Rebuild the affine G2 point from a compressed signature and its Y.
///
/// Compressed G2 encodings carry `x.c1` first, then `x.c0`.
fn signature_point(signature: &[u8], y: Fp2) -> G2Point {
    let mut c1 = Fp::from_slice(&signature[..FP_LENGTH]);
    c1[0] &= FLAGS_MASK;
    let c0 = Fp::from_slice(&signature[FP_LENGTH..SIGNATURE_LENGTH]);
    G2Point { x: Fp2::new(c0, c1), y }
}

/// Convert a wei amount to whole gwei.
pub fn amount_to_gwei(amount_wei: u128) -> Result<u64, BlsError> {
    if amount_wei % GWEI != 0 {
        return Err(BlsError::InvalidDepositAmount(amount_wei));
    }
    u64::try_from(amount_wei / GWEI).map_err(|_| BlsError::InvalidDepositAmount(amount_wei))
}

/// Verify the BLS signature over a deposit message.
///
/// Checks lengths and flag bits, computes the signing root, hashes it to G2
/// and runs a single pairing check `e(pk, H(m)) * e(-G1, sig) == 1`.
/// `amount_wei` must be a whole number of gwei.
pub fn verify_deposit_message<P: Bls12381Precompiles>(
    precompiles: &P,
    pubkey: &[u8],
    signature: &[u8],
    amount_wei: u128,
    deposit_y: &DepositY,
    withdrawal_credentials: B256,
    domain: B256,
) -> Result<(), BlsError> {
    validate_compressed_pubkey_flags(pubkey, &deposit_y.pubkey_y)?;
    validate_compressed_signature_flags(signature, &deposit_y.signature_y)?;

    let amount_gwei = amount_to_gwei(amount_wei)?;
    let signing_root =
        deposit_message_signing_root(pubkey, amount_gwei, withdrawal_credentials, domain)?;
    let message = hash_to_g2(precompiles, signing_root.as_slice())?;

    let pubkey_g1 = pubkey_point(pubkey, deposit_y.pubkey_y);
    let signature_g2 = signature_point(signature, deposit_y.signature_y);
    if pubkey_g1.is_infinity() || signature_g2.is_infinity() || message.is_infinity() {
        return Err(BlsError::InputHasInfinityPoints);
    }

    let mut input = [0u8; 2 * PAIRING_PAIR_LENGTH];
    let (first, second) = input.split_at_mut(PAIRING_PAIR_LENGTH);
    first[..G1_POINT_LENGTH].copy_from_slice(&pubkey_g1.encode());
    first[G1_POINT_LENGTH..].copy_from_slice(&message.encode());
    second[..G1_POINT_LENGTH].copy_from_slice(&G1Point::NEG_GENERATOR.encode());
    second[G1_POINT_LENGTH..G1_POINT_LENGTH + G2_POINT_LENGTH]
        .copy_from_slice(&signature_g2.encode());

    let valid = precompiles.pairing_check(&input).map_err(BlsError::PairingFailed)?;
    if !valid {
        warn!(target: "vaults::bls", pubkey = %hex::encode(pubkey), "Deposit signature rejected");
        return Err(BlsError::InvalidSignature);
    }

    debug!(target: "vaults::bls", %signing_root, amount_gwei, "Deposit signature verified");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bls::error::PrecompileError;
    use crate::bls::hash_to_curve::DST;
    use crate::bls::precompile::BlstPrecompiles;
    use crate::ssz::{compute_deposit_domain, deposit_data_root};
    use crate::vault::ETHER;
    use alloy_primitives::{b256, FixedBytes};
    use blst::min_pk::SecretKey;
    use hex_literal::hex;

    /// A self-signed 32 ETH deposit with its Y coordinates.
    #[derive(Clone)]
    pub(crate) struct DepositVector {
        pub pubkey: [u8; 48],
        pub signature: [u8; 96],
        pub deposit_y: DepositY,
        pub withdrawal_credentials: B256,
        pub amount_wei: u128,
        pub domain: B256,
    }

    pub(crate) fn deposit_vector(seed: u8) -> DepositVector {
        let sk = SecretKey::key_gen(&[seed; 32], &[]).unwrap();
        let pk = sk.sk_to_pk();
        let pubkey = pk.to_bytes();

        let mut withdrawal_credentials = B256::repeat_byte(0xaa);
        withdrawal_credentials[..12].copy_from_slice(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let amount_wei = 32 * ETHER;
        let domain = compute_deposit_domain([0, 0, 0, 0]);
        let signing_root = deposit_message_signing_root(
            &pubkey,
            amount_to_gwei(amount_wei).unwrap(),
            withdrawal_credentials,
            domain,
        )
        .unwrap();

        let sig = sk.sign(signing_root.as_slice(), DST, &[]);
        let signature = sig.to_bytes();

        // uncompressed: x ‖ y for G1, x.c1 ‖ x.c0 ‖ y.c1 ‖ y.c0 for G2
        let pk_raw = pk.serialize();
        let sig_raw = sig.serialize();
        let deposit_y = DepositY {
            pubkey_y: Fp::from_slice(&pk_raw[48..96]),
            signature_y: Fp2::new(
                Fp::from_slice(&sig_raw[144..192]),
                Fp::from_slice(&sig_raw[96..144]),
            ),
        };

        DepositVector { pubkey, signature, deposit_y, withdrawal_credentials, amount_wei, domain }
    }

    fn verify(vector: &DepositVector) -> Result<(), BlsError> {
        verify_deposit_message(
            &BlstPrecompiles,
            &vector.pubkey,
            &vector.signature,
            vector.amount_wei,
            &vector.deposit_y,
            vector.withdrawal_credentials,
            vector.domain,
        )
    }

    #[test]
    fn test_valid_deposit_verifies() {
        for seed in [1u8, 42, 200] {
            verify(&deposit_vector(seed)).unwrap();
        }
    }

    /// Mainnet-domain 32 ETH deposit signed under the EIP-2333 test case 0 master key.
    #[test]
    fn test_fixed_mainnet_domain_deposit() {
        let pubkey = hex!(
            "a2c975348667926acf12f3eecb005044e08a7a9b7d95f30bd281b55445107367"
            "a2e5d0558be7943c8bd13f9a1a7036fb"
        );
        let signature = hex!(
            "90cb3208aeae5e6b78f7f4828d190e5f3c21c2201fc1e2f0a37a4b94786a3f85"
            "d5eafb75136ced08069ea83bf4c71f72083d4d011b98498fc4ecbf007048d0e6"
            "9c766da1ed8fb737fc01b1841ffc1506ab6e696a92fa00cd3a55f30ee78c347a"
        );
        let deposit_y = DepositY {
            pubkey_y: FixedBytes(hex!(
                "13f396ec1b79d6f461189d20a0d3f27718dd6efff3066c31380d785bce9957ab"
                "c640d2f1301266d1e9d7b1e6da60da95"
            )),
            signature_y: Fp2::new(
                FixedBytes(hex!(
                    "0c88b41ba8afb3680d7c9d5bb59bd919f976838bfe771e65582f24dee14667f3"
                    "41c9c727d5b27a829b7f57645b876c0e"
                )),
                FixedBytes(hex!(
                    "01af1f073aff341fba2e299d3c1f77395dab1e63c1f33a43f5850e99c4953ba0"
                    "a54fe9f53470e0eb4d45961551bb7f74"
                )),
            ),
        };
        let withdrawal_credentials =
            b256!("010000000000000000000000b9d7934878b5fb9610b3fe8a5e441e8fad7e293f");
        let domain = compute_deposit_domain([0, 0, 0, 0]);
        assert_eq!(domain, b256!("03000000f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a9"));

        assert_eq!(
            deposit_message_signing_root(&pubkey, 32_000_000_000, withdrawal_credentials, domain)
                .unwrap(),
            b256!("5e46ce1bbddf11a0179f8761adfd1aaf9e7e15e134c2ddcebb1c66393e7e568f")
        );
        assert_eq!(
            deposit_data_root(&pubkey, withdrawal_credentials, &signature, 32_000_000_000).unwrap(),
            b256!("0876b88ef2ec10e26cb41e7a6cc1de96595510a14fb7174d80e44207f1e8a979")
        );

        let vector = DepositVector {
            pubkey,
            signature,
            deposit_y,
            withdrawal_credentials,
            amount_wei: 32 * ETHER,
            domain,
        };
        verify(&vector).unwrap();

        let mut tampered = vector.clone();
        tampered.signature[95] ^= 1;
        assert!(verify(&tampered).is_err());

        let mut wrong_fork = vector;
        wrong_fork.domain = compute_deposit_domain([0x00, 0x00, 0x10, 0x20]);
        assert_eq!(verify(&wrong_fork), Err(BlsError::InvalidSignature));
    }

    #[test]
    fn test_signature_bit_flip_rejected() {
        let vector = deposit_vector(7);
        for byte in 0..96 {
            let bits: Vec<u8> =
                if byte == 0 || byte == 48 { (0..8).collect() } else { vec![(byte % 8) as u8] };
            for bit in bits {
                let mut tampered = vector.clone();
                tampered.signature[byte] ^= 1 << bit;
                assert!(verify(&tampered).is_err(), "flip of byte {byte} bit {bit} accepted");
            }
        }
    }

    #[test]
    fn test_wrong_message_is_invalid_signature() {
        let mut vector = deposit_vector(3);
        vector.amount_wei = 31 * ETHER;
        assert_eq!(verify(&vector), Err(BlsError::InvalidSignature));

        let mut vector = deposit_vector(3);
        vector.withdrawal_credentials = B256::repeat_byte(0x02);
        assert_eq!(verify(&vector), Err(BlsError::InvalidSignature));
    }

    #[test]
    fn test_length_checks() {
        let vector = deposit_vector(5);
        assert_eq!(
            verify_deposit_message(
                &BlstPrecompiles,
                &vector.pubkey[..47],
                &vector.signature,
                vector.amount_wei,
                &vector.deposit_y,
                vector.withdrawal_credentials,
                vector.domain,
            ),
            Err(BlsError::InvalidPubkeyLength(47))
        );
        assert_eq!(
            verify_deposit_message(
                &BlstPrecompiles,
                &vector.pubkey,
                &[0u8; 95],
                vector.amount_wei,
                &vector.deposit_y,
                vector.withdrawal_credentials,
                vector.domain,
            ),
            Err(BlsError::InvalidSignatureLength(95))
        );
    }

    #[test]
    fn test_flag_checks() {
        let vector = deposit_vector(9);

        let mut pubkey = vector.pubkey;
        pubkey[0] &= !COMPRESSION_FLAG;
        assert_eq!(
            validate_compressed_pubkey_flags(&pubkey, &vector.deposit_y.pubkey_y),
            Err(BlsError::InvalidCompressionFlag)
        );

        let mut pubkey = vector.pubkey;
        pubkey[0] |= INFINITY_FLAG;
        assert_eq!(
            validate_compressed_pubkey_flags(&pubkey, &vector.deposit_y.pubkey_y),
            Err(BlsError::InputHasInfinityPoints)
        );

        let mut signature = vector.signature;
        signature[0] ^= SIGN_FLAG;
        assert_eq!(
            validate_compressed_signature_flags(&signature, &vector.deposit_y.signature_y),
            Err(BlsError::InvalidCompressedComponentSignBit)
        );

        // right flags, wrong root of y
        let mut deposit_y = vector.deposit_y;
        deposit_y.pubkey_y = if is_lexicographically_largest(&deposit_y.pubkey_y) {
            Fp::ZERO
        } else {
            crate::bls::fields::FIELD_MODULUS
        };
        assert_eq!(
            validate_compressed_pubkey_flags(&vector.pubkey, &deposit_y.pubkey_y),
            Err(BlsError::InvalidCompressedComponentSignBit)
        );
    }

    #[test]
    fn test_amount_to_gwei() {
        assert_eq!(amount_to_gwei(32 * ETHER).unwrap(), 32_000_000_000);
        assert_eq!(amount_to_gwei(1).unwrap_err(), BlsError::InvalidDepositAmount(1));
        let huge = (u64::MAX as u128 + 1) * GWEI;
        assert_eq!(amount_to_gwei(huge).unwrap_err(), BlsError::InvalidDepositAmount(huge));
    }

    struct BrokenPairing;

    impl Bls12381Precompiles for BrokenPairing {
        fn map_fp2_to_g2(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError> {
            BlstPrecompiles.map_fp2_to_g2(input)
        }

        fn g2_add(&self, input: &[u8]) -> Result<[u8; G2_POINT_LENGTH], PrecompileError> {
            BlstPrecompiles.g2_add(input)
        }

        fn pairing_check(&self, input: &[u8]) -> Result<bool, PrecompileError> {
            Err(PrecompileError::InvalidInputLength { expected: 768, actual: input.len() + 1 })
        }
    }

    #[test]
    fn test_pairing_failure_is_tagged() {
        let vector = deposit_vector(11);
        let result = verify_deposit_message(
            &BrokenPairing,
            &vector.pubkey,
            &vector.signature,
            vector.amount_wei,
            &vector.deposit_y,
            vector.withdrawal_credentials,
            vector.domain,
        );
        assert_eq!(
            result,
            Err(BlsError::PairingFailed(PrecompileError::InvalidInputLength {
                expected: 768,
                actual: 769
            }))
        );
    }

    #[test]
    fn test_deposit_y_serde() {
        let vector = deposit_vector(13);
        let json = serde_json::to_string(&vector.deposit_y).unwrap();
        let back: DepositY = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vector.deposit_y);
    }
}
