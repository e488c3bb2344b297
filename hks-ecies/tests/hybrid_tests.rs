//! End-to-end tests of the ECIES-AEAD-HKDF primitives, exercised directly
//! without the keyset layer.

use assert_matches::assert_matches;
use hks_core::{Error, HybridDecrypt, HybridEncrypt};
use hks_ecies::test_utils::{aes_ctr_hmac_dem, aes_gcm_dem, generate_ecies_private_key};
use hks_ecies::{
    DemKeyFormat, EcPointFormat, EciesAeadHkdfHybridDecrypt, EciesAeadHkdfHybridEncrypt,
    EllipticCurve, HashType,
};

fn primitives(
    curve: EllipticCurve,
    hash: HashType,
    point_format: EcPointFormat,
    dem: DemKeyFormat,
    salt: &[u8],
) -> (EciesAeadHkdfHybridEncrypt, EciesAeadHkdfHybridDecrypt) {
    let private_key = generate_ecies_private_key(curve, hash, point_format, dem, salt);
    let encrypter = EciesAeadHkdfHybridEncrypt::new(&private_key.public_key()).unwrap();
    let decrypter = EciesAeadHkdfHybridDecrypt::new(&private_key).unwrap();
    (encrypter, decrypter)
}

#[test]
fn test_round_trip_across_parameter_matrix() {
    let curves = [
        EllipticCurve::NistP256,
        EllipticCurve::NistP384,
        EllipticCurve::NistP521,
    ];
    let formats = [EcPointFormat::Uncompressed, EcPointFormat::Compressed];
    let dems = [aes_gcm_dem(16), aes_gcm_dem(32), aes_ctr_hmac_dem(16, 12, 20, 16)];
    let long_plaintext = vec![0xA5u8; 200];
    let plaintexts: [&[u8]; 3] = [b"", b"x", &long_plaintext];
    let contexts: [&[u8]; 2] = [b"", b"context info"];

    for curve in curves {
        for format in formats {
            for dem in &dems {
                let (encrypter, decrypter) =
                    primitives(curve, HashType::Sha256, format, dem.clone(), b"some salt");
                for plaintext in plaintexts {
                    for context in contexts {
                        let ciphertext = encrypter.encrypt(plaintext, context).unwrap();
                        let decrypted = decrypter.decrypt(&ciphertext, context).unwrap();
                        assert_eq!(decrypted, plaintext);
                    }
                }
            }
        }
    }
}

#[test]
fn test_round_trip_other_hkdf_hashes() {
    for hash in [HashType::Sha384, HashType::Sha512] {
        let (encrypter, decrypter) = primitives(
            EllipticCurve::NistP256,
            hash,
            EcPointFormat::Uncompressed,
            aes_gcm_dem(32),
            b"",
        );
        let ciphertext = encrypter.encrypt(b"payload", b"ctx").unwrap();
        assert_eq!(decrypter.decrypt(&ciphertext, b"ctx").unwrap(), b"payload");
    }
}

#[test]
fn test_context_binding() {
    let (encrypter, decrypter) = primitives(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"salt",
    );
    let ciphertext = encrypter.encrypt(b"message", b"context-1").unwrap();
    assert_matches!(
        decrypter.decrypt(&ciphertext, b"context-2"),
        Err(Error::AuthenticationFailure)
    );
    // The empty context is distinct from any non-empty one.
    assert_matches!(
        decrypter.decrypt(&ciphertext, b""),
        Err(Error::AuthenticationFailure)
    );
}

#[test]
fn test_every_bit_flip_breaks_decryption() {
    for dem in [aes_gcm_dem(16), aes_ctr_hmac_dem(16, 12, 20, 16)] {
        let (encrypter, decrypter) = primitives(
            EllipticCurve::NistP256,
            HashType::Sha256,
            EcPointFormat::Uncompressed,
            dem,
            b"salt",
        );
        let ciphertext = encrypter.encrypt(b"tamper target", b"ctx").unwrap();
        for index in 0..ciphertext.len() {
            let mut corrupted = ciphertext.clone();
            corrupted[index] ^= 0x01;
            assert!(
                decrypter.decrypt(&corrupted, b"ctx").is_err(),
                "bit flip at byte {} went undetected",
                index
            );
        }
    }
}

#[test]
fn test_truncated_ciphertext_rejected() {
    let (encrypter, decrypter) = primitives(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"",
    );
    let ciphertext = encrypter.encrypt(b"msg", b"").unwrap();
    // Shorter than the 65-byte KEM header.
    assert_matches!(
        decrypter.decrypt(&ciphertext[..64], b""),
        Err(Error::MalformedCiphertext(_))
    );
    // Header intact but the DEM part truncated below nonce + tag.
    assert_matches!(
        decrypter.decrypt(&ciphertext[..65 + 10], b""),
        Err(Error::MalformedCiphertext(_))
    );
}

#[test]
fn test_corrupted_kem_header_is_malformed_point() {
    let (encrypter, decrypter) = primitives(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"",
    );
    let mut ciphertext = encrypter.encrypt(b"msg", b"").unwrap();
    ciphertext[0] = 0x07;
    assert_matches!(
        decrypter.decrypt(&ciphertext, b""),
        Err(Error::MalformedPoint(_))
    );
}

#[test]
fn test_ciphertexts_never_repeat() {
    let (encrypter, _) = primitives(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"",
    );
    let first = encrypter.encrypt(b"same input", b"same ctx").unwrap();
    let second = encrypter.encrypt(b"same input", b"same ctx").unwrap();
    assert_ne!(first, second);
    // The ephemeral points themselves must differ, not just the DEM part.
    assert_ne!(first[..65], second[..65]);
}

#[test]
fn test_wrong_recipient_key_fails() {
    let key_a = generate_ecies_private_key(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"salt",
    );
    let key_b = generate_ecies_private_key(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"salt",
    );
    let encrypter = EciesAeadHkdfHybridEncrypt::new(&key_a.public_key()).unwrap();
    let decrypter = EciesAeadHkdfHybridDecrypt::new(&key_b).unwrap();
    let ciphertext = encrypter.encrypt(b"for a only", b"").unwrap();
    assert_matches!(
        decrypter.decrypt(&ciphertext, b""),
        Err(Error::AuthenticationFailure)
    );
}

#[test]
fn test_salt_mismatch_fails() {
    let key = generate_ecies_private_key(
        EllipticCurve::NistP256,
        HashType::Sha256,
        EcPointFormat::Uncompressed,
        aes_gcm_dem(16),
        b"salt one",
    );
    let mut other = key.clone();
    other.params.hkdf_salt = hks_ecies::test_utils::encode_salt(b"salt two");
    let encrypter = EciesAeadHkdfHybridEncrypt::new(&key.public_key()).unwrap();
    let decrypter = EciesAeadHkdfHybridDecrypt::new(&other).unwrap();
    let ciphertext = encrypter.encrypt(b"msg", b"").unwrap();
    assert_matches!(
        decrypter.decrypt(&ciphertext, b""),
        Err(Error::AuthenticationFailure)
    );
}
