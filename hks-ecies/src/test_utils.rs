//! Utilities for generating keys and keysets in tests and examples.
//!
//! Nothing here is suitable for production key management; real key
//! material comes from an external key-management service.

use hks_core::{KeyRecord, KeyStatus, Keyset, KeysetHandle, OutputPrefixType, Result};

use crate::ec::{self, EcPointFormat, EllipticCurve};
use crate::kdf::HashType;
use crate::key::{
    encode_b64, DemKeyFormat, EciesAeadHkdfParams, EciesAeadHkdfPrivateKey,
    EciesAeadHkdfPublicKey, ECIES_AEAD_HKDF_PRIVATE_KEY_TYPE_URL,
    ECIES_AEAD_HKDF_PUBLIC_KEY_TYPE_URL,
};

/// Encodes an HKDF salt the way key records store it
pub fn encode_salt(salt: &[u8]) -> String {
    encode_b64(salt)
}

/// AES-GCM DEM descriptor
pub fn aes_gcm_dem(key_size: usize) -> DemKeyFormat {
    DemKeyFormat::AesGcm { key_size }
}

/// AES-CTR + HMAC-SHA256 DEM descriptor
pub fn aes_ctr_hmac_dem(
    aes_key_size: usize,
    iv_size: usize,
    hmac_key_size: usize,
    tag_size: usize,
) -> DemKeyFormat {
    DemKeyFormat::AesCtrHmac {
        aes_key_size,
        iv_size,
        hmac_key_size,
        tag_size,
        hmac_hash: HashType::Sha256.as_str().to_string(),
    }
}

/// Generates a fresh ECIES-AEAD-HKDF private key with the given parameters
pub fn generate_ecies_private_key(
    curve: EllipticCurve,
    hash: HashType,
    point_format: EcPointFormat,
    dem: DemKeyFormat,
    salt: &[u8],
) -> EciesAeadHkdfPrivateKey {
    let private = ec::generate_private_key(curve);
    let public_point = ec::serialize_point(&private.public_point(), EcPointFormat::Uncompressed);
    EciesAeadHkdfPrivateKey {
        params: EciesAeadHkdfParams {
            curve: curve.as_str().to_string(),
            hkdf_hash: hash.as_str().to_string(),
            hkdf_salt: encode_b64(salt),
            point_format: point_format.as_str().to_string(),
            dem,
        },
        public_point: encode_b64(&public_point),
        private_scalar: encode_b64(&private.scalar_bytes()),
    }
}

/// Wraps a private key as a keyset record
pub fn private_key_record(
    key: &EciesAeadHkdfPrivateKey,
    key_id: u32,
    status: KeyStatus,
    prefix: OutputPrefixType,
) -> Result<KeyRecord> {
    Ok(KeyRecord::new(
        key_id,
        status,
        prefix,
        ECIES_AEAD_HKDF_PRIVATE_KEY_TYPE_URL,
        key.to_bytes()?,
    ))
}

/// Wraps a public key as a keyset record
pub fn public_key_record(
    key: &EciesAeadHkdfPublicKey,
    key_id: u32,
    status: KeyStatus,
    prefix: OutputPrefixType,
) -> Result<KeyRecord> {
    Ok(KeyRecord::new(
        key_id,
        status,
        prefix,
        ECIES_AEAD_HKDF_PUBLIC_KEY_TYPE_URL,
        key.to_bytes()?,
    ))
}

/// Builds a validated keyset handle from records
pub fn keyset_handle(keys: Vec<KeyRecord>, primary_key_id: u32) -> Result<KeysetHandle> {
    KeysetHandle::try_new(Keyset::new(keys, primary_key_id))
}
