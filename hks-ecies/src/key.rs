//! ECIES-AEAD-HKDF key records
//!
//! The serialized form of the keys this primitive family consumes. Records
//! travel as JSON with base64-encoded binary fields; the registry hands the
//! raw bytes to [`EciesAeadHkdfPublicKey::from_bytes`] /
//! [`EciesAeadHkdfPrivateKey::from_bytes`] and every field is re-validated
//! before a primitive is built from it.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use hks_core::{Error, Result};

use crate::dem::AeadDemParams;
use crate::ec::{self, EcPointFormat, EcPrivateKey, EcPublicPoint, EllipticCurve};
use crate::kdf::HashType;

/// Key type url of ECIES-AEAD-HKDF public keys
pub const ECIES_AEAD_HKDF_PUBLIC_KEY_TYPE_URL: &str = "type.hks.dev/hks.EciesAeadHkdfPublicKey";

/// Key type url of ECIES-AEAD-HKDF private keys
pub const ECIES_AEAD_HKDF_PRIVATE_KEY_TYPE_URL: &str = "type.hks.dev/hks.EciesAeadHkdfPrivateKey";

/// DEM descriptor within a key record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemKeyFormat {
    /// AES-GCM DEM
    AesGcm {
        /// AES key size in bytes
        key_size: usize,
    },
    /// AES-CTR + HMAC DEM
    AesCtrHmac {
        /// AES key size in bytes
        aes_key_size: usize,
        /// IV size in bytes
        iv_size: usize,
        /// HMAC key size in bytes
        hmac_key_size: usize,
        /// Truncated tag size in bytes
        tag_size: usize,
        /// Hash identifier backing the HMAC, e.g. "SHA256"
        hmac_hash: String,
    },
}

impl DemKeyFormat {
    pub(crate) fn parse(&self) -> Result<AeadDemParams> {
        let params = match self {
            DemKeyFormat::AesGcm { key_size } => AeadDemParams::AesGcm {
                key_size: *key_size,
            },
            DemKeyFormat::AesCtrHmac {
                aes_key_size,
                iv_size,
                hmac_key_size,
                tag_size,
                hmac_hash,
            } => AeadDemParams::AesCtrHmac {
                aes_key_size: *aes_key_size,
                iv_size: *iv_size,
                hmac_key_size: *hmac_key_size,
                tag_size: *tag_size,
                hmac_hash: HashType::from_name(hmac_hash)?,
            },
        };
        params.validate()?;
        Ok(params)
    }
}

/// Scheme parameters shared by the public and private records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EciesAeadHkdfParams {
    /// Curve identifier, e.g. "NIST_P256"
    pub curve: String,
    /// HKDF hash identifier, e.g. "SHA256"
    pub hkdf_hash: String,
    /// Base64-encoded HKDF salt; may be empty
    pub hkdf_salt: String,
    /// Point format used on the wire, e.g. "UNCOMPRESSED"
    pub point_format: String,
    /// DEM descriptor
    pub dem: DemKeyFormat,
}

/// Validated runtime view of [`EciesAeadHkdfParams`]
#[derive(Debug, Clone)]
pub(crate) struct ParsedParams {
    pub(crate) curve: EllipticCurve,
    pub(crate) hash: HashType,
    pub(crate) salt: Vec<u8>,
    pub(crate) point_format: EcPointFormat,
    pub(crate) dem: AeadDemParams,
}

impl EciesAeadHkdfParams {
    pub(crate) fn parse(&self) -> Result<ParsedParams> {
        Ok(ParsedParams {
            curve: EllipticCurve::from_name(&self.curve)?,
            hash: HashType::from_name(&self.hkdf_hash)?,
            salt: decode_b64(&self.hkdf_salt, "hkdf_salt")?,
            point_format: EcPointFormat::from_name(&self.point_format)?,
            dem: self.dem.parse()?,
        })
    }
}

/// A recipient public key.
///
/// The point is stored base64-encoded in SEC1 uncompressed form regardless
/// of the wire `point_format`, which only governs ciphertext layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EciesAeadHkdfPublicKey {
    /// Scheme parameters
    pub params: EciesAeadHkdfParams,
    /// Base64-encoded SEC1 uncompressed public point
    pub public_point: String,
}

impl EciesAeadHkdfPublicKey {
    /// Parses a serialized public-key record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedKey(format!("failed to parse public key record: {}", e)))
    }

    /// Serializes the record to its byte form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub(crate) fn parse(&self) -> Result<(ParsedParams, EcPublicPoint)> {
        let params = self.params.parse()?;
        let point_bytes = decode_b64(&self.public_point, "public_point")?;
        let point = ec::deserialize_point(params.curve, EcPointFormat::Uncompressed, &point_bytes)
            .map_err(|e| Error::MalformedKey(format!("invalid public point: {}", e)))?;
        Ok((params, point))
    }
}

/// A private key, embedding its public half.
///
/// Invariant: the embedded public point must equal the point derived from
/// the private scalar; [`parse`](Self::parse) enforces this.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EciesAeadHkdfPrivateKey {
    /// Scheme parameters
    pub params: EciesAeadHkdfParams,
    /// Base64-encoded SEC1 uncompressed public point
    pub public_point: String,
    /// Base64-encoded big-endian private scalar
    pub private_scalar: String,
}

impl EciesAeadHkdfPrivateKey {
    /// Parses a serialized private-key record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedKey(format!("failed to parse private key record: {}", e)))
    }

    /// Serializes the record to its byte form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Returns the public-key record embedded in this private key
    pub fn public_key(&self) -> EciesAeadHkdfPublicKey {
        EciesAeadHkdfPublicKey {
            params: self.params.clone(),
            public_point: self.public_point.clone(),
        }
    }

    pub(crate) fn parse(&self) -> Result<(ParsedParams, EcPrivateKey)> {
        let params = self.params.parse()?;
        let scalar = decode_b64(&self.private_scalar, "private_scalar")?;
        let private = ec::private_key_from_scalar(params.curve, &scalar)
            .map_err(|e| Error::MalformedKey(format!("invalid private scalar: {}", e)))?;
        let point_bytes = decode_b64(&self.public_point, "public_point")?;
        let embedded = ec::deserialize_point(params.curve, EcPointFormat::Uncompressed, &point_bytes)
            .map_err(|e| Error::MalformedKey(format!("invalid public point: {}", e)))?;
        let derived = private.public_point();
        if ec::serialize_point(&embedded, EcPointFormat::Uncompressed)
            != ec::serialize_point(&derived, EcPointFormat::Uncompressed)
        {
            return Err(Error::MalformedKey(
                "embedded public point does not match the private scalar".to_string(),
            ));
        }
        Ok((params, private))
    }
}

impl fmt::Debug for EciesAeadHkdfPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EciesAeadHkdfPrivateKey")
            .field("params", &self.params)
            .field("public_point", &self.public_point)
            .field("private_scalar", &"<redacted>")
            .finish()
    }
}

fn decode_b64(value: &str, field: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| Error::MalformedKey(format!("invalid base64 in {}: {}", field, e)))
}

pub(crate) fn encode_b64(value: &[u8]) -> String {
    BASE64.encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec;
    use assert_matches::assert_matches;

    fn sample_private_key() -> EciesAeadHkdfPrivateKey {
        let private = ec::generate_private_key(EllipticCurve::NistP256);
        let public_point =
            ec::serialize_point(&private.public_point(), EcPointFormat::Uncompressed);
        EciesAeadHkdfPrivateKey {
            params: EciesAeadHkdfParams {
                curve: "NIST_P256".to_string(),
                hkdf_hash: "SHA256".to_string(),
                hkdf_salt: encode_b64(b"some salt"),
                point_format: "UNCOMPRESSED".to_string(),
                dem: DemKeyFormat::AesGcm { key_size: 16 },
            },
            public_point: encode_b64(&public_point),
            private_scalar: encode_b64(&private.scalar_bytes()),
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let key = sample_private_key();
        let bytes = key.to_bytes().unwrap();
        let restored = EciesAeadHkdfPrivateKey::from_bytes(&bytes).unwrap();
        assert_eq!(key, restored);
        restored.parse().unwrap();
    }

    #[test]
    fn test_public_half_parses() {
        let key = sample_private_key();
        let public = key.public_key();
        let bytes = public.to_bytes().unwrap();
        let restored = EciesAeadHkdfPublicKey::from_bytes(&bytes).unwrap();
        restored.parse().unwrap();
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert_matches!(
            EciesAeadHkdfPrivateKey::from_bytes(b"not json"),
            Err(Error::MalformedKey(_))
        );
    }

    #[test]
    fn test_unknown_curve_rejected() {
        let mut key = sample_private_key();
        key.params.curve = "NIST_P224".to_string();
        assert_matches!(key.parse(), Err(Error::MalformedKey(_)));
    }

    #[test]
    fn test_unknown_hash_surfaces_as_unsupported() {
        let mut key = sample_private_key();
        key.params.hkdf_hash = "MD5".to_string();
        assert_matches!(key.parse(), Err(Error::UnsupportedHash(_)));
    }

    #[test]
    fn test_mismatched_public_point_rejected() {
        let mut key = sample_private_key();
        let other = ec::generate_private_key(EllipticCurve::NistP256);
        key.public_point = encode_b64(&ec::serialize_point(
            &other.public_point(),
            EcPointFormat::Uncompressed,
        ));
        assert_matches!(key.parse(), Err(Error::MalformedKey(_)));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let mut key = sample_private_key();
        key.private_scalar = "@@not-base64@@".to_string();
        assert_matches!(key.parse(), Err(Error::MalformedKey(_)));
    }

    #[test]
    fn test_bad_dem_params_rejected() {
        let mut key = sample_private_key();
        key.params.dem = DemKeyFormat::AesGcm { key_size: 24 };
        assert_matches!(key.parse(), Err(Error::MalformedKey(_)));
    }

    #[test]
    fn test_debug_redacts_private_scalar() {
        let key = sample_private_key();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&key.private_scalar));
    }
}
