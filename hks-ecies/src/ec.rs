//! Elliptic-curve key agreement
//!
//! Point (de)serialization and ECDH over the NIST curves. Adding a curve
//! means adding a variant here and extending the match arms; callers are
//! untouched.

use std::fmt;

use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use rand::rngs::OsRng;

use hks_core::{Error, Result};

/// Supported curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EllipticCurve {
    /// NIST P-256 (secp256r1)
    NistP256,
    /// NIST P-384 (secp384r1)
    NistP384,
    /// NIST P-521 (secp521r1)
    NistP521,
}

impl EllipticCurve {
    /// Returns the curve identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EllipticCurve::NistP256 => "NIST_P256",
            EllipticCurve::NistP384 => "NIST_P384",
            EllipticCurve::NistP521 => "NIST_P521",
        }
    }

    /// Parses a curve identifier
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "NIST_P256" => Ok(EllipticCurve::NistP256),
            "NIST_P384" => Ok(EllipticCurve::NistP384),
            "NIST_P521" => Ok(EllipticCurve::NistP521),
            _ => Err(Error::MalformedKey(format!("unrecognized curve {}", name))),
        }
    }

    /// Size of a field element (and of a private scalar) in bytes
    pub fn field_size(&self) -> usize {
        match self {
            EllipticCurve::NistP256 => 32,
            EllipticCurve::NistP384 => 48,
            EllipticCurve::NistP521 => 66,
        }
    }
}

/// Point serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcPointFormat {
    /// `0x04 || x || y`
    Uncompressed,
    /// parity byte (`0x02`/`0x03`) `|| x`
    Compressed,
}

impl EcPointFormat {
    /// Returns the format identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EcPointFormat::Uncompressed => "UNCOMPRESSED",
            EcPointFormat::Compressed => "COMPRESSED",
        }
    }

    /// Parses a format identifier
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "UNCOMPRESSED" => Ok(EcPointFormat::Uncompressed),
            "COMPRESSED" => Ok(EcPointFormat::Compressed),
            _ => Err(Error::MalformedKey(format!(
                "unrecognized point format {}",
                name
            ))),
        }
    }
}

/// Exact length of a point serialized for the given curve and format
pub fn encoded_point_len(curve: EllipticCurve, format: EcPointFormat) -> usize {
    let field_size = curve.field_size();
    match format {
        EcPointFormat::Uncompressed => 1 + 2 * field_size,
        EcPointFormat::Compressed => 1 + field_size,
    }
}

/// A validated public point on one of the supported curves
#[derive(Clone)]
pub enum EcPublicPoint {
    /// Point on NIST P-256
    NistP256(p256::PublicKey),
    /// Point on NIST P-384
    NistP384(p384::PublicKey),
    /// Point on NIST P-521
    NistP521(p521::PublicKey),
}

impl EcPublicPoint {
    /// Returns the curve this point lies on
    pub fn curve(&self) -> EllipticCurve {
        match self {
            EcPublicPoint::NistP256(_) => EllipticCurve::NistP256,
            EcPublicPoint::NistP384(_) => EllipticCurve::NistP384,
            EcPublicPoint::NistP521(_) => EllipticCurve::NistP521,
        }
    }
}

impl fmt::Debug for EcPublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcPublicPoint({})", self.curve().as_str())
    }
}

/// A private scalar on one of the supported curves
#[derive(Clone)]
pub enum EcPrivateKey {
    /// Scalar for NIST P-256
    NistP256(p256::SecretKey),
    /// Scalar for NIST P-384
    NistP384(p384::SecretKey),
    /// Scalar for NIST P-521
    NistP521(p521::SecretKey),
}

impl EcPrivateKey {
    /// Returns the curve of this key
    pub fn curve(&self) -> EllipticCurve {
        match self {
            EcPrivateKey::NistP256(_) => EllipticCurve::NistP256,
            EcPrivateKey::NistP384(_) => EllipticCurve::NistP384,
            EcPrivateKey::NistP521(_) => EllipticCurve::NistP521,
        }
    }

    /// Derives the public point matching this scalar
    pub fn public_point(&self) -> EcPublicPoint {
        match self {
            EcPrivateKey::NistP256(sk) => EcPublicPoint::NistP256(sk.public_key()),
            EcPrivateKey::NistP384(sk) => EcPublicPoint::NistP384(sk.public_key()),
            EcPrivateKey::NistP521(sk) => EcPublicPoint::NistP521(sk.public_key()),
        }
    }

    /// Returns the scalar as big-endian bytes, zero-padded to the field size
    pub fn scalar_bytes(&self) -> Vec<u8> {
        match self {
            EcPrivateKey::NistP256(sk) => sk.to_bytes().to_vec(),
            EcPrivateKey::NistP384(sk) => sk.to_bytes().to_vec(),
            EcPrivateKey::NistP521(sk) => sk.to_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcPrivateKey({})", self.curve().as_str())
    }
}

/// Generates a fresh private key on the curve
pub fn generate_private_key(curve: EllipticCurve) -> EcPrivateKey {
    match curve {
        EllipticCurve::NistP256 => EcPrivateKey::NistP256(p256::SecretKey::random(&mut OsRng)),
        EllipticCurve::NistP384 => EcPrivateKey::NistP384(p384::SecretKey::random(&mut OsRng)),
        EllipticCurve::NistP521 => EcPrivateKey::NistP521(p521::SecretKey::random(&mut OsRng)),
    }
}

/// Parses a big-endian private scalar.
///
/// Leading zero bytes are tolerated; a value longer than the field size or
/// outside the group order fails with [`Error::InvalidKey`].
pub fn private_key_from_scalar(curve: EllipticCurve, scalar: &[u8]) -> Result<EcPrivateKey> {
    let field_size = curve.field_size();
    let significant = {
        let start = scalar.iter().position(|b| *b != 0).unwrap_or(scalar.len());
        &scalar[start..]
    };
    if significant.len() > field_size {
        return Err(Error::InvalidKey(format!(
            "private scalar exceeds the {}-byte field of {}",
            field_size,
            curve.as_str()
        )));
    }
    let mut padded = vec![0u8; field_size];
    padded[field_size - significant.len()..].copy_from_slice(significant);
    let out_of_range =
        || Error::InvalidKey(format!("private scalar out of range for {}", curve.as_str()));
    match curve {
        EllipticCurve::NistP256 => p256::SecretKey::from_slice(&padded)
            .map(EcPrivateKey::NistP256)
            .map_err(|_| out_of_range()),
        EllipticCurve::NistP384 => p384::SecretKey::from_slice(&padded)
            .map(EcPrivateKey::NistP384)
            .map_err(|_| out_of_range()),
        EllipticCurve::NistP521 => p521::SecretKey::from_slice(&padded)
            .map(EcPrivateKey::NistP521)
            .map_err(|_| out_of_range()),
    }
}

/// Serializes a point in the given format
pub fn serialize_point(point: &EcPublicPoint, format: EcPointFormat) -> Vec<u8> {
    let compress = matches!(format, EcPointFormat::Compressed);
    match point {
        EcPublicPoint::NistP256(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
        EcPublicPoint::NistP384(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
        EcPublicPoint::NistP521(pk) => pk.to_encoded_point(compress).as_bytes().to_vec(),
    }
}

/// Deserializes and validates a point.
///
/// The input length must match the curve/format exactly; the decoded point
/// must satisfy the curve equation and must not be the point at infinity.
/// Any violation fails with [`Error::MalformedPoint`].
pub fn deserialize_point(
    curve: EllipticCurve,
    format: EcPointFormat,
    bytes: &[u8],
) -> Result<EcPublicPoint> {
    let expected = encoded_point_len(curve, format);
    if bytes.len() != expected {
        return Err(Error::MalformedPoint(format!(
            "expected {} bytes for a {} {} point, got {}",
            expected,
            curve.as_str(),
            format.as_str(),
            bytes.len()
        )));
    }
    let off_curve = || Error::MalformedPoint(format!("point is not on {}", curve.as_str()));
    match curve {
        EllipticCurve::NistP256 => {
            let encoded = p256::EncodedPoint::from_bytes(bytes)
                .map_err(|e| Error::MalformedPoint(format!("SEC1 decoding failed: {}", e)))?;
            let point = p256::PublicKey::from_encoded_point(&encoded);
            if point.is_none().into() {
                return Err(off_curve());
            }
            Ok(EcPublicPoint::NistP256(point.unwrap()))
        }
        EllipticCurve::NistP384 => {
            let encoded = p384::EncodedPoint::from_bytes(bytes)
                .map_err(|e| Error::MalformedPoint(format!("SEC1 decoding failed: {}", e)))?;
            let point = p384::PublicKey::from_encoded_point(&encoded);
            if point.is_none().into() {
                return Err(off_curve());
            }
            Ok(EcPublicPoint::NistP384(point.unwrap()))
        }
        EllipticCurve::NistP521 => {
            let encoded = p521::EncodedPoint::from_bytes(bytes)
                .map_err(|e| Error::MalformedPoint(format!("SEC1 decoding failed: {}", e)))?;
            let point = p521::PublicKey::from_encoded_point(&encoded);
            if point.is_none().into() {
                return Err(off_curve());
            }
            Ok(EcPublicPoint::NistP521(point.unwrap()))
        }
    }
}

/// Computes the ECDH shared secret between a static private key and a peer
/// point.
///
/// The output is the x-coordinate of the shared point, zero-padded to the
/// field size. Fails with [`Error::InvalidKey`] if the key and point are on
/// different curves.
pub fn compute_shared_secret(private_key: &EcPrivateKey, peer: &EcPublicPoint) -> Result<Vec<u8>> {
    match (private_key, peer) {
        (EcPrivateKey::NistP256(sk), EcPublicPoint::NistP256(pk)) => {
            let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
        (EcPrivateKey::NistP384(sk), EcPublicPoint::NistP384(pk)) => {
            let shared = p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
        (EcPrivateKey::NistP521(sk), EcPublicPoint::NistP521(pk)) => {
            let shared = p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
        _ => Err(Error::InvalidKey(format!(
            "curve mismatch: private key on {}, peer point on {}",
            private_key.curve().as_str(),
            peer.curve().as_str()
        ))),
    }
}

/// Runs one ephemeral ECDH against the peer point.
///
/// A fresh key pair is generated on every call and dropped after use;
/// returns the ephemeral public point serialized in `format` together with
/// the shared secret.
pub fn ephemeral_diffie_hellman(
    peer: &EcPublicPoint,
    format: EcPointFormat,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let compress = matches!(format, EcPointFormat::Compressed);
    match peer {
        EcPublicPoint::NistP256(pk) => {
            let ephemeral = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let kem = ephemeral
                .public_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec();
            let shared = ephemeral.diffie_hellman(pk);
            Ok((kem, shared.raw_secret_bytes().to_vec()))
        }
        EcPublicPoint::NistP384(pk) => {
            let ephemeral = p384::ecdh::EphemeralSecret::random(&mut OsRng);
            let kem = ephemeral
                .public_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec();
            let shared = ephemeral.diffie_hellman(pk);
            Ok((kem, shared.raw_secret_bytes().to_vec()))
        }
        EcPublicPoint::NistP521(pk) => {
            let ephemeral = p521::ecdh::EphemeralSecret::random(&mut OsRng);
            let kem = ephemeral
                .public_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec();
            let shared = ephemeral.diffie_hellman(pk);
            Ok((kem, shared.raw_secret_bytes().to_vec()))
        }
    }
}
