//! HKDF key derivation
//!
//! Implements RFC 5869 extract-then-expand over a selectable hash, used to
//! turn an ECDH shared secret into DEM key material.

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};

use hks_core::{Error, Result};

/// Hash functions supported for HKDF and HMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashType {
    /// Returns the hash identifier as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            HashType::Sha256 => "SHA256",
            HashType::Sha384 => "SHA384",
            HashType::Sha512 => "SHA512",
        }
    }

    /// Parses a hash identifier
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "SHA256" => Ok(HashType::Sha256),
            "SHA384" => Ok(HashType::Sha384),
            "SHA512" => Ok(HashType::Sha512),
            _ => Err(Error::UnsupportedHash(name.to_string())),
        }
    }

    /// Digest output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            HashType::Sha256 => 32,
            HashType::Sha384 => 48,
            HashType::Sha512 => 64,
        }
    }
}

/// Derives `okm_len` bytes of key material.
///
/// An empty `salt` is treated as the RFC 5869 default of hash-length
/// zeros. Fails with [`Error::InvalidLength`] if `okm_len` exceeds
/// `255 * hash_len`.
pub fn compute_hkdf(
    hash: HashType,
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    okm_len: usize,
) -> Result<Vec<u8>> {
    if okm_len > 255 * hash.output_size() {
        return Err(Error::InvalidLength(format!(
            "requested {} bytes, HKDF over {} yields at most {}",
            okm_len,
            hash.as_str(),
            255 * hash.output_size()
        )));
    }
    let salt = if salt.is_empty() { None } else { Some(salt) };
    let mut okm = vec![0u8; okm_len];
    let expand_failed = || Error::InvalidLength("HKDF expand failed".to_string());
    match hash {
        HashType::Sha256 => Hkdf::<Sha256>::new(salt, ikm)
            .expand(info, &mut okm)
            .map_err(|_| expand_failed())?,
        HashType::Sha384 => Hkdf::<Sha384>::new(salt, ikm)
            .expand(info, &mut okm)
            .map_err(|_| expand_failed())?,
        HashType::Sha512 => Hkdf::<Sha512>::new(salt, ikm)
            .expand(info, &mut okm)
            .map_err(|_| expand_failed())?,
    }
    Ok(okm)
}
