//! ECIES-AEAD-HKDF hybrid primitives for HKS
//!
//! This crate provides the concrete hybrid-encryption family consumed by
//! the `hks-core` factories: elliptic-curve key agreement over the NIST
//! curves, HKDF key derivation, and two AEAD DEMs (AES-GCM and
//! AES-CTR + HMAC). Call [`register_standard_key_types`] once at startup so
//! the factories can resolve ECIES key records.

/// AEAD data encapsulation
pub mod dem;

/// Elliptic-curve key agreement
pub mod ec;

/// ECIES-AEAD-HKDF composition
pub mod hybrid;

/// HKDF key derivation
pub mod kdf;

/// Key records and validation
pub mod key;

/// Utilities for generating keys and keysets in tests and examples
pub mod test_utils;

use std::sync::Arc;

use hks_core::{global_registry, Error, HybridPrimitive, KeyRole, Registry, Result};

// Re-export key types for convenience
pub use dem::{AeadDem, AeadDemParams};
pub use ec::{EcPointFormat, EllipticCurve};
pub use hybrid::{EciesAeadHkdfHybridDecrypt, EciesAeadHkdfHybridEncrypt};
pub use kdf::HashType;
pub use key::{
    DemKeyFormat, EciesAeadHkdfParams, EciesAeadHkdfPrivateKey, EciesAeadHkdfPublicKey,
    ECIES_AEAD_HKDF_PRIVATE_KEY_TYPE_URL, ECIES_AEAD_HKDF_PUBLIC_KEY_TYPE_URL,
};

/// Version of the HKS ECIES crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registers the ECIES-AEAD-HKDF constructors with `registry`.
///
/// Safe to call more than once; an already-registered url keeps its
/// existing constructor.
pub fn register_key_types(registry: &Registry) -> Result<()> {
    tracing::debug!("registering ECIES-AEAD-HKDF key types");
    registry.register(ECIES_AEAD_HKDF_PUBLIC_KEY_TYPE_URL, |material, role| {
        match role {
            KeyRole::PublicKey => {
                let key = EciesAeadHkdfPublicKey::from_bytes(material)?;
                Ok(HybridPrimitive::Encrypt(Arc::new(
                    EciesAeadHkdfHybridEncrypt::new(&key)?,
                )))
            }
            KeyRole::PrivateKey => Err(Error::MalformedKey(
                "public key material cannot back a decryption primitive".to_string(),
            )),
        }
    })?;
    registry.register(ECIES_AEAD_HKDF_PRIVATE_KEY_TYPE_URL, |material, role| {
        match role {
            KeyRole::PrivateKey => {
                let key = EciesAeadHkdfPrivateKey::from_bytes(material)?;
                Ok(HybridPrimitive::Decrypt(Arc::new(
                    EciesAeadHkdfHybridDecrypt::new(&key)?,
                )))
            }
            KeyRole::PublicKey => Err(Error::MalformedKey(
                "private key material cannot back an encryption primitive".to_string(),
            )),
        }
    })?;
    Ok(())
}

/// Registers the standard key types with the process-wide registry.
///
/// Must run before any factory uses the default registry; omitting it makes
/// every build fail with `UnsupportedKeyType`.
pub fn register_standard_key_types() -> Result<()> {
    register_key_types(global_registry())
}
