//! HKS core: keyset model, key-type registry and hybrid primitive factories
//!
//! This crate holds the key-management side of HKS: a keyset is an ordered
//! collection of key records with one designated primary key; the registry
//! maps key-type urls to primitive constructors; the factories turn a
//! validated keyset handle into an aggregate hybrid encrypter or decrypter
//! that hides key rotation and wire-format prefixing from callers.
//!
//! The concrete ECIES-AEAD-HKDF primitive family lives in the `hks-ecies`
//! crate, which registers itself with the registry at startup.

/// Error types
pub mod error;

/// Factories building aggregate primitives from keyset handles
pub mod factory;

/// Hybrid primitive traits
pub mod hybrid;

/// Keyset model and handle
pub mod keyset;

/// Key-type registry
pub mod registry;

// Re-export key types for convenience
pub use error::{Error, Result};
pub use factory::{HybridDecryptFactory, HybridEncryptFactory};
pub use hybrid::{HybridDecrypt, HybridEncrypt};
pub use keyset::{
    KeyInfo, KeyRecord, KeyStatus, Keyset, KeysetHandle, OutputPrefixType, LEGACY_START_BYTE,
    NON_RAW_PREFIX_SIZE, TINK_START_BYTE,
};
pub use registry::{global_registry, HybridPrimitive, KeyRole, PrimitiveConstructor, Registry};

/// Version of the HKS core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
