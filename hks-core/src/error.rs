//! Error handling for the HKS core
//!
//! This module provides the error types shared by the keyset model, the
//! key-type registry and the hybrid primitive factories.

use thiserror::Error;

/// Type alias for Results with HKS errors
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for keyset handling and hybrid encryption
#[derive(Error, Debug)]
pub enum Error {
    /// Key material failed to parse or failed cross-field validation
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// No constructor is registered for the key type url
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The keyset's primary key id does not name an enabled key
    #[error("No enabled primary key in keyset")]
    NoPrimaryKey,

    /// The keyset contains no enabled keys
    #[error("Keyset contains no enabled keys")]
    EmptyKeyset,

    /// Keyset invariant violation (duplicate ids, no keys at all)
    #[error("Invalid keyset: {0}")]
    InvalidKeyset(String),

    /// Ciphertext is structurally invalid (truncated header, bad framing)
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// An EC point failed to decode or is not on the curve
    #[error("Malformed point: {0}")]
    MalformedPoint(String),

    /// A stored key is unusable (curve mismatch, scalar out of range)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Unrecognized hash function identifier
    #[error("Unsupported hash: {0}")]
    UnsupportedHash(String),

    /// Requested output length is out of range for the construction
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// An AEAD tag did not verify
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// No key in the keyset could decrypt the ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Registry bookkeeping error
    #[error("Registration error: {0}")]
    Registration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected failure inside a cryptographic backend
    #[error("Crypto error: {0}")]
    Crypto(String),
}
