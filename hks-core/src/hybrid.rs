//! Hybrid encryption primitive traits
//!
//! These traits are the seam between the keyset layer and the concrete
//! hybrid schemes. A `HybridEncrypt` is keyed by a recipient public key; a
//! `HybridDecrypt` by the matching private key. Implementations are
//! immutable after construction and safe to share across threads behind an
//! `Arc`.

use crate::error::Result;

/// Public-key encryption of arbitrary-length data.
///
/// `context_info` binds the ciphertext to application context (for example
/// a recipient identity). It is not secret, but the same bytes must be
/// supplied on decryption or authentication fails.
pub trait HybridEncrypt: Send + Sync {
    /// Encrypts `plaintext`, binding `context_info` into the ciphertext.
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>>;
}

/// Decryption counterpart of [`HybridEncrypt`].
pub trait HybridDecrypt: Send + Sync {
    /// Decrypts `ciphertext` produced with the same `context_info`.
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>>;
}
