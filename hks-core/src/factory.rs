//! Hybrid encrypt/decrypt factories
//!
//! The factories turn a validated [`KeysetHandle`] into an aggregate
//! primitive: encryption always goes through the single primary key, while
//! decryption tries every enabled key, routed by the ciphertext's output
//! prefix where one is present.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::hybrid::{HybridDecrypt, HybridEncrypt};
use crate::keyset::{KeyStatus, KeysetHandle, OutputPrefixType, NON_RAW_PREFIX_SIZE};
use crate::registry::{global_registry, KeyRole, Registry};

/// Builds aggregate [`HybridEncrypt`] primitives from keyset handles
pub struct HybridEncryptFactory;

impl HybridEncryptFactory {
    /// Builds an encrypter from the handle using the process-wide registry
    pub fn primitive(handle: &KeysetHandle) -> Result<Arc<dyn HybridEncrypt>> {
        Self::primitive_with_registry(global_registry(), handle)
    }

    /// Builds an encrypter from the handle using an explicit registry.
    ///
    /// The aggregate always encrypts under the keyset's primary key and
    /// prepends that key's output prefix. Construction fails fast: a caller
    /// never receives a half-usable primitive.
    pub fn primitive_with_registry(
        registry: &Registry,
        handle: &KeysetHandle,
    ) -> Result<Arc<dyn HybridEncrypt>> {
        let keyset = handle.keyset();
        let primary = keyset
            .keys()
            .iter()
            .find(|k| k.key_id() == keyset.primary_key_id() && k.status() == KeyStatus::Enabled)
            .ok_or(Error::NoPrimaryKey)?;
        let primitive = registry
            .new_primitive(primary.key_type_url(), primary.key_material(), KeyRole::PublicKey)?
            .into_encrypt()?;
        debug!("built hybrid encrypter for primary key {}", primary.key_id());
        Ok(Arc::new(PrefixedHybridEncrypt {
            primitive,
            prefix: primary.output_prefix(),
        }))
    }
}

struct PrefixedHybridEncrypt {
    primitive: Arc<dyn HybridEncrypt>,
    prefix: Vec<u8>,
}

impl HybridEncrypt for PrefixedHybridEncrypt {
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = self.primitive.encrypt(plaintext, context_info)?;
        let mut out = Vec::with_capacity(self.prefix.len() + ciphertext.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

/// Builds aggregate [`HybridDecrypt`] primitives from keyset handles
pub struct HybridDecryptFactory;

impl HybridDecryptFactory {
    /// Builds a decrypter from the handle using the process-wide registry
    pub fn primitive(handle: &KeysetHandle) -> Result<Arc<dyn HybridDecrypt>> {
        Self::primitive_with_registry(global_registry(), handle)
    }

    /// Builds a decrypter covering every enabled key in the keyset.
    ///
    /// Disabled and destroyed keys are skipped. Fails with
    /// [`Error::EmptyKeyset`] if no enabled key remains; constructor errors
    /// for any enabled key fail the whole build.
    pub fn primitive_with_registry(
        registry: &Registry,
        handle: &KeysetHandle,
    ) -> Result<Arc<dyn HybridDecrypt>> {
        let mut prefixed = Vec::new();
        let mut raw = Vec::new();
        for key in handle.keyset().keys() {
            if key.status() != KeyStatus::Enabled {
                continue;
            }
            let primitive = registry
                .new_primitive(key.key_type_url(), key.key_material(), KeyRole::PrivateKey)?
                .into_decrypt()?;
            let entry = DecryptEntry {
                prefix: key.output_prefix(),
                primitive,
            };
            match key.output_prefix_type() {
                OutputPrefixType::Raw => raw.push(entry),
                _ => prefixed.push(entry),
            }
        }
        if prefixed.is_empty() && raw.is_empty() {
            return Err(Error::EmptyKeyset);
        }
        debug!(
            "built hybrid decrypter over {} prefixed and {} raw keys",
            prefixed.len(),
            raw.len()
        );
        Ok(Arc::new(KeysetHybridDecrypt { prefixed, raw }))
    }
}

struct DecryptEntry {
    prefix: Vec<u8>,
    primitive: Arc<dyn HybridDecrypt>,
}

struct KeysetHybridDecrypt {
    prefixed: Vec<DecryptEntry>,
    raw: Vec<DecryptEntry>,
}

impl HybridDecrypt for KeysetHybridDecrypt {
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>> {
        // Prefix-matched candidates first: O(1) in the common case. Trial
        // order within each class is keyset order, so dispatch is
        // deterministic per call. Individual failures are swallowed; only
        // the terminal error below leaves the aggregate.
        if ciphertext.len() >= NON_RAW_PREFIX_SIZE {
            let (header, body) = ciphertext.split_at(NON_RAW_PREFIX_SIZE);
            for entry in self.prefixed.iter().filter(|e| e.prefix == header) {
                match entry.primitive.decrypt(body, context_info) {
                    Ok(plaintext) => return Ok(plaintext),
                    Err(e) => debug!("prefixed decryption attempt failed: {}", e),
                }
            }
        }
        for entry in &self.raw {
            match entry.primitive.decrypt(ciphertext, context_info) {
                Ok(plaintext) => return Ok(plaintext),
                Err(e) => debug!("raw decryption attempt failed: {}", e),
            }
        }
        Err(Error::DecryptionFailed)
    }
}
