//! Key-type registry
//!
//! The registry maps an opaque key-type url to a constructor that validates
//! key material and instantiates the matching hybrid primitive. It is
//! populated once during startup registration and read concurrently
//! afterwards. Tests construct isolated registries; production code
//! normally uses [`global_registry`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hybrid::{HybridDecrypt, HybridEncrypt};

/// The role key material plays when a primitive is constructed from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Construct an encryption primitive from a public-key record
    PublicKey,
    /// Construct a decryption primitive from a private-key record
    PrivateKey,
}

/// A constructed hybrid primitive, tagged by capability
pub enum HybridPrimitive {
    /// An encryption primitive
    Encrypt(Arc<dyn HybridEncrypt>),
    /// A decryption primitive
    Decrypt(Arc<dyn HybridDecrypt>),
}

impl HybridPrimitive {
    /// Extracts the encryption primitive, failing if the constructor
    /// returned the other capability.
    pub fn into_encrypt(self) -> Result<Arc<dyn HybridEncrypt>> {
        match self {
            HybridPrimitive::Encrypt(p) => Ok(p),
            HybridPrimitive::Decrypt(_) => Err(Error::Registration(
                "constructor returned a decryption primitive for a public-key role".to_string(),
            )),
        }
    }

    /// Extracts the decryption primitive, failing if the constructor
    /// returned the other capability.
    pub fn into_decrypt(self) -> Result<Arc<dyn HybridDecrypt>> {
        match self {
            HybridPrimitive::Decrypt(p) => Ok(p),
            HybridPrimitive::Encrypt(_) => Err(Error::Registration(
                "constructor returned an encryption primitive for a private-key role".to_string(),
            )),
        }
    }
}

/// Constructor validating key material and building a primitive for it
pub type PrimitiveConstructor =
    Arc<dyn Fn(&[u8], KeyRole) -> Result<HybridPrimitive> + Send + Sync + 'static>;

/// Registry of key-type constructors.
///
/// Registration and lookup are both safe under concurrency without caller
/// locking. The first registration for a url wins; repeating it is a no-op,
/// so bootstrap code may run more than once.
pub struct Registry {
    constructors: RwLock<HashMap<String, PrimitiveConstructor>>,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a constructor for `key_type_url`.
    ///
    /// If the url is already registered the existing constructor is kept and
    /// the call succeeds, so the table stays effectively write-once.
    pub fn register<F>(&self, key_type_url: &str, constructor: F) -> Result<()>
    where
        F: Fn(&[u8], KeyRole) -> Result<HybridPrimitive> + Send + Sync + 'static,
    {
        let mut map = self
            .constructors
            .write()
            .map_err(|_| Error::Registration("failed to acquire registry write lock".to_string()))?;
        if map.contains_key(key_type_url) {
            debug!("key type {} already registered, keeping existing constructor", key_type_url);
            return Ok(());
        }
        map.insert(key_type_url.to_string(), Arc::new(constructor));
        debug!("registered key type {}", key_type_url);
        Ok(())
    }

    /// Returns true if a constructor is registered for `key_type_url`
    pub fn is_registered(&self, key_type_url: &str) -> bool {
        self.constructors
            .read()
            .map(|map| map.contains_key(key_type_url))
            .unwrap_or(false)
    }

    /// Constructs a primitive for the given key material.
    ///
    /// Fails with [`Error::UnsupportedKeyType`] if no constructor is
    /// registered for the url; constructor errors propagate unchanged.
    pub fn new_primitive(
        &self,
        key_type_url: &str,
        key_material: &[u8],
        role: KeyRole,
    ) -> Result<HybridPrimitive> {
        let constructor = {
            let map = self.constructors.read().map_err(|_| {
                Error::Registration("failed to acquire registry read lock".to_string())
            })?;
            map.get(key_type_url)
                .cloned()
                .ok_or_else(|| Error::UnsupportedKeyType(key_type_url.to_string()))?
        };
        // Lock released before running the constructor.
        constructor(key_material, role)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Returns the process-wide registry used by the factories by default
pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct NullEncrypt(Vec<u8>);

    impl HybridEncrypt for NullEncrypt {
        fn encrypt(&self, _plaintext: &[u8], _context_info: &[u8]) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_unregistered_type_fails() {
        let registry = Registry::new();
        let result = registry.new_primitive("type.test/Missing", &[], KeyRole::PublicKey);
        assert_matches!(result, Err(Error::UnsupportedKeyType(url)) if url == "type.test/Missing");
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = Registry::new();
        registry
            .register("type.test/Dup", |_, _| {
                Ok(HybridPrimitive::Encrypt(Arc::new(NullEncrypt(vec![1]))))
            })
            .unwrap();
        // Second registration is accepted but must not replace the first.
        registry
            .register("type.test/Dup", |_, _| {
                Ok(HybridPrimitive::Encrypt(Arc::new(NullEncrypt(vec![2]))))
            })
            .unwrap();

        let primitive = registry
            .new_primitive("type.test/Dup", &[], KeyRole::PublicKey)
            .unwrap()
            .into_encrypt()
            .unwrap();
        assert_eq!(primitive.encrypt(b"", b"").unwrap(), vec![1]);
    }

    #[test]
    fn test_role_mismatch_surface() {
        let registry = Registry::new();
        registry
            .register("type.test/Enc", |_, _| {
                Ok(HybridPrimitive::Encrypt(Arc::new(NullEncrypt(vec![]))))
            })
            .unwrap();
        let primitive = registry
            .new_primitive("type.test/Enc", &[], KeyRole::PrivateKey)
            .unwrap();
        assert_matches!(primitive.into_decrypt(), Err(Error::Registration(_)));
    }

    #[test]
    fn test_concurrent_lookup_during_registration() {
        let registry = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for i in 0..8u8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                let url = format!("type.test/Key{}", i % 2);
                registry
                    .register(&url, |_, _| {
                        Ok(HybridPrimitive::Encrypt(Arc::new(NullEncrypt(vec![]))))
                    })
                    .unwrap();
                registry.is_registered(&url)
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
