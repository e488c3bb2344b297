//! Keyset model
//!
//! A keyset is an ordered collection of key records, each carrying a
//! status, a numeric id and an output-prefix policy, with exactly one
//! designated primary key. [`KeysetHandle`] wraps a validated keyset and is
//! the only type the factories accept; raw key material never crosses that
//! boundary again.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// First byte of the output prefix of Tink-type keys
pub const TINK_START_BYTE: u8 = 0x01;

/// First byte of the output prefix of Legacy- and Crunchy-type keys
pub const LEGACY_START_BYTE: u8 = 0x00;

/// Length of the non-empty output prefixes: 1 start byte + 4 key id bytes
pub const NON_RAW_PREFIX_SIZE: usize = 5;

/// Status of a key within a keyset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStatus {
    /// The key may be used for encryption and decryption
    Enabled,
    /// The key is kept but must not be used
    Disabled,
    /// The key material has been destroyed; only metadata remains
    Destroyed,
}

/// Output-prefix policy of a key.
///
/// The prefix is a short tag prepended to every ciphertext produced under
/// the key, letting a decrypting party route a ciphertext to the right key
/// without out-of-band metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPrefixType {
    /// No prefix; the ciphertext is the bare primitive output
    Raw,
    /// `0x01 || key_id` (big-endian)
    Tink,
    /// `0x00 || key_id`, reserved for backward-compatible ciphertexts
    Legacy,
    /// `0x00 || key_id`, same framing as Legacy
    Crunchy,
}

/// One entry in a keyset. Immutable once constructed.
#[derive(Clone)]
pub struct KeyRecord {
    key_id: u32,
    status: KeyStatus,
    output_prefix_type: OutputPrefixType,
    key_type_url: String,
    key_material: Vec<u8>,
}

impl KeyRecord {
    /// Creates a key record from already-deserialized fields.
    ///
    /// `key_material` is the byte-serialized key-type-specific record; it is
    /// opaque to this crate and only handed to the registry's constructor
    /// for the matching `key_type_url`.
    pub fn new(
        key_id: u32,
        status: KeyStatus,
        output_prefix_type: OutputPrefixType,
        key_type_url: impl Into<String>,
        key_material: Vec<u8>,
    ) -> Self {
        Self {
            key_id,
            status,
            output_prefix_type,
            key_type_url: key_type_url.into(),
            key_material,
        }
    }

    /// Returns the numeric key id
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Returns the key status
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// Returns the output-prefix policy
    pub fn output_prefix_type(&self) -> OutputPrefixType {
        self.output_prefix_type
    }

    /// Returns the key type url identifying the constructor for this key
    pub fn key_type_url(&self) -> &str {
        &self.key_type_url
    }

    pub(crate) fn key_material(&self) -> &[u8] {
        &self.key_material
    }

    /// Computes the output prefix for this key.
    ///
    /// Prefixes are derived on demand from `(output_prefix_type, key_id)`
    /// and never stored.
    pub fn output_prefix(&self) -> Vec<u8> {
        let start = match self.output_prefix_type {
            OutputPrefixType::Raw => return Vec::new(),
            OutputPrefixType::Tink => TINK_START_BYTE,
            OutputPrefixType::Legacy | OutputPrefixType::Crunchy => LEGACY_START_BYTE,
        };
        let mut prefix = Vec::with_capacity(NON_RAW_PREFIX_SIZE);
        prefix.push(start);
        prefix.extend_from_slice(&self.key_id.to_be_bytes());
        prefix
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("key_id", &self.key_id)
            .field("status", &self.status)
            .field("output_prefix_type", &self.output_prefix_type)
            .field("key_type_url", &self.key_type_url)
            .field("key_material", &"<redacted>")
            .finish()
    }
}

/// An ordered collection of key records with a designated primary key
#[derive(Debug, Clone)]
pub struct Keyset {
    keys: Vec<KeyRecord>,
    primary_key_id: u32,
}

impl Keyset {
    /// Creates a keyset. Invariants are checked by [`KeysetHandle::try_new`].
    pub fn new(keys: Vec<KeyRecord>, primary_key_id: u32) -> Self {
        Self {
            keys,
            primary_key_id,
        }
    }

    /// Returns the key records in keyset order
    pub fn keys(&self) -> &[KeyRecord] {
        &self.keys
    }

    /// Returns the id of the primary key
    pub fn primary_key_id(&self) -> u32 {
        self.primary_key_id
    }
}

/// Metadata of one key, safe to expose and serialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    /// Numeric key id
    pub key_id: u32,
    /// Key status
    pub status: KeyStatus,
    /// Output-prefix policy
    pub output_prefix_type: OutputPrefixType,
    /// Key type url
    pub key_type_url: String,
}

/// A validated keyset, and the trust boundary around its key material.
///
/// Construction checks the keyset invariants; afterwards the handle only
/// exposes metadata. The factories consume handles directly.
#[derive(Debug, Clone)]
pub struct KeysetHandle {
    keyset: Keyset,
}

impl KeysetHandle {
    /// Validates the keyset invariants and wraps the keyset.
    ///
    /// Fails with [`Error::InvalidKeyset`] if the keyset is empty or contains
    /// duplicate key ids, and with [`Error::NoPrimaryKey`] if the primary key
    /// id does not name an enabled key.
    pub fn try_new(keyset: Keyset) -> Result<Self> {
        if keyset.keys().is_empty() {
            return Err(Error::InvalidKeyset("keyset contains no keys".to_string()));
        }
        let mut seen = HashSet::new();
        for key in keyset.keys() {
            if !seen.insert(key.key_id()) {
                return Err(Error::InvalidKeyset(format!(
                    "duplicate key id {}",
                    key.key_id()
                )));
            }
        }
        match keyset
            .keys()
            .iter()
            .find(|k| k.key_id() == keyset.primary_key_id())
        {
            Some(primary) if primary.status() == KeyStatus::Enabled => {}
            _ => return Err(Error::NoPrimaryKey),
        }
        Ok(Self { keyset })
    }

    /// Returns the id of the primary key
    pub fn primary_key_id(&self) -> u32 {
        self.keyset.primary_key_id()
    }

    /// Returns the number of keys in the keyset
    pub fn len(&self) -> usize {
        self.keyset.keys().len()
    }

    /// Returns true if the keyset holds no keys (never true for a validated handle)
    pub fn is_empty(&self) -> bool {
        self.keyset.keys().is_empty()
    }

    /// Returns metadata for every key, in keyset order
    pub fn key_info(&self) -> Vec<KeyInfo> {
        self.keyset
            .keys()
            .iter()
            .map(|k| KeyInfo {
                key_id: k.key_id(),
                status: k.status(),
                output_prefix_type: k.output_prefix_type(),
                key_type_url: k.key_type_url().to_string(),
            })
            .collect()
    }

    pub(crate) fn keyset(&self) -> &Keyset {
        &self.keyset
    }
}
