//! ECIES-AEAD-HKDF hybrid primitives
//!
//! Composition of ephemeral EC key agreement, HKDF and an AEAD DEM behind
//! the `HybridEncrypt`/`HybridDecrypt` traits. The ciphertext layout is
//! `serialized_ephemeral_point || dem_ciphertext`; the point's length is
//! fixed by curve and format, the DEM consumes the remainder.

use hks_core::{Error, HybridDecrypt, HybridEncrypt, Result};

use crate::dem::AeadDem;
use crate::ec::{self, EcPrivateKey, EcPublicPoint};
use crate::kdf;
use crate::key::{EciesAeadHkdfPrivateKey, EciesAeadHkdfPublicKey, ParsedParams};

/// Hybrid encrypter keyed by a recipient public key
pub struct EciesAeadHkdfHybridEncrypt {
    recipient: EcPublicPoint,
    params: ParsedParams,
}

impl EciesAeadHkdfHybridEncrypt {
    /// Validates the public-key record and builds the encrypter
    pub fn new(key: &EciesAeadHkdfPublicKey) -> Result<Self> {
        let (params, recipient) = key.parse()?;
        Ok(Self { recipient, params })
    }
}

impl HybridEncrypt for EciesAeadHkdfHybridEncrypt {
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>> {
        // Fresh ephemeral key pair per call; reuse would void the scheme's
        // security guarantees.
        let (kem_bytes, shared_secret) =
            ec::ephemeral_diffie_hellman(&self.recipient, self.params.point_format)?;
        let dem_key = kdf::compute_hkdf(
            self.params.hash,
            &shared_secret,
            &self.params.salt,
            context_info,
            self.params.dem.key_material_size(),
        )?;
        let dem = AeadDem::new(self.params.dem.clone(), dem_key)?;
        let dem_ciphertext = dem.seal(plaintext, b"")?;
        let mut out = Vec::with_capacity(kem_bytes.len() + dem_ciphertext.len());
        out.extend_from_slice(&kem_bytes);
        out.extend_from_slice(&dem_ciphertext);
        Ok(out)
    }
}

/// Hybrid decrypter keyed by the matching private key
pub struct EciesAeadHkdfHybridDecrypt {
    private_key: EcPrivateKey,
    params: ParsedParams,
}

impl EciesAeadHkdfHybridDecrypt {
    /// Validates the private-key record and builds the decrypter
    pub fn new(key: &EciesAeadHkdfPrivateKey) -> Result<Self> {
        let (params, private_key) = key.parse()?;
        Ok(Self {
            private_key,
            params,
        })
    }
}

impl HybridDecrypt for EciesAeadHkdfHybridDecrypt {
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>> {
        let header_len = ec::encoded_point_len(self.params.curve, self.params.point_format);
        if ciphertext.len() < header_len {
            return Err(Error::MalformedCiphertext(format!(
                "ciphertext shorter than the {}-byte KEM header",
                header_len
            )));
        }
        let (kem_bytes, dem_ciphertext) = ciphertext.split_at(header_len);
        let ephemeral_point =
            ec::deserialize_point(self.params.curve, self.params.point_format, kem_bytes)?;
        let shared_secret = ec::compute_shared_secret(&self.private_key, &ephemeral_point)?;
        let dem_key = kdf::compute_hkdf(
            self.params.hash,
            &shared_secret,
            &self.params.salt,
            context_info,
            self.params.dem.key_material_size(),
        )?;
        let dem = AeadDem::new(self.params.dem.clone(), dem_key)?;
        dem.open(dem_ciphertext, b"")
    }
}
