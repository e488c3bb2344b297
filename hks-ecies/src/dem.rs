//! AEAD data encapsulation
//!
//! The symmetric half of the hybrid scheme. Two interchangeable variants
//! share one seal/open contract: AES-GCM, and a composed AES-CTR + HMAC
//! construction for deployments that predate GCM hardware.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use ctr::Ctr128BE;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha384, Sha512};

use hks_core::{Error, Result};

use crate::kdf::HashType;

/// AES-GCM nonce size in bytes
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// AES-GCM tag size in bytes
pub const AES_GCM_TAG_SIZE: usize = 16;

/// Parameters of a DEM instance.
///
/// Describes how much key material the DEM consumes and how its ciphertext
/// is framed; the material itself is derived per message by HKDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AeadDemParams {
    /// AES-GCM with a 128- or 256-bit key
    AesGcm {
        /// AES key size in bytes (16 or 32)
        key_size: usize,
    },
    /// AES-CTR encryption authenticated by a truncated HMAC
    AesCtrHmac {
        /// AES key size in bytes (16 or 32)
        aes_key_size: usize,
        /// IV size in bytes (12 to 16)
        iv_size: usize,
        /// HMAC key size in bytes (at least 16)
        hmac_key_size: usize,
        /// Truncated tag size in bytes (at least 10, at most the digest size)
        tag_size: usize,
        /// Hash backing the HMAC
        hmac_hash: HashType,
    },
}

impl AeadDemParams {
    /// Total key material the DEM consumes
    pub fn key_material_size(&self) -> usize {
        match self {
            AeadDemParams::AesGcm { key_size } => *key_size,
            AeadDemParams::AesCtrHmac {
                aes_key_size,
                hmac_key_size,
                ..
            } => aes_key_size + hmac_key_size,
        }
    }

    /// Checks the parameter ranges
    pub fn validate(&self) -> Result<()> {
        match self {
            AeadDemParams::AesGcm { key_size } => {
                if *key_size != 16 && *key_size != 32 {
                    return Err(Error::MalformedKey(format!(
                        "AES-GCM key size must be 16 or 32 bytes, got {}",
                        key_size
                    )));
                }
            }
            AeadDemParams::AesCtrHmac {
                aes_key_size,
                iv_size,
                hmac_key_size,
                tag_size,
                hmac_hash,
            } => {
                if *aes_key_size != 16 && *aes_key_size != 32 {
                    return Err(Error::MalformedKey(format!(
                        "AES-CTR key size must be 16 or 32 bytes, got {}",
                        aes_key_size
                    )));
                }
                if *iv_size < 12 || *iv_size > 16 {
                    return Err(Error::MalformedKey(format!(
                        "AES-CTR IV size must be between 12 and 16 bytes, got {}",
                        iv_size
                    )));
                }
                if *hmac_key_size < 16 {
                    return Err(Error::MalformedKey(format!(
                        "HMAC key size must be at least 16 bytes, got {}",
                        hmac_key_size
                    )));
                }
                if *tag_size < 10 || *tag_size > hmac_hash.output_size() {
                    return Err(Error::MalformedKey(format!(
                        "tag size must be between 10 and {} bytes for {}, got {}",
                        hmac_hash.output_size(),
                        hmac_hash.as_str(),
                        tag_size
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A DEM instance bound to one message's key material
pub struct AeadDem {
    params: AeadDemParams,
    key_material: Vec<u8>,
}

impl AeadDem {
    /// Binds validated parameters to derived key material.
    ///
    /// `key_material` must be exactly `params.key_material_size()` bytes.
    pub fn new(params: AeadDemParams, key_material: Vec<u8>) -> Result<Self> {
        params.validate()?;
        if key_material.len() != params.key_material_size() {
            return Err(Error::InvalidKey(format!(
                "DEM key material must be {} bytes, got {}",
                params.key_material_size(),
                key_material.len()
            )));
        }
        Ok(Self {
            params,
            key_material,
        })
    }

    /// Encrypts and authenticates `plaintext` with `associated_data`
    pub fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match self.params.clone() {
            AeadDemParams::AesGcm { .. } => self.seal_gcm(plaintext, associated_data),
            AeadDemParams::AesCtrHmac {
                aes_key_size,
                iv_size,
                tag_size,
                hmac_hash,
                ..
            } => self.seal_ctr_hmac(
                plaintext,
                associated_data,
                aes_key_size,
                iv_size,
                tag_size,
                hmac_hash,
            ),
        }
    }

    /// Verifies and decrypts `ciphertext` produced with the same
    /// `associated_data`.
    ///
    /// Size-truncated inputs are rejected with
    /// [`Error::MalformedCiphertext`] before any decryption; a tag mismatch
    /// is [`Error::AuthenticationFailure`] and no plaintext is released.
    pub fn open(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match self.params.clone() {
            AeadDemParams::AesGcm { .. } => self.open_gcm(ciphertext, associated_data),
            AeadDemParams::AesCtrHmac {
                aes_key_size,
                iv_size,
                tag_size,
                hmac_hash,
                ..
            } => self.open_ctr_hmac(
                ciphertext,
                associated_data,
                aes_key_size,
                iv_size,
                tag_size,
                hmac_hash,
            ),
        }
    }

    fn seal_gcm(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        // Imported here so the trait does not shadow `Mac::new_from_slice`.
        use aes_gcm::KeyInit;

        let mut nonce_bytes = [0u8; AES_GCM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let body = match self.key_material.len() {
            16 => {
                let cipher = Aes128Gcm::new_from_slice(&self.key_material)
                    .map_err(|e| Error::Crypto(format!("failed to create AES-GCM cipher: {}", e)))?;
                cipher
                    .encrypt(
                        nonce,
                        Payload {
                            msg: plaintext,
                            aad: associated_data,
                        },
                    )
                    .map_err(|_| Error::Crypto("AES-GCM encryption failed".to_string()))?
            }
            32 => {
                let cipher = Aes256Gcm::new_from_slice(&self.key_material)
                    .map_err(|e| Error::Crypto(format!("failed to create AES-GCM cipher: {}", e)))?;
                cipher
                    .encrypt(
                        nonce,
                        Payload {
                            msg: plaintext,
                            aad: associated_data,
                        },
                    )
                    .map_err(|_| Error::Crypto("AES-GCM encryption failed".to_string()))?
            }
            other => {
                return Err(Error::Crypto(format!(
                    "unsupported AES-GCM key size {}",
                    other
                )))
            }
        };
        let mut out = Vec::with_capacity(AES_GCM_NONCE_SIZE + body.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn open_gcm(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        use aes_gcm::KeyInit;

        if ciphertext.len() < AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE {
            return Err(Error::MalformedCiphertext(format!(
                "AES-GCM ciphertext must be at least {} bytes, got {}",
                AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE,
                ciphertext.len()
            )));
        }
        let (nonce_bytes, body) = ciphertext.split_at(AES_GCM_NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);
        let payload = Payload {
            msg: body,
            aad: associated_data,
        };
        match self.key_material.len() {
            16 => {
                let cipher = Aes128Gcm::new_from_slice(&self.key_material)
                    .map_err(|e| Error::Crypto(format!("failed to create AES-GCM cipher: {}", e)))?;
                cipher
                    .decrypt(nonce, payload)
                    .map_err(|_| Error::AuthenticationFailure)
            }
            32 => {
                let cipher = Aes256Gcm::new_from_slice(&self.key_material)
                    .map_err(|e| Error::Crypto(format!("failed to create AES-GCM cipher: {}", e)))?;
                cipher
                    .decrypt(nonce, payload)
                    .map_err(|_| Error::AuthenticationFailure)
            }
            other => Err(Error::Crypto(format!(
                "unsupported AES-GCM key size {}",
                other
            ))),
        }
    }

    fn seal_ctr_hmac(
        &self,
        plaintext: &[u8],
        associated_data: &[u8],
        aes_key_size: usize,
        iv_size: usize,
        tag_size: usize,
        hmac_hash: HashType,
    ) -> Result<Vec<u8>> {
        let (aes_key, hmac_key) = self.key_material.split_at(aes_key_size);
        let mut iv = vec![0u8; iv_size];
        OsRng.fill_bytes(&mut iv);
        // The IV seeds the leading bytes of a zeroed counter block.
        let mut counter_block = [0u8; 16];
        counter_block[..iv_size].copy_from_slice(&iv);
        let mut body = plaintext.to_vec();
        apply_ctr(aes_key, &counter_block, &mut body)?;
        let tag = compute_tag(hmac_hash, hmac_key, associated_data, &iv, &body, tag_size)?;
        let mut out = Vec::with_capacity(iv_size + body.len() + tag_size);
        out.extend_from_slice(&iv);
        out.extend_from_slice(&body);
        out.extend_from_slice(&tag);
        Ok(out)
    }

    fn open_ctr_hmac(
        &self,
        ciphertext: &[u8],
        associated_data: &[u8],
        aes_key_size: usize,
        iv_size: usize,
        tag_size: usize,
        hmac_hash: HashType,
    ) -> Result<Vec<u8>> {
        if ciphertext.len() < iv_size + tag_size {
            return Err(Error::MalformedCiphertext(format!(
                "AES-CTR-HMAC ciphertext must be at least {} bytes, got {}",
                iv_size + tag_size,
                ciphertext.len()
            )));
        }
        let (aes_key, hmac_key) = self.key_material.split_at(aes_key_size);
        let (iv, rest) = ciphertext.split_at(iv_size);
        let (body, tag) = rest.split_at(rest.len() - tag_size);
        verify_tag(hmac_hash, hmac_key, associated_data, iv, body, tag)?;
        let mut counter_block = [0u8; 16];
        counter_block[..iv_size].copy_from_slice(iv);
        let mut plaintext = body.to_vec();
        apply_ctr(aes_key, &counter_block, &mut plaintext)?;
        Ok(plaintext)
    }
}

fn apply_ctr(key: &[u8], counter_block: &[u8; 16], buffer: &mut [u8]) -> Result<()> {
    match key.len() {
        16 => {
            let mut cipher = Ctr128BE::<Aes128>::new_from_slices(key, counter_block)
                .map_err(|e| Error::Crypto(format!("failed to create AES-CTR cipher: {}", e)))?;
            cipher.apply_keystream(buffer);
            Ok(())
        }
        32 => {
            let mut cipher = Ctr128BE::<Aes256>::new_from_slices(key, counter_block)
                .map_err(|e| Error::Crypto(format!("failed to create AES-CTR cipher: {}", e)))?;
            cipher.apply_keystream(buffer);
            Ok(())
        }
        other => Err(Error::Crypto(format!(
            "unsupported AES-CTR key size {}",
            other
        ))),
    }
}

/// Tag over `associated_data || iv || ciphertext`, truncated to `tag_size`
fn compute_tag(
    hash: HashType,
    key: &[u8],
    associated_data: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag_size: usize,
) -> Result<Vec<u8>> {
    let bad_key = |_| Error::Crypto("failed to key HMAC".to_string());
    let tag = match hash {
        HashType::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.finalize().into_bytes().to_vec()
        }
        HashType::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.finalize().into_bytes().to_vec()
        }
        HashType::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(tag[..tag_size].to_vec())
}

/// Constant-time verification of a truncated tag
fn verify_tag(
    hash: HashType,
    key: &[u8],
    associated_data: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<()> {
    let bad_key = |_| Error::Crypto("failed to key HMAC".to_string());
    match hash {
        HashType::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.verify_truncated_left(tag)
                .map_err(|_| Error::AuthenticationFailure)
        }
        HashType::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.verify_truncated_left(tag)
                .map_err(|_| Error::AuthenticationFailure)
        }
        HashType::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(bad_key)?;
            mac.update(associated_data);
            mac.update(iv);
            mac.update(ciphertext);
            mac.verify_truncated_left(tag)
                .map_err(|_| Error::AuthenticationFailure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn gcm(key_size: usize) -> AeadDem {
        let params = AeadDemParams::AesGcm { key_size };
        let key = vec![0x42u8; key_size];
        AeadDem::new(params, key).unwrap()
    }

    fn ctr_hmac() -> AeadDem {
        let params = AeadDemParams::AesCtrHmac {
            aes_key_size: 16,
            iv_size: 12,
            hmac_key_size: 20,
            tag_size: 16,
            hmac_hash: HashType::Sha256,
        };
        let key = (0..36u8).collect();
        AeadDem::new(params, key).unwrap()
    }

    #[test]
    fn test_gcm_roundtrip() {
        for key_size in [16, 32] {
            let dem = gcm(key_size);
            let ciphertext = dem.seal(b"hello", b"aad").unwrap();
            assert_eq!(
                ciphertext.len(),
                AES_GCM_NONCE_SIZE + 5 + AES_GCM_TAG_SIZE
            );
            assert_eq!(dem.open(&ciphertext, b"aad").unwrap(), b"hello");
        }
    }

    #[test]
    fn test_gcm_empty_plaintext() {
        let dem = gcm(16);
        let ciphertext = dem.seal(b"", b"").unwrap();
        assert_eq!(dem.open(&ciphertext, b"").unwrap(), b"");
    }

    #[test]
    fn test_gcm_aad_binding() {
        let dem = gcm(32);
        let ciphertext = dem.seal(b"hello", b"aad-1").unwrap();
        assert_matches!(
            dem.open(&ciphertext, b"aad-2"),
            Err(Error::AuthenticationFailure)
        );
    }

    #[test]
    fn test_gcm_truncated_input_rejected_early() {
        let dem = gcm(16);
        assert_matches!(
            dem.open(&[0u8; AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE - 1], b""),
            Err(Error::MalformedCiphertext(_))
        );
    }

    #[test]
    fn test_gcm_tamper_detected() {
        let dem = gcm(16);
        let ciphertext = dem.seal(b"hello", b"").unwrap();
        for index in 0..ciphertext.len() {
            let mut corrupted = ciphertext.clone();
            corrupted[index] ^= 0x01;
            assert_matches!(
                dem.open(&corrupted, b""),
                Err(Error::AuthenticationFailure),
                "bit flip at byte {} went undetected",
                index
            );
        }
    }

    #[test]
    fn test_ctr_hmac_roundtrip_layout() {
        let dem = ctr_hmac();
        let ciphertext = dem.seal(b"some plaintext", b"ad").unwrap();
        assert_eq!(ciphertext.len(), 12 + 14 + 16);
        assert_eq!(dem.open(&ciphertext, b"ad").unwrap(), b"some plaintext");
    }

    #[test]
    fn test_ctr_hmac_empty_plaintext() {
        let dem = ctr_hmac();
        let ciphertext = dem.seal(b"", b"").unwrap();
        assert_eq!(ciphertext.len(), 12 + 16);
        assert_eq!(dem.open(&ciphertext, b"").unwrap(), b"");
    }

    #[test]
    fn test_ctr_hmac_tamper_detected() {
        let dem = ctr_hmac();
        let ciphertext = dem.seal(b"some plaintext", b"").unwrap();
        for index in 0..ciphertext.len() {
            let mut corrupted = ciphertext.clone();
            corrupted[index] ^= 0x80;
            assert_matches!(
                dem.open(&corrupted, b""),
                Err(Error::AuthenticationFailure),
                "bit flip at byte {} went undetected",
                index
            );
        }
    }

    #[test]
    fn test_ctr_hmac_aad_binding() {
        let dem = ctr_hmac();
        let ciphertext = dem.seal(b"payload", b"left").unwrap();
        assert_matches!(
            dem.open(&ciphertext, b"right"),
            Err(Error::AuthenticationFailure)
        );
    }

    #[test]
    fn test_ctr_hmac_truncated_input_rejected_early() {
        let dem = ctr_hmac();
        assert_matches!(
            dem.open(&[0u8; 27], b""),
            Err(Error::MalformedCiphertext(_))
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let params = AeadDemParams::AesGcm { key_size: 16 };
        let dem1 = AeadDem::new(params.clone(), vec![0x01; 16]).unwrap();
        let dem2 = AeadDem::new(params, vec![0x02; 16]).unwrap();
        let ciphertext = dem1.seal(b"secret", b"").unwrap();
        assert_matches!(
            dem2.open(&ciphertext, b""),
            Err(Error::AuthenticationFailure)
        );
    }

    #[test]
    fn test_param_validation() {
        assert_matches!(
            AeadDemParams::AesGcm { key_size: 24 }.validate(),
            Err(Error::MalformedKey(_))
        );
        assert_matches!(
            AeadDemParams::AesCtrHmac {
                aes_key_size: 16,
                iv_size: 8,
                hmac_key_size: 20,
                tag_size: 16,
                hmac_hash: HashType::Sha256,
            }
            .validate(),
            Err(Error::MalformedKey(_))
        );
        assert_matches!(
            AeadDemParams::AesCtrHmac {
                aes_key_size: 16,
                iv_size: 12,
                hmac_key_size: 20,
                tag_size: 33,
                hmac_hash: HashType::Sha256,
            }
            .validate(),
            Err(Error::MalformedKey(_))
        );
    }

    #[test]
    fn test_key_material_length_checked() {
        let params = AeadDemParams::AesGcm { key_size: 16 };
        assert_matches!(
            AeadDem::new(params, vec![0u8; 15]),
            Err(Error::InvalidKey(_))
        );
    }
}
