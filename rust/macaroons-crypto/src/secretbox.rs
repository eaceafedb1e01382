//! NaCl secretbox (XSalsa20-Poly1305) sealing.
//!
//! # Sealed Layout
//!
//! ```text
//! ┌──────────────────┬──────────────────┬──────────────────────┐
//! │      Nonce       │       Tag        │      Ciphertext      │
//! │    (24 bytes)    │    (16 bytes)    │  (plaintext length)  │
//! └──────────────────┴──────────────────┴──────────────────────┘
//! ```
//!
//! This is the layout produced by `crypto_secretbox` in NaCl once the
//! leading zero padding is dropped, which is what other macaroon
//! implementations put on the wire.

use crypto_secretbox::XSalsa20Poly1305;
use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{AeadInPlace, KeyInit};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, Sealer};

/// Length of an XSalsa20 nonce.
pub const NONCE_BYTES: usize = 24;

/// Length of a Poly1305 authentication tag.
pub const TAG_BYTES: usize = 16;

/// Length of a secretbox key.
pub const KEY_BYTES: usize = 32;

/// How [`SecretBox`] chooses the nonce for each sealing operation.
///
/// `Zero` matches other macaroon libraries byte for byte: the same
/// signature and root key always seal to the same blob. `Random` draws a
/// fresh nonce from the operating system, which is stronger but yields a
/// different blob (and therefore a different macaroon signature) every
/// time. Unsealing reads the nonce from the blob, so either policy can
/// unseal what the other produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoncePolicy {
    /// All-zero nonce, compatible with other macaroon libraries.
    #[default]
    Zero,
    /// Random nonce for deployments that never interoperate on sealed bytes.
    Random,
}

impl NoncePolicy {
    fn nonce(&self) -> Result<[u8; NONCE_BYTES], CryptoError> {
        let mut nonce = [0u8; NONCE_BYTES];
        if let NoncePolicy::Random = self {
            getrandom::getrandom(&mut nonce)?;
        }
        Ok(nonce)
    }
}

/// [`Sealer`] backed by XSalsa20-Poly1305.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBox {
    #[serde(default)]
    nonce_policy: NoncePolicy,
}

impl SecretBox {
    /// Create a sealer with the given nonce policy.
    pub const fn new(nonce_policy: NoncePolicy) -> Self {
        Self { nonce_policy }
    }

    /// Create a sealer that uses a fresh random nonce per seal.
    pub const fn random_nonce() -> Self {
        Self::new(NoncePolicy::Random)
    }

    /// The nonce policy in effect.
    pub const fn nonce_policy(&self) -> NoncePolicy {
        self.nonce_policy
    }

    fn cipher(key: &[u8]) -> Result<XSalsa20Poly1305, CryptoError> {
        XSalsa20Poly1305::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            length: key.len(),
            expected: KEY_BYTES,
        })
    }
}

impl Sealer for SecretBox {
    fn seal(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::cipher(key)?;
        let nonce = self.nonce_policy.nonce()?;

        let mut ciphertext = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), &[], &mut ciphertext)
            .map_err(|_| CryptoError::SealFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_BYTES + TAG_BYTES + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(tag.as_slice());
        sealed.extend_from_slice(&ciphertext);

        Ok(sealed)
    }

    fn unseal(&self, key: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::cipher(key)?;

        if sealed.len() < NONCE_BYTES + TAG_BYTES {
            return Err(CryptoError::SealedDataTooShort {
                length: sealed.len(),
                minimum: NONCE_BYTES + TAG_BYTES,
            });
        }

        let (nonce, rest) = sealed.split_at(NONCE_BYTES);
        let (tag, ciphertext) = rest.split_at(TAG_BYTES);

        let mut plaintext = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                &[],
                &mut plaintext,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| CryptoError::AuthenticationFailed)?;

        Ok(plaintext)
    }
}
