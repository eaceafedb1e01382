use hmac::{Hmac, Mac};
use sha2::Sha256;

/// The size of a keyed hash output in bytes.
pub const HASH_BYTES: usize = 32;

/// Computes `HMAC-SHA-256(key, data)`.
///
/// HMAC accepts keys of any length, so this never fails.
///
/// ```rust
/// use macaroons_crypto::{HASH_BYTES, hmac_sha256};
///
/// let digest = hmac_sha256(b"key", b"data");
/// assert_eq!(digest.len(), HASH_BYTES);
/// ```
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; HASH_BYTES] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}
