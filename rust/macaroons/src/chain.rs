//! The keyed-hash chain that produces macaroon signatures.
//!
//! ```text
//! derived   = HMAC(pad32("macaroons-key-generator"), root key)
//! sig₀      = HMAC(derived, identifier)
//! sigᵢ      = HMAC(sigᵢ₋₁, cid)                   first-party caveat
//! sigᵢ      = HASH2(sigᵢ₋₁, vid, cid)             third-party caveat
//! HASH2     = HMAC(k, HMAC(k, a) ‖ HMAC(k, b))
//! bound     = HASH2(zeros32, primary, discharge)
//! ```

use macaroons_crypto::{HASH_BYTES, hmac_sha256};

/// Size of a signature and of a derived key.
pub const MACAROON_HASH_BYTES: usize = HASH_BYTES;

/// Largest accepted location or identifier, in bytes.
pub const MACAROON_MAX_STRLEN: usize = 32768;

/// Caveat count limit: a macaroon holds fewer caveats than this.
pub const MACAROON_MAX_CAVEATS: usize = 65536;

/// Recommended length for root keys.
pub const MACAROON_SUGGESTED_SECRET_LENGTH: usize = 32;

const KEY_GENERATOR: &[u8] = b"macaroons-key-generator";

/// Derive the 32-byte construction key from an arbitrary root key.
pub fn derive_key(key: &[u8]) -> [u8; MACAROON_HASH_BYTES] {
    let mut generator = [0u8; MACAROON_HASH_BYTES];
    generator[..KEY_GENERATOR.len()].copy_from_slice(KEY_GENERATOR);
    hmac_sha256(&generator, key)
}

pub(crate) fn hash(key: &[u8], data: &[u8]) -> [u8; MACAROON_HASH_BYTES] {
    hmac_sha256(key, data)
}

pub(crate) fn hash2(key: &[u8], first: &[u8], second: &[u8]) -> [u8; MACAROON_HASH_BYTES] {
    let mut joined = [0u8; MACAROON_HASH_BYTES * 2];
    joined[..MACAROON_HASH_BYTES].copy_from_slice(&hash(key, first));
    joined[MACAROON_HASH_BYTES..].copy_from_slice(&hash(key, second));
    hash(key, &joined)
}

/// Binds a discharge signature to the signature of the primary macaroon it
/// is presented with.
pub(crate) fn bind(primary: &[u8], discharge: &[u8]) -> [u8; MACAROON_HASH_BYTES] {
    hash2(&[0u8; MACAROON_HASH_BYTES], primary, discharge)
}
