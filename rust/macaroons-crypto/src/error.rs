use thiserror::Error;

/// Errors produced while sealing or unsealing third-party caveat keys.
///
/// An [`CryptoError::AuthenticationFailed`] during verification is an
/// expected outcome (a tampered or mis-bound caveat), so callers usually
/// turn it into a diagnostic rather than propagating it.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The sealing key does not have the length the cipher requires.
    #[error("Sealing key must be {expected} bytes, got {length}")]
    InvalidKeyLength {
        /// Length of the key that was supplied
        length: usize,
        /// Length the cipher requires
        expected: usize,
    },

    /// The sealed blob is too short to contain a nonce and a tag.
    #[error("Sealed data of {length} bytes is shorter than the {minimum} byte minimum")]
    SealedDataTooShort {
        /// Length of the sealed blob
        length: usize,
        /// Smallest length a valid blob can have
        minimum: usize,
    },

    /// The cipher refused to encrypt the plaintext.
    #[error("Could not seal data")]
    SealFailed,

    /// The authentication tag did not match; the key is wrong or the data
    /// was modified.
    #[error("Could not decrypt sealed data: authentication failed")]
    AuthenticationFailed,

    /// The operating system could not supply a random nonce.
    #[error("Failed to generate a random nonce: {0}")]
    Rng(getrandom::Error),
}

impl From<getrandom::Error> for CryptoError {
    fn from(value: getrandom::Error) -> Self {
        CryptoError::Rng(value)
    }
}
