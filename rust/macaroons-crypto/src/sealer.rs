use crate::CryptoError;

/// Authenticated encryption used to embed a delegated root key in a
/// third-party caveat.
///
/// The key is always the macaroon's running signature at the point where
/// the caveat is added. Implementations must make the sealed blob
/// self-describing: anything needed to unseal it besides the key (a nonce,
/// for example) travels inside the blob.
pub trait Sealer: Send + Sync {
    /// Encrypts `plaintext` under `key`.
    fn seal(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Reverses [`Sealer::seal`]. Fails with
    /// [`CryptoError::AuthenticationFailed`] when the key is wrong or the blob
    /// was modified.
    fn unseal(&self, key: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError>;
}
