use macaroons_crypto::CryptoError;
use thiserror::Error;

use crate::Encoding;

/// Errors raised while constructing, attenuating or decoding macaroons.
///
/// Verification never produces one of these for an invalid token: a token
/// that fails verification is reported through
/// [`VerificationResult`](crate::VerificationResult) instead.
#[derive(Error, Debug)]
pub enum MacaroonError {
    /// An identifier or location exceeds the maximum length.
    #[error("{name} data length too big (got {length} bytes, max is {max})")]
    DataTooLong {
        /// The argument that was rejected
        name: &'static str,
        /// Its length in bytes
        length: usize,
        /// The largest accepted length
        max: usize,
    },

    /// A key does not have the required length.
    #[error("{name} data length not expected size (got {length} bytes, expected {expected})")]
    InvalidLength {
        /// The argument that was rejected
        name: &'static str,
        /// Its length in bytes
        length: usize,
        /// The only accepted length
        expected: usize,
    },

    /// Appending another caveat would exceed the caveat limit.
    #[error("Number of caveats must be less than {max}")]
    TooManyCaveats {
        /// The caveat limit
        max: usize,
    },

    /// The encoding can render bytes but cannot parse strings.
    #[error("Parsing strings with the {0} encoding is not supported")]
    UnsupportedEncoding(Encoding),

    /// A wire record is too long for its four hex digit length prefix.
    #[error("Record of {length} bytes exceeds the maximum of {max}")]
    RecordTooLong {
        /// Length of the record including prefix and newline
        length: usize,
        /// The largest encodable record
        max: usize,
    },

    /// Wire bytes do not describe a well-formed macaroon.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The transport string is not valid base64.
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Reading or writing the underlying stream failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Sealing a third-party caveat key failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl MacaroonError {
    pub(crate) fn invalid_data(message: impl Into<String>) -> Self {
        MacaroonError::InvalidData(message.into())
    }
}
