use serde::{Deserialize, Serialize};

use crate::Encoding;

/// Controls how packets decoded from the wire are tagged for display.
///
/// The options never change the bytes that are read, so they have no effect
/// on signatures or verification.
///
/// ```rust
/// use macaroons::{Encoding, SerializationOptions};
///
/// let options: SerializationOptions =
///     serde_json::from_str(r#"{ "identifier_encoding": "base64-url-safe" }"#).unwrap();
///
/// assert_eq!(options.identifier_encoding, Encoding::Base64UrlSafe);
/// assert_eq!(options.caveat_identifier_encoding, Encoding::Utf8);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationOptions {
    /// Encoding attached to the macaroon identifier.
    pub identifier_encoding: Encoding,
    /// Encoding attached to every caveat identifier.
    pub caveat_identifier_encoding: Encoding,
}

impl SerializationOptions {
    /// Options with the given identifier encodings.
    pub fn new(identifier_encoding: Encoding, caveat_identifier_encoding: Encoding) -> Self {
        Self {
            identifier_encoding,
            caveat_identifier_encoding,
        }
    }
}
