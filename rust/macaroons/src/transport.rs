//! The base64 envelope macaroons travel in.
//!
//! Tokens are written as URL-safe base64 without padding. Reading also
//! accepts the standard alphabet and padded input, which older issuers
//! produce.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::encoding::decode_base64;
use crate::wire::{RecordReader, RecordWriter, read_macaroon, write_macaroon};
use crate::{Macaroon, MacaroonError, SerializationOptions};

impl Macaroon {
    /// Encode as a URL-safe base64 token.
    pub fn serialize(&self) -> Result<String, MacaroonError> {
        Ok(URL_SAFE_NO_PAD.encode(self.serialize_to_bytes()?))
    }

    /// Encode as wire records.
    pub fn serialize_to_bytes(&self) -> Result<Vec<u8>, MacaroonError> {
        let mut bytes = Vec::new();
        self.serialize_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Write wire records to `writer`.
    pub fn serialize_to<W: Write>(&self, writer: W) -> Result<(), MacaroonError> {
        write_macaroon(self, &mut RecordWriter::new(writer))
    }

    /// Decode a base64 token with default [`SerializationOptions`].
    pub fn deserialize(token: &str) -> Result<Macaroon, MacaroonError> {
        Self::deserialize_with(token, &SerializationOptions::default())
    }

    /// Decode a base64 token.
    pub fn deserialize_with(
        token: &str,
        options: &SerializationOptions,
    ) -> Result<Macaroon, MacaroonError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(MacaroonError::invalid_data("empty token"));
        }

        let bytes = decode_base64(token).inspect_err(|error| {
            debug!("Rejected macaroon token: {error}");
        })?;
        Self::deserialize_from_bytes(&bytes, options)
    }

    /// Decode wire records.
    pub fn deserialize_from_bytes(
        bytes: &[u8],
        options: &SerializationOptions,
    ) -> Result<Macaroon, MacaroonError> {
        Self::deserialize_from(bytes, options)
    }

    /// Read wire records from `reader`.
    ///
    /// Reading stops after the signature record; anything after it is left
    /// unread.
    pub fn deserialize_from<R: Read>(
        reader: R,
        options: &SerializationOptions,
    ) -> Result<Macaroon, MacaroonError> {
        read_macaroon(&mut RecordReader::new(reader), options).inspect_err(|error| {
            debug!("Rejected macaroon records: {error}");
        })
    }
}

impl Serialize for Macaroon {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self
            .serialize_to_bytes()
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl<'de> Deserialize<'de> for Macaroon {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Macaroon::deserialize_with(&token, &SerializationOptions::default())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn it_writes_url_safe_base64_without_padding() -> Result<()> {
        let macaroon = Macaroon::new(
            "http://mybank/",
            b"this is our super secret key; only we should know it",
            "we used our secret key",
        )?;

        let token = macaroon.serialize()?;

        assert_eq!(
            token,
            "MDAxY2xvY2F0aW9uIGh0dHA6Ly9teWJhbmsvCjAwMjZpZGVudGlmaWVyIHdlIHVzZWQgb3VyIHNlY3JldCBrZXkKMDAyZnNpZ25hdHVyZSDj2eApCFJsTAA5rhURQRXZf91ovyujebNCqvD2F9BVLwo"
        );
        assert!(!token.contains('='));

        Ok(())
    }

    #[test]
    fn it_rejects_empty_and_malformed_tokens() {
        assert!(matches!(
            Macaroon::deserialize(""),
            Err(MacaroonError::InvalidData(_))
        ));
        assert!(matches!(
            Macaroon::deserialize("not base64!"),
            Err(MacaroonError::Base64(_))
        ));
    }

    #[test]
    fn it_round_trips_through_serde() -> Result<()> {
        let mut macaroon = Macaroon::new_without_location(b"key", "id")?;
        macaroon.add_first_party_caveat("account = 1")?;

        let json = serde_json::to_string(&macaroon)?;
        let decoded: Macaroon = serde_json::from_str(&json)?;

        assert_eq!(json, format!("\"{}\"", macaroon.serialize()?));
        assert_eq!(decoded, macaroon);

        Ok(())
    }
}
