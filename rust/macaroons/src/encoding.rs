//! Display encodings for packet bytes.

use std::fmt::{self, Display};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::MacaroonError;

/// How the bytes of a [`Packet`](crate::Packet) are rendered as text.
///
/// The encoding is display metadata only. It never takes part in equality,
/// hashing or signature computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// UTF-8 text; invalid sequences render as U+FFFD.
    #[default]
    Utf8,
    /// 7-bit ASCII text; other bytes render as `?`.
    Ascii,
    /// Uppercase hexadecimal. Write-only: strings cannot be parsed as hex.
    Hex,
    /// URL-safe base64 without padding.
    Base64UrlSafe,
}

impl Encoding {
    /// Render `bytes` as text.
    pub fn render(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Ascii => bytes
                .iter()
                .map(|byte| if byte.is_ascii() { *byte as char } else { '?' })
                .collect(),
            Encoding::Hex => hex::encode_upper(bytes),
            Encoding::Base64UrlSafe => URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Produce the bytes that `text` represents in this encoding.
    ///
    /// # Errors
    ///
    /// [`MacaroonError::UnsupportedEncoding`] for [`Encoding::Hex`], and
    /// [`MacaroonError::Base64`] when base64 text is malformed.
    pub fn parse(&self, text: &str) -> Result<Vec<u8>, MacaroonError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => Ok(text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect()),
            Encoding::Hex => Err(MacaroonError::UnsupportedEncoding(*self)),
            Encoding::Base64UrlSafe => Ok(decode_base64(text)?),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Ascii => "ASCII",
            Encoding::Hex => "hex",
            Encoding::Base64UrlSafe => "URL-safe base64",
        };
        f.write_str(name)
    }
}

/// Decode base64 written with either the URL-safe or the standard alphabet,
/// with or without padding.
pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = text
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD.decode(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_renders_each_encoding() {
        let bytes = [0xfb, 0xff, 0x41];

        assert_eq!(Encoding::Hex.render(&bytes), "FBFF41");
        assert_eq!(Encoding::Base64UrlSafe.render(&bytes), "-_9B");
        assert_eq!(Encoding::Ascii.render(&bytes), "??A");
        assert_eq!(Encoding::Utf8.render(b"caf\xc3\xa9"), "café");
    }

    #[test]
    fn it_refuses_to_parse_hex() {
        assert!(matches!(
            Encoding::Hex.parse("00ff"),
            Err(MacaroonError::UnsupportedEncoding(Encoding::Hex))
        ));
    }

    #[test]
    fn it_parses_text_encodings() {
        assert_eq!(Encoding::Utf8.parse("café").unwrap(), b"caf\xc3\xa9");
        assert_eq!(Encoding::Ascii.parse("café").unwrap(), b"caf?");
    }

    #[test]
    fn it_decodes_either_base64_alphabet() {
        assert_eq!(decode_base64("-_9B").unwrap(), vec![0xfb, 0xff, 0x41]);
        assert_eq!(decode_base64("+/9B").unwrap(), vec![0xfb, 0xff, 0x41]);
        assert_eq!(decode_base64("Cg==").unwrap(), b"\n");
        assert_eq!(decode_base64("Cg").unwrap(), b"\n");
    }

    #[test]
    fn it_serializes_as_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Encoding::Base64UrlSafe).unwrap(),
            "\"base64-url-safe\""
        );
        assert_eq!(
            serde_json::from_str::<Encoding>("\"utf8\"").unwrap(),
            Encoding::Utf8
        );
    }
}
