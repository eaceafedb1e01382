//! Byte packets: opaque bytes tagged with a display encoding.

use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::ops::{Deref, Index, IndexMut};

use crate::{Encoding, MacaroonError};

/// An owned byte sequence plus the [`Encoding`] used to render it.
///
/// Identifiers, locations, caveat ids and signatures are all packets.
/// Two packets are equal when their bytes are equal, whatever their
/// encodings; the encoding only affects [`Display`].
///
/// ```rust
/// use macaroons::{Encoding, Packet};
///
/// let text = Packet::from("account = 3735928559");
/// let raw = Packet::new(b"account = 3735928559".to_vec(), Encoding::Hex);
///
/// assert_eq!(text, raw);
/// assert_eq!(text.to_string(), "account = 3735928559");
/// ```
#[derive(Clone, Default)]
pub struct Packet {
    data: Vec<u8>,
    encoding: Encoding,
}

impl Packet {
    /// Create a packet from raw bytes with an explicit display encoding.
    pub fn new(data: Vec<u8>, encoding: Encoding) -> Self {
        Self { data, encoding }
    }

    /// Create a packet by parsing `text` with `encoding`.
    ///
    /// Fails for [`Encoding::Hex`], which is display-only, and for malformed
    /// base64.
    pub fn from_str_with(text: &str, encoding: Encoding) -> Result<Self, MacaroonError> {
        Ok(Self::new(encoding.parse(text)?, encoding))
    }

    /// The raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The raw bytes, mutably.
    ///
    /// Changing the bytes of a packet that is already part of a macaroon
    /// invalidates that macaroon's signature.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The display encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The same bytes with a different display encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the packet holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the packet, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Packet {}

impl Hash for Packet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoding.render(&self.data))
    }
}

impl Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Packet")
            .field(&self.encoding.render(&self.data))
            .field(&self.encoding)
            .finish()
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Index<usize> for Packet {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Packet {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.data[index]
    }
}

impl From<&str> for Packet {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec(), Encoding::Utf8)
    }
}

impl From<String> for Packet {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes(), Encoding::Utf8)
    }
}

impl From<&String> for Packet {
    fn from(text: &String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<Vec<u8>> for Packet {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data, Encoding::Hex)
    }
}

impl From<&[u8]> for Packet {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec(), Encoding::Hex)
    }
}

impl<const N: usize> From<[u8; N]> for Packet {
    fn from(data: [u8; N]) -> Self {
        Self::new(data.to_vec(), Encoding::Hex)
    }
}

impl<const N: usize> From<&[u8; N]> for Packet {
    fn from(data: &[u8; N]) -> Self {
        Self::new(data.to_vec(), Encoding::Hex)
    }
}

impl From<&Packet> for Packet {
    fn from(packet: &Packet) -> Self {
        packet.clone()
    }
}

impl From<Packet> for Vec<u8> {
    fn from(packet: Packet) -> Self {
        packet.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn it_compares_bytes_and_ignores_encoding() {
        let utf8 = Packet::from("abc");
        let hex = Packet::new(b"abc".to_vec(), Encoding::Hex);

        assert_eq!(utf8, hex);
        assert_ne!(utf8, Packet::from("abd"));

        let mut set = HashSet::new();
        set.insert(utf8);
        assert!(set.contains(&hex));
    }

    #[test]
    fn it_displays_through_its_encoding() {
        let packet = Packet::from(&[0xde_u8, 0xad, 0xbe, 0xef]);
        assert_eq!(packet.to_string(), "DEADBEEF");
        assert_eq!(
            packet.clone().with_encoding(Encoding::Base64UrlSafe).to_string(),
            "3q2-7w"
        );
    }

    #[test]
    fn it_renders_an_empty_packet_as_empty_text() {
        assert_eq!(Packet::default().to_string(), "");
        assert!(Packet::default().is_empty());
    }

    #[test]
    fn it_copies_deeply() {
        let original = Packet::from("abc");
        let mut copy = original.clone();
        copy[0] = b'x';

        assert_eq!(original.as_slice(), b"abc");
        assert_eq!(copy.as_slice(), b"xbc");
    }

    #[test]
    fn it_parses_with_an_explicit_encoding() {
        let packet = Packet::from_str_with("3q2-7w", Encoding::Base64UrlSafe).unwrap();
        assert_eq!(packet.as_slice(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(packet.encoding(), Encoding::Base64UrlSafe);

        assert!(Packet::from_str_with("DEADBEEF", Encoding::Hex).is_err());
    }

    #[test]
    fn it_exposes_mutable_bytes() {
        let mut packet = Packet::from("abc");
        packet.as_mut_slice()[2] = b'z';
        assert_eq!(packet.to_string(), "abz");
        assert_eq!(packet[2], b'z');
    }
}
