//! Length-prefixed key/value records.
//!
//! # Record Layout
//!
//! ```text
//! ┌────────────────┬───────┬───────┬───────────┬──────┐
//! │  Length (hex)  │  Key  │  " "  │   Value   │ "\n" │
//! │   (4 bytes)    │       │       │           │      │
//! └────────────────┴───────┴───────┴───────────┴──────┘
//! ```
//!
//! The length is written as four lowercase hex digits and counts the whole
//! record, prefix and newline included. Values are raw bytes.
//!
//! A macaroon is the record sequence `location` (optional), `identifier`,
//! then `cid`, `vid`, `cl` for each caveat (`vid` and `cl` only for
//! third-party caveats), and finally `signature`.

use std::io::{ErrorKind, Read, Write};

use tracing::trace;

use crate::chain::{MACAROON_HASH_BYTES, MACAROON_MAX_CAVEATS};
use crate::macaroon::check_length;
use crate::{Caveat, Encoding, Macaroon, MacaroonError, Packet, SerializationOptions};

const PREFIX_BYTES: usize = 4;

/// The largest length the prefix can express.
pub const MAX_RECORD_BYTES: usize = 0xffff;

/// Smallest record the reader accepts: a prefix, a one-byte key, the
/// separator and the newline.
const MIN_RECORD_BYTES: usize = PREFIX_BYTES + 3;

const LOCATION: &str = "location";
const IDENTIFIER: &str = "identifier";
const CID: &str = "cid";
const VID: &str = "vid";
const CL: &str = "cl";
const SIGNATURE: &str = "signature";

/// A single decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Field name
    pub key: String,
    /// Raw field value
    pub value: Vec<u8>,
}

/// Writes records to an underlying [`Write`].
#[derive(Debug)]
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one record.
    pub fn write_record(&mut self, key: &str, value: &[u8]) -> Result<(), MacaroonError> {
        let length = PREFIX_BYTES + key.len() + 1 + value.len() + 1;
        if length > MAX_RECORD_BYTES {
            return Err(MacaroonError::RecordTooLong {
                length,
                max: MAX_RECORD_BYTES,
            });
        }

        write!(self.inner, "{length:04x}")?;
        self.inner.write_all(key.as_bytes())?;
        self.inner.write_all(b" ")?;
        self.inner.write_all(value)?;
        self.inner.write_all(b"\n")?;

        Ok(())
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads records from an underlying [`Read`].
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next record, or `None` at a clean end of input.
    pub fn read_record(&mut self) -> Result<Option<Record>, MacaroonError> {
        let mut prefix = [0u8; PREFIX_BYTES];
        let filled = self.fill(&mut prefix)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < PREFIX_BYTES {
            return Err(MacaroonError::invalid_data("truncated record length"));
        }

        let length = parse_length(&prefix)?;
        if length < MIN_RECORD_BYTES {
            return Err(MacaroonError::invalid_data(format!(
                "record length {length} is below the minimum of {MIN_RECORD_BYTES}"
            )));
        }

        let mut body = vec![0u8; length - PREFIX_BYTES];
        self.inner.read_exact(&mut body).map_err(|error| {
            if error.kind() == ErrorKind::UnexpectedEof {
                MacaroonError::invalid_data(format!("truncated record, expected {length} bytes"))
            } else {
                MacaroonError::Io(error)
            }
        })?;

        if body.pop() != Some(b'\n') {
            return Err(MacaroonError::invalid_data("record is not newline terminated"));
        }

        let separator = body
            .iter()
            .position(|byte| *byte == b' ')
            .ok_or_else(|| MacaroonError::invalid_data("record has no key/value separator"))?;

        let value = body.split_off(separator + 1);
        body.truncate(separator);
        let key = String::from_utf8(body)
            .map_err(|_| MacaroonError::invalid_data("record key is not UTF-8"))?;

        Ok(Some(Record { key, value }))
    }

    /// Read the next record, failing at end of input.
    pub fn expect_record(&mut self) -> Result<Record, MacaroonError> {
        self.read_record()?
            .ok_or_else(|| MacaroonError::invalid_data("unexpected end of data"))
    }

    fn fill(&mut self, buffer: &mut [u8]) -> Result<usize, MacaroonError> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.inner.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(error) if error.kind() == ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(filled)
    }
}

fn parse_length(prefix: &[u8; PREFIX_BYTES]) -> Result<usize, MacaroonError> {
    prefix.iter().try_fold(0usize, |length, byte| {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            _ => {
                return Err(MacaroonError::invalid_data(format!(
                    "record length prefix {:?} is not lowercase hexadecimal",
                    String::from_utf8_lossy(prefix)
                )));
            }
        };
        Ok(length * 16 + digit as usize)
    })
}

pub(crate) fn write_macaroon<W: Write>(
    macaroon: &Macaroon,
    writer: &mut RecordWriter<W>,
) -> Result<(), MacaroonError> {
    if let Some(location) = macaroon.location() {
        writer.write_record(LOCATION, location)?;
    }
    writer.write_record(IDENTIFIER, macaroon.identifier())?;

    for caveat in macaroon.caveats() {
        writer.write_record(CID, caveat.cid())?;
        if let Caveat::ThirdParty { vid, cl, .. } = caveat {
            writer.write_record(VID, vid)?;
            writer.write_record(CL, cl)?;
        }
    }

    writer.write_record(SIGNATURE, macaroon.signature())
}

/// A caveat id whose `vid` (and, for third-party caveats, `cl`) records may
/// still follow.
struct PendingCaveat {
    cid: Packet,
    vid: Option<Packet>,
}

impl PendingCaveat {
    fn finish(self) -> Result<Caveat, MacaroonError> {
        match self.vid {
            None => Ok(Caveat::FirstParty { cid: self.cid }),
            Some(_) => Err(MacaroonError::invalid_data(format!(
                "caveat '{}' has a vid without a cl",
                self.cid
            ))),
        }
    }
}

pub(crate) fn read_macaroon<R: Read>(
    reader: &mut RecordReader<R>,
    options: &SerializationOptions,
) -> Result<Macaroon, MacaroonError> {
    let mut record = reader.expect_record()?;

    let location = if record.key == LOCATION {
        let location = Packet::new(record.value, Encoding::Utf8);
        check_length("location", &location)?;
        record = reader.expect_record()?;
        Some(location)
    } else {
        None
    };

    if record.key != IDENTIFIER {
        return Err(unexpected(&record.key, IDENTIFIER));
    }
    let identifier = Packet::new(record.value, options.identifier_encoding);
    check_length("identifier", &identifier)?;

    let mut caveats = Vec::new();
    let mut pending: Option<PendingCaveat> = None;

    let signature = loop {
        let record = reader
            .read_record()?
            .ok_or_else(|| MacaroonError::invalid_data("missing signature"))?;

        match record.key.as_str() {
            CID => {
                if let Some(caveat) = pending.take() {
                    push_caveat(&mut caveats, caveat.finish()?)?;
                }
                let cid = Packet::new(record.value, options.caveat_identifier_encoding);
                check_length("cid", &cid)?;
                pending = Some(PendingCaveat { cid, vid: None });
            }
            VID => match pending.as_mut() {
                Some(caveat) if caveat.vid.is_none() => {
                    caveat.vid = Some(Packet::new(record.value, Encoding::Base64UrlSafe));
                }
                _ => return Err(MacaroonError::invalid_data("vid without a preceding cid")),
            },
            CL => match pending.take() {
                Some(PendingCaveat {
                    cid,
                    vid: Some(vid),
                }) => {
                    let cl = Packet::new(record.value, Encoding::Utf8);
                    check_length("cl", &cl)?;
                    push_caveat(&mut caveats, Caveat::ThirdParty { cid, vid, cl })?;
                }
                _ => return Err(MacaroonError::invalid_data("cl without a preceding vid")),
            },
            SIGNATURE => {
                if let Some(caveat) = pending.take() {
                    push_caveat(&mut caveats, caveat.finish()?)?;
                }
                break record.value;
            }
            other => return Err(unexpected(other, SIGNATURE)),
        }
    };

    if signature.len() != MACAROON_HASH_BYTES {
        return Err(MacaroonError::invalid_data(format!(
            "signature is {} bytes, expected {MACAROON_HASH_BYTES}",
            signature.len()
        )));
    }

    trace!(caveats = caveats.len(), "Decoded macaroon {identifier}");

    Ok(Macaroon::from_parts(
        location,
        identifier,
        caveats,
        Packet::new(signature, Encoding::Hex),
    ))
}

fn push_caveat(caveats: &mut Vec<Caveat>, caveat: Caveat) -> Result<(), MacaroonError> {
    if caveats.len() + 1 >= MACAROON_MAX_CAVEATS {
        return Err(MacaroonError::invalid_data(format!(
            "too many caveats, the limit is {MACAROON_MAX_CAVEATS}"
        )));
    }
    caveats.push(caveat);
    Ok(())
}

fn unexpected(key: &str, expected: &str) -> MacaroonError {
    MacaroonError::invalid_data(format!("unexpected field '{key}', expected '{expected}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MACAROON_MAX_STRLEN;
    use anyhow::Result;

    const SIGNATURE_TEXT: &str = "0123456789abcdef0123456789abcdef";

    fn encode(records: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut writer = RecordWriter::new(Vec::new());
        for (key, value) in records {
            writer.write_record(key, value.as_bytes())?;
        }
        Ok(writer.into_inner())
    }

    fn decode(bytes: &[u8]) -> Result<Macaroon, MacaroonError> {
        read_macaroon(&mut RecordReader::new(bytes), &SerializationOptions::default())
    }

    #[test]
    fn it_writes_the_total_length_as_lowercase_hex() -> Result<()> {
        let bytes = encode(&[("location", "http://mybank/")])?;
        assert_eq!(bytes, b"001clocation http://mybank/\n");
        Ok(())
    }

    #[test]
    fn it_reads_records_until_the_end() -> Result<()> {
        let bytes = encode(&[("cid", "a b"), ("cl", "")])?;
        let mut reader = RecordReader::new(bytes.as_slice());

        assert_eq!(
            reader.read_record()?,
            Some(Record {
                key: "cid".into(),
                value: b"a b".to_vec()
            })
        );
        assert_eq!(
            reader.read_record()?,
            Some(Record {
                key: "cl".into(),
                value: Vec::new()
            })
        );
        assert_eq!(reader.read_record()?, None);

        Ok(())
    }

    #[test]
    fn it_refuses_records_that_do_not_fit_the_prefix() {
        let mut writer = RecordWriter::new(Vec::new());
        let value = vec![b'x'; MAX_RECORD_BYTES];

        assert!(matches!(
            writer.write_record("cid", &value),
            Err(MacaroonError::RecordTooLong { .. })
        ));
    }

    #[test]
    fn it_rejects_malformed_records() {
        let cases = [
            "zz10identifier x\n",
            "+00fidentifier\n",
            "0003",
            "0010identifier",
            "000aabcdef\n",
            "0008cid xx",
            "00",
            "001Clocation http://mybank/\n",
        ];

        for text in cases {
            let mut reader = RecordReader::new(text.as_bytes());
            assert!(
                matches!(reader.read_record(), Err(MacaroonError::InvalidData(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn it_decodes_first_and_third_party_caveats() -> Result<()> {
        let bytes = encode(&[
            ("identifier", "id"),
            ("cid", "account = 1"),
            ("cid", "user = alice"),
            ("vid", "sealed"),
            ("cl", "http://auth/"),
            ("signature", SIGNATURE_TEXT),
        ])?;

        let macaroon = decode(&bytes)?;

        assert!(macaroon.location().is_none());
        assert_eq!(macaroon.caveats().len(), 2);
        assert!(macaroon.caveats()[0].is_first_party());
        assert!(macaroon.caveats()[1].is_third_party());
        assert_eq!(macaroon.signature().as_slice(), SIGNATURE_TEXT.as_bytes());
        assert_eq!(macaroon.signature().encoding(), Encoding::Hex);
        assert_eq!(
            macaroon.caveats()[1].vid().map(Packet::encoding),
            Some(Encoding::Base64UrlSafe)
        );

        Ok(())
    }

    #[test]
    fn it_tags_identifiers_with_the_configured_encodings() -> Result<()> {
        let bytes = encode(&[
            ("identifier", "id"),
            ("cid", "c"),
            ("signature", SIGNATURE_TEXT),
        ])?;
        let options = SerializationOptions::new(Encoding::Base64UrlSafe, Encoding::Ascii);

        let macaroon = read_macaroon(&mut RecordReader::new(bytes.as_slice()), &options)?;

        assert_eq!(macaroon.identifier().encoding(), Encoding::Base64UrlSafe);
        assert_eq!(macaroon.caveats()[0].cid().encoding(), Encoding::Ascii);

        Ok(())
    }

    #[test]
    fn it_rejects_inconsistent_caveat_records() -> Result<()> {
        let cases: [&[(&str, &str)]; 9] = [
            &[("identifier", "id"), ("cid", "c"), ("vid", "v"), ("signature", SIGNATURE_TEXT)],
            &[("identifier", "id"), ("cid", "c"), ("cl", "l"), ("signature", SIGNATURE_TEXT)],
            &[("identifier", "id"), ("vid", "v"), ("cl", "l"), ("signature", SIGNATURE_TEXT)],
            &[("identifier", "id"), ("cid", "c"), ("vid", "v"), ("vid", "v")],
            &[("identifier", "id"), ("cid", "c"), ("color", "red")],
            &[("identifier", "id"), ("cid", "c")],
            &[("identifier", "id"), ("signature", "short")],
            &[("location", "l"), ("cid", "c")],
            &[],
        ];

        for records in cases {
            let bytes = encode(records)?;
            assert!(
                matches!(decode(&bytes), Err(MacaroonError::InvalidData(_))),
                "{records:?} should be rejected"
            );
        }

        Ok(())
    }

    #[test]
    fn it_ignores_data_after_the_signature() -> Result<()> {
        let mut bytes = encode(&[("identifier", "id"), ("signature", SIGNATURE_TEXT)])?;
        bytes.extend_from_slice(b"garbage");

        assert_eq!(decode(&bytes)?.identifier().to_string(), "id");

        Ok(())
    }

    fn caveat_stream(count: usize) -> Result<Vec<u8>> {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_record("identifier", b"id")?;
        for _ in 0..count {
            writer.write_record("cid", b"c")?;
        }
        writer.write_record("signature", SIGNATURE_TEXT.as_bytes())?;
        Ok(writer.into_inner())
    }

    #[test]
    fn it_caps_the_number_of_decoded_caveats() -> Result<()> {
        let macaroon = decode(&caveat_stream(MACAROON_MAX_CAVEATS - 1)?)?;
        assert_eq!(macaroon.caveats().len(), 65535);

        assert!(matches!(
            decode(&caveat_stream(MACAROON_MAX_CAVEATS)?),
            Err(MacaroonError::InvalidData(_))
        ));

        Ok(())
    }

    #[test]
    fn it_applies_the_construction_limits_to_decoded_values() -> Result<()> {
        let owned = "x".repeat(MACAROON_MAX_STRLEN + 1);
        let oversized: &str = &owned;
        let cases: [&[(&str, &str)]; 4] = [
            &[("location", oversized), ("identifier", "id"), ("signature", SIGNATURE_TEXT)],
            &[("identifier", oversized), ("signature", SIGNATURE_TEXT)],
            &[("identifier", "id"), ("cid", oversized), ("signature", SIGNATURE_TEXT)],
            &[
                ("identifier", "id"),
                ("cid", "c"),
                ("vid", "v"),
                ("cl", oversized),
                ("signature", SIGNATURE_TEXT),
            ],
        ];

        for records in cases {
            assert!(
                matches!(
                    decode(&encode(records)?),
                    Err(MacaroonError::DataTooLong { length: 32769, .. })
                ),
                "oversized value should be rejected"
            );
        }

        let at_limit = "x".repeat(MACAROON_MAX_STRLEN);
        let records = [("identifier", at_limit.as_str()), ("signature", SIGNATURE_TEXT)];
        let macaroon = decode(&encode(&records)?)?;
        assert_eq!(macaroon.identifier().len(), MACAROON_MAX_STRLEN);

        Ok(())
    }
}
