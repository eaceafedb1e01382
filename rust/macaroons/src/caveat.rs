use std::fmt::{self, Display};

use crate::Packet;

/// A restriction attached to a macaroon.
///
/// A first-party caveat is a predicate the target service checks itself. A
/// third-party caveat names another service (`cl`) that must issue a
/// discharge macaroon for `cid`; `vid` carries the discharge root key sealed
/// under the signature the macaroon had when the caveat was added.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Caveat {
    /// Predicate checked by the target service.
    FirstParty {
        /// The predicate
        cid: Packet,
    },
    /// Condition discharged by another service.
    ThirdParty {
        /// Identifier the third party uses to recover the predicate and key
        cid: Packet,
        /// Sealed discharge root key
        vid: Packet,
        /// Location hint for the third party
        cl: Packet,
    },
}

impl Caveat {
    /// The caveat identifier.
    pub fn cid(&self) -> &Packet {
        match self {
            Caveat::FirstParty { cid } | Caveat::ThirdParty { cid, .. } => cid,
        }
    }

    /// The sealed verification key, present only on third-party caveats.
    pub fn vid(&self) -> Option<&Packet> {
        match self {
            Caveat::FirstParty { .. } => None,
            Caveat::ThirdParty { vid, .. } => Some(vid),
        }
    }

    /// The location hint, present only on third-party caveats.
    pub fn cl(&self) -> Option<&Packet> {
        match self {
            Caveat::FirstParty { .. } => None,
            Caveat::ThirdParty { cl, .. } => Some(cl),
        }
    }

    /// Whether this caveat is checked by the target service.
    pub fn is_first_party(&self) -> bool {
        matches!(self, Caveat::FirstParty { .. })
    }

    /// Whether this caveat requires a discharge macaroon.
    pub fn is_third_party(&self) -> bool {
        matches!(self, Caveat::ThirdParty { .. })
    }

    /// Multi-line human readable dump, one `\n`-terminated line per field.
    pub fn inspect(&self) -> String {
        let mut out = format!("CId = {}\n", self.cid());
        if let Caveat::ThirdParty { vid, cl, .. } = self {
            out.push_str(&format!("  VId = {vid}\n"));
            out.push_str(&format!("  Cl = {cl}\n"));
        }
        out
    }
}

impl Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.cid(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoding;

    #[test]
    fn it_distinguishes_first_and_third_party() {
        let first = Caveat::FirstParty {
            cid: Packet::from("account = 1"),
        };
        let third = Caveat::ThirdParty {
            cid: Packet::from("user = alice"),
            vid: Packet::new(vec![0xfb, 0xff], Encoding::Base64UrlSafe),
            cl: Packet::from("http://auth/"),
        };

        assert!(first.is_first_party());
        assert!(first.vid().is_none() && first.cl().is_none());
        assert!(third.is_third_party());
        assert_eq!(third.cl().map(|cl| cl.to_string()).as_deref(), Some("http://auth/"));
    }

    #[test]
    fn it_inspects_third_party_fields() {
        let third = Caveat::ThirdParty {
            cid: Packet::from("user = alice"),
            vid: Packet::new(vec![0xfb, 0xff], Encoding::Base64UrlSafe),
            cl: Packet::from("http://auth/"),
        };

        assert_eq!(third.to_string(), "user = alice");
        assert_eq!(
            third.inspect(),
            "CId = user = alice\n  VId = -_8\n  Cl = http://auth/\n"
        );
    }
}
