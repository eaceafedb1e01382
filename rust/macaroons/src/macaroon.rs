use std::fmt::{self, Display};

use macaroons_crypto::{Sealer, SecretBox};

use crate::chain::{self, MACAROON_HASH_BYTES, MACAROON_MAX_CAVEATS, MACAROON_MAX_STRLEN};
use crate::verify::verify_tree;
use crate::{Caveat, Encoding, MacaroonError, Packet, VerificationResult, Verifier};

/// A bearer token with an HMAC-chained signature over its caveats.
///
/// The signature always reflects the root key, the identifier and every
/// caveat in order. Caveats can only be appended, and each append replaces
/// the signature, so a holder can restrict a macaroon but never widen it.
/// Clone a macaroon to derive several differently-restricted tokens from a
/// common prefix.
///
/// ```rust
/// use macaroons::{Macaroon, Verifier};
///
/// let key = b"this is our super secret key; only we should know it";
/// let mut macaroon = Macaroon::new("http://mybank/", key, "we used our secret key")?;
/// macaroon.add_first_party_caveat("account = 3735928559")?;
///
/// let mut verifier = Verifier::new();
/// verifier.satisfy_exact("account = 3735928559");
///
/// assert!(macaroon.verify(&verifier, key, &[]).is_success());
/// # Ok::<(), macaroons::MacaroonError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: Option<Packet>,
    identifier: Packet,
    signature: Packet,
    caveats: Vec<Caveat>,
}

impl Macaroon {
    /// Mint a macaroon from a root key of any length.
    pub fn new(
        location: impl Into<Packet>,
        key: &[u8],
        identifier: impl Into<Packet>,
    ) -> Result<Self, MacaroonError> {
        Self::new_with_derived_key(
            Some(location.into()),
            &chain::derive_key(key),
            identifier.into(),
        )
    }

    /// Mint a macaroon that carries no location hint.
    pub fn new_without_location(
        key: &[u8],
        identifier: impl Into<Packet>,
    ) -> Result<Self, MacaroonError> {
        Self::new_with_derived_key(None, &chain::derive_key(key), identifier.into())
    }

    /// Mint a macaroon from an already-derived 32-byte key.
    pub fn new_with_derived_key(
        location: Option<Packet>,
        derived_key: &[u8],
        identifier: Packet,
    ) -> Result<Self, MacaroonError> {
        if let Some(location) = &location {
            check_length("location", location)?;
        }
        check_length("identifier", &identifier)?;
        check_key(derived_key)?;

        let signature = chain::hash(derived_key, &identifier);

        Ok(Self {
            location,
            identifier,
            signature: signature_packet(signature),
            caveats: Vec::new(),
        })
    }

    pub(crate) fn from_parts(
        location: Option<Packet>,
        identifier: Packet,
        caveats: Vec<Caveat>,
        signature: Packet,
    ) -> Self {
        Self {
            location,
            identifier,
            signature,
            caveats,
        }
    }

    /// Location hint, if any.
    pub fn location(&self) -> Option<&Packet> {
        self.location.as_ref()
    }

    /// Identifier the issuer uses to recover the root key.
    pub fn identifier(&self) -> &Packet {
        &self.identifier
    }

    /// Current signature.
    pub fn signature(&self) -> &Packet {
        &self.signature
    }

    /// All caveats in the order they were added.
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Caveats that require a discharge macaroon.
    pub fn third_party_caveats(&self) -> impl Iterator<Item = &Caveat> {
        self.caveats.iter().filter(|caveat| caveat.is_third_party())
    }

    /// Restrict the macaroon with a predicate checked by the target service.
    pub fn add_first_party_caveat(
        &mut self,
        predicate: impl Into<Packet>,
    ) -> Result<&mut Self, MacaroonError> {
        let cid = predicate.into();

        check_length("predicate", &cid)?;
        self.check_capacity()?;

        let signature = chain::hash(&self.signature, &cid);

        self.caveats.push(Caveat::FirstParty { cid });
        self.signature = signature_packet(signature);

        Ok(self)
    }

    /// Restrict the macaroon with a condition that a third party must
    /// discharge.
    ///
    /// `key` becomes the root key of the discharge macaroon. It is sealed
    /// into the caveat with `sealer`, and the third party must learn it
    /// (together with the predicate) from `identifier`.
    pub fn add_third_party_caveat(
        &mut self,
        sealer: &dyn Sealer,
        location: impl Into<Packet>,
        key: &[u8],
        identifier: impl Into<Packet>,
    ) -> Result<&mut Self, MacaroonError> {
        self.add_third_party_caveat_with_derived_key(
            sealer,
            location,
            &chain::derive_key(key),
            identifier,
        )
    }

    /// Like [`Macaroon::add_third_party_caveat`], with an already-derived
    /// 32-byte key.
    pub fn add_third_party_caveat_with_derived_key(
        &mut self,
        sealer: &dyn Sealer,
        location: impl Into<Packet>,
        derived_key: &[u8],
        identifier: impl Into<Packet>,
    ) -> Result<&mut Self, MacaroonError> {
        let cl = location.into();
        let cid = identifier.into();

        check_length("location", &cl)?;
        check_length("identifier", &cid)?;
        check_key(derived_key)?;
        self.check_capacity()?;

        let vid = Packet::new(
            sealer.seal(&self.signature, derived_key)?,
            Encoding::Base64UrlSafe,
        );
        let signature = chain::hash2(&self.signature, &vid, &cid);

        self.caveats.push(Caveat::ThirdParty { cid, vid, cl });
        self.signature = signature_packet(signature);

        Ok(self)
    }

    /// Bind `discharge` to this macaroon so that it can only be used
    /// alongside it.
    ///
    /// Returns a copy of `discharge` with a bound signature; `discharge` is
    /// left untouched.
    pub fn prepare_for_request(&self, discharge: &Macaroon) -> Macaroon {
        let mut bound = discharge.clone();
        bound.signature = signature_packet(chain::bind(&self.signature, &discharge.signature));
        bound
    }

    /// Verify this macaroon and its bound discharges under root `key`.
    ///
    /// Third-party caveat keys are unsealed with [`SecretBox`], which reads
    /// the nonce from the sealed data and so accepts any nonce policy.
    ///
    /// Only the discharges on the current path are tracked for cycles, so a
    /// discharge referenced from several branches is verified once per
    /// reference. Discharge graphs where every level carries `k` caveats
    /// pointing at the next level cost `k^depth` checks.
    pub fn verify(
        &self,
        verifier: &Verifier,
        key: &[u8],
        discharges: &[Macaroon],
    ) -> VerificationResult {
        self.verify_with(&SecretBox::default(), verifier, key, discharges)
    }

    /// Verify with an explicit sealer for third-party caveat keys.
    pub fn verify_with(
        &self,
        sealer: &dyn Sealer,
        verifier: &Verifier,
        key: &[u8],
        discharges: &[Macaroon],
    ) -> VerificationResult {
        verify_tree(sealer, verifier, self, &chain::derive_key(key), discharges)
    }

    /// Verify with an already-derived 32-byte key.
    pub fn verify_with_derived_key(
        &self,
        sealer: &dyn Sealer,
        verifier: &Verifier,
        derived_key: &[u8],
        discharges: &[Macaroon],
    ) -> Result<VerificationResult, MacaroonError> {
        check_key(derived_key)?;
        Ok(verify_tree(sealer, verifier, self, derived_key, discharges))
    }

    /// Multi-line human readable dump of every field.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Location = {}\n",
            self.location.as_ref().map(Packet::to_string).unwrap_or_default()
        ));
        out.push_str(&format!("Identifier = {}\n", self.identifier));
        for caveat in &self.caveats {
            out.push_str(&caveat.inspect());
        }
        out.push_str(&format!("Signature = {}\n", self.signature));
        out
    }

    fn check_capacity(&self) -> Result<(), MacaroonError> {
        if self.caveats.len() + 1 >= MACAROON_MAX_CAVEATS {
            return Err(MacaroonError::TooManyCaveats {
                max: MACAROON_MAX_CAVEATS,
            });
        }
        Ok(())
    }
}

impl Display for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => Display::fmt(location, f),
            None => Ok(()),
        }
    }
}

fn signature_packet(signature: [u8; MACAROON_HASH_BYTES]) -> Packet {
    Packet::new(signature.to_vec(), Encoding::Hex)
}

pub(crate) fn check_length(name: &'static str, packet: &Packet) -> Result<(), MacaroonError> {
    if packet.len() > MACAROON_MAX_STRLEN {
        return Err(MacaroonError::DataTooLong {
            name,
            length: packet.len(),
            max: MACAROON_MAX_STRLEN,
        });
    }
    Ok(())
}

fn check_key(key: &[u8]) -> Result<(), MacaroonError> {
    if key.len() != MACAROON_HASH_BYTES {
        return Err(MacaroonError::InvalidLength {
            name: "key",
            length: key.len(),
            expected: MACAROON_HASH_BYTES,
        });
    }
    Ok(())
}
