#![warn(missing_docs)]

//! Macaroons - Attenuable Bearer Tokens
//!
//! A macaroon is a bearer token whose signature is an HMAC chain over an
//! identifier and an ordered list of caveats. Anyone holding a macaroon can
//! append caveats to restrict it further, but only the holder of the root
//! key can mint one or check its signature.
//!
//! # Overview
//!
//! 1. The target service mints a macaroon from a root key and an identifier
//! 2. Holders attenuate it with first-party caveats (predicates the target
//!    service checks) and third-party caveats (conditions another service
//!    must vouch for)
//! 3. Third parties issue discharge macaroons, which the holder binds to the
//!    primary with [`Macaroon::prepare_for_request`]
//! 4. The target service verifies the primary and the bound discharges with
//!    a [`Verifier`] that knows which predicates hold
//!
//! # Example
//!
//! ```rust
//! use macaroons::{Macaroon, SecretBox, Verifier};
//!
//! let root_key = b"this is our super secret key; only we should know it";
//! let mut macaroon = Macaroon::new("http://mybank/", root_key, "we used our secret key")?;
//! macaroon
//!     .add_first_party_caveat("account = 3735928559")?
//!     .add_third_party_caveat(
//!         &SecretBox::default(),
//!         "http://auth.mybank/",
//!         b"shared with the auth service",
//!         "user = alice",
//!     )?;
//!
//! // The auth service mints a discharge under the key it shares with us.
//! let discharge = Macaroon::new(
//!     "http://auth.mybank/",
//!     b"shared with the auth service",
//!     "user = alice",
//! )?;
//! let bound = macaroon.prepare_for_request(&discharge);
//!
//! // The token travels as URL-safe base64.
//! let token = macaroon.serialize()?;
//! let received = Macaroon::deserialize(&token)?;
//!
//! let mut verifier = Verifier::new();
//! verifier.satisfy_exact("account = 3735928559");
//!
//! assert!(received.verify(&verifier, root_key, &[bound]).is_success());
//! # Ok::<(), macaroons::MacaroonError>(())
//! ```

mod caveat;
mod chain;
mod encoding;
mod error;
mod macaroon;
mod options;
mod packet;
mod result;
mod transport;
mod verifier;
mod verify;
pub mod wire;

pub use caveat::Caveat;
pub use chain::{
    MACAROON_HASH_BYTES, MACAROON_MAX_CAVEATS, MACAROON_MAX_STRLEN,
    MACAROON_SUGGESTED_SECRET_LENGTH, derive_key,
};
pub use encoding::Encoding;
pub use error::MacaroonError;
pub use macaroon::Macaroon;
pub use options::SerializationOptions;
pub use packet::Packet;
pub use result::VerificationResult;
pub use verifier::{Satisfaction, Verifier};

pub use macaroons_crypto::{NoncePolicy, Sealer, SecretBox};
