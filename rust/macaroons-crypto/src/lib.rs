#![warn(missing_docs)]

//! Cryptographic collaborators for macaroons.
//!
//! Macaroons need exactly two primitives:
//!
//! - a keyed hash with a 256-bit output ([`hmac_sha256`]), used to chain
//!   signatures over identifiers and caveats, and
//! - an authenticated cipher used to seal the root key of a third-party
//!   caveat under the current signature ([`Sealer`]).
//!
//! The keyed hash is fixed by the protocol. Sealing is a capability that
//! callers pass explicitly to the operations that need it, so the nonce
//! policy is always visible at the call site:
//!
//! ```rust
//! use macaroons_crypto::{NoncePolicy, SecretBox, Sealer};
//!
//! let key = [7u8; 32];
//! let sealer = SecretBox::new(NoncePolicy::Random);
//! let sealed = sealer.seal(&key, b"delegated root key").unwrap();
//! assert_eq!(sealer.unseal(&key, &sealed).unwrap(), b"delegated root key");
//! ```

mod error;
pub use error::*;

mod hash;
pub use hash::*;

mod sealer;
pub use sealer::*;

mod secretbox;
pub use secretbox::*;
