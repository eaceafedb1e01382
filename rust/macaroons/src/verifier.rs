use std::collections::HashSet;
use std::fmt;

use crate::{Macaroon, Packet, VerificationResult};

/// Answer of a predicate to a first-party caveat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Satisfaction {
    /// The caveat holds.
    Satisfied,
    /// The caveat does not hold, or the predicate does not understand it.
    Unsatisfied,
    /// The caveat does not hold, for the given reason.
    Rejected(String),
}

impl Satisfaction {
    /// Whether the caveat holds.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Satisfaction::Satisfied)
    }
}

impl From<bool> for Satisfaction {
    fn from(value: bool) -> Self {
        if value {
            Satisfaction::Satisfied
        } else {
            Satisfaction::Unsatisfied
        }
    }
}

type GeneralPredicate = Box<dyn Fn(&Packet) -> Satisfaction + Send + Sync>;

/// The set of first-party caveats a target service accepts.
///
/// Caveats can be accepted verbatim ([`Verifier::satisfy_exact`]) or by a
/// callback that interprets them ([`Verifier::satisfy_general`]). Checking a
/// caveat never mutates the verifier, so one verifier can serve any number
/// of verifications, from any number of threads.
///
/// ```rust
/// use macaroons::{Packet, Verifier};
///
/// let mut verifier = Verifier::new();
/// verifier
///     .satisfy_exact("account = 3735928559")
///     .satisfy_general(|cid: &Packet| cid.starts_with(b"time < "));
///
/// assert!(verifier.is_valid_first_party_caveat(&"account = 3735928559".into()));
/// assert!(verifier.is_valid_first_party_caveat(&"time < 2115-01-01T00:00".into()));
/// assert!(!verifier.is_valid_first_party_caveat(&"account = 1".into()));
/// ```
#[derive(Default)]
pub struct Verifier {
    exact: HashSet<Packet>,
    general: Vec<GeneralPredicate>,
}

impl Verifier {
    /// A verifier that accepts nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a caveat whose identifier is exactly `predicate`.
    pub fn satisfy_exact(&mut self, predicate: impl Into<Packet>) -> &mut Self {
        self.exact.insert(predicate.into());
        self
    }

    /// Accept caveats for which `predicate` returns a satisfied answer.
    ///
    /// `predicate` may return a `bool` or a [`Satisfaction`] carrying a
    /// rejection reason.
    pub fn satisfy_general<F, R>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Packet) -> R + Send + Sync + 'static,
        R: Into<Satisfaction>,
    {
        self.general
            .push(Box::new(move |cid: &Packet| predicate(cid).into()));
        self
    }

    /// Evaluate a first-party caveat.
    ///
    /// Exact matches win outright. Otherwise general predicates run in
    /// registration order until one is satisfied. If none is, the result
    /// carries the last rejection reason given, if any.
    pub fn check(&self, cid: &Packet) -> Satisfaction {
        if self.exact.contains(cid) {
            return Satisfaction::Satisfied;
        }

        let mut reason = None;
        for predicate in &self.general {
            match predicate(cid) {
                Satisfaction::Satisfied => return Satisfaction::Satisfied,
                Satisfaction::Rejected(message) if !message.is_empty() => {
                    reason = Some(message);
                }
                _ => {}
            }
        }

        reason.map_or(Satisfaction::Unsatisfied, Satisfaction::Rejected)
    }

    /// Whether `cid` is accepted.
    pub fn is_valid_first_party_caveat(&self, cid: &Packet) -> bool {
        self.check(cid).is_satisfied()
    }

    /// Verify `macaroon` under root `key` with this verifier.
    ///
    /// Shorthand for [`Macaroon::verify`].
    pub fn verify(
        &self,
        macaroon: &Macaroon,
        key: &[u8],
        discharges: &[Macaroon],
    ) -> VerificationResult {
        macaroon.verify(self, key, discharges)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("exact", &self.exact)
            .field("general", &self.general.len())
            .finish()
    }
}
