//! Recursive verification of a macaroon and its discharges.
//!
//! Every macaroon in the tree is checked the same way: recompute its
//! signature chain from the key it was minted with, asking the [`Verifier`]
//! about each first-party caveat and descending into the matching discharge
//! for each third-party caveat. Discharges are additionally bound to the
//! signature of the root macaroon, so a discharge only counts when it was
//! prepared for this exact request.
//!
//! Discharges are identified by their position in the discharge slice. The
//! chain of positions from the root to the current node is kept on the
//! stack as a linked [`Visited`] path, which is how cycles are detected
//! without any shared mutable state between sibling branches.

use macaroons_crypto::Sealer;
use tracing::{debug, trace};

use crate::chain::{self, MACAROON_HASH_BYTES};
use crate::{Caveat, Macaroon, Satisfaction, VerificationResult, Verifier};

struct Visited<'a> {
    index: usize,
    parent: Option<&'a Visited<'a>>,
}

impl Visited<'_> {
    fn contains(&self, index: usize) -> bool {
        let mut node = Some(self);
        while let Some(visited) = node {
            if visited.index == index {
                return true;
            }
            node = visited.parent;
        }
        false
    }
}

struct Verification<'a> {
    sealer: &'a dyn Sealer,
    verifier: &'a Verifier,
    root: &'a Macaroon,
    discharges: &'a [Macaroon],
}

pub(crate) fn verify_tree(
    sealer: &dyn Sealer,
    verifier: &Verifier,
    macaroon: &Macaroon,
    derived_key: &[u8],
    discharges: &[Macaroon],
) -> VerificationResult {
    let verification = Verification {
        sealer,
        verifier,
        root: macaroon,
        discharges,
    };

    let result = verification.verify_node(macaroon, derived_key, None);
    trace!(
        success = result.is_success(),
        failures = result.messages().len(),
        "Verified macaroon {}",
        macaroon.identifier()
    );
    result
}

impl Verification<'_> {
    fn verify_node(
        &self,
        macaroon: &Macaroon,
        key: &[u8],
        path: Option<&Visited<'_>>,
    ) -> VerificationResult {
        let mut result = VerificationResult::new();
        let mut signature = chain::hash(key, macaroon.identifier());

        for caveat in macaroon.caveats() {
            match caveat {
                Caveat::FirstParty { cid } => {
                    match self.verifier.check(cid) {
                        Satisfaction::Satisfied => {}
                        Satisfaction::Unsatisfied => {
                            reject(&mut result, format!("Caveat '{cid}' failed"));
                        }
                        Satisfaction::Rejected(reason) => reject(&mut result, reason),
                    }
                    signature = chain::hash(&signature, cid);
                }
                Caveat::ThirdParty { cid, vid, .. } => {
                    let position = self
                        .discharges
                        .iter()
                        .position(|discharge| discharge.identifier() == cid);

                    match position {
                        None => reject(
                            &mut result,
                            format!("No discharge macaroon found for caveat '{cid}'"),
                        ),
                        Some(index) if path.is_some_and(|path| path.contains(index)) => reject(
                            &mut result,
                            format!(
                                "A circular discharge macaroon reference was found for caveat '{cid}'"
                            ),
                        ),
                        Some(index) => match self.sealer.unseal(&signature, vid) {
                            Err(error) => reject(&mut result, error.to_string()),
                            Ok(child_key) if child_key.len() != MACAROON_HASH_BYTES => reject(
                                &mut result,
                                format!(
                                    "Unsealed key for caveat '{cid}' has {} bytes, expected {MACAROON_HASH_BYTES}",
                                    child_key.len()
                                ),
                            ),
                            Ok(child_key) => {
                                let visited = Visited {
                                    index,
                                    parent: path,
                                };
                                result.merge(self.verify_node(
                                    &self.discharges[index],
                                    &child_key,
                                    Some(&visited),
                                ));
                            }
                        },
                    }

                    signature = chain::hash2(&signature, vid, cid);
                }
            }
        }

        if path.is_some() {
            signature = chain::bind(self.root.signature(), &signature);
        }

        if !signatures_match(&signature, macaroon.signature()) {
            reject(&mut result, "Signature mismatch");
        }

        result
    }
}

fn reject(result: &mut VerificationResult, message: impl Into<String>) {
    let message = message.into();
    debug!("Macaroon verification failure: {message}");
    result.add_failure(message);
}

fn signatures_match(expected: &[u8], actual: &[u8]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .fold(0u8, |difference, (a, b)| difference | (a ^ b))
            == 0
}
