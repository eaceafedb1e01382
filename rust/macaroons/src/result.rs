/// Outcome of verifying a macaroon together with its discharges.
///
/// A result starts out successful. Every failure flips it to unsuccessful
/// and records one human-readable message; messages appear in the order
/// the verifier encountered the problems, so failures inside a discharge
/// precede the signature check of the macaroon that referenced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    success: bool,
    messages: Vec<String>,
}

impl Default for VerificationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationResult {
    /// A successful result with no messages.
    pub fn new() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    /// Whether verification succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Diagnostic messages, one per failure.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Record a failure.
    pub fn add_failure(&mut self, message: impl Into<String>) {
        self.success = false;
        self.messages.push(message.into());
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: VerificationResult) {
        self.success &= other.success;
        self.messages.extend(other.messages);
    }
}
