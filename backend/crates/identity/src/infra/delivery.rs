//! Code Delivery Implementations
//!
//! The real transport (an email provider) lives outside this crate; this
//! module provides the logging stand-in used in development and the
//! test-side capture.

use crate::domain::repository::CodeDelivery;
use crate::domain::entity::VerificationPurpose;
use crate::domain::value_object::Email;
use crate::error::IdentityResult;

/// Logs that a code was issued, without the code itself
#[derive(Default)]
pub struct TracingCodeDelivery;

impl CodeDelivery for TracingCodeDelivery {
    async fn deliver(
        &self,
        recipient: &Email,
        purpose: VerificationPurpose,
        _code: &str,
    ) -> IdentityResult<()> {
        tracing::info!(
            recipient = %recipient,
            purpose = %purpose,
            "Verification code issued"
        );
        Ok(())
    }
}

/// Captures delivered codes for tests
#[derive(Default)]
pub struct CapturingCodeDelivery {
    delivered: std::sync::Mutex<Vec<(String, VerificationPurpose, String)>>,
}

impl CapturingCodeDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently delivered code for a recipient, if any
    pub fn last_code_for(&self, recipient: &str) -> Option<String> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|(r, _, _)| r == recipient)
            .map(|(_, _, code)| code.clone())
    }
}

impl CodeDelivery for CapturingCodeDelivery {
    async fn deliver(
        &self,
        recipient: &Email,
        purpose: VerificationPurpose,
        code: &str,
    ) -> IdentityResult<()> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((recipient.as_str().to_string(), purpose, code.to_string()));
        Ok(())
    }
}
