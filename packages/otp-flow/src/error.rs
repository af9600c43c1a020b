//! Flow error taxonomy.
//!
//! Every error here is recoverable: the flow stays in (or returns to) a stable
//! state and the user can correct the input or retry.
//!
//! # The User Message Rule
//!
//! > **Transport detail never reaches the screen.**
//!
//! `Display` carries the full detail for logs. `user_message()` is the only
//! text a shell should render.

use std::time::Duration;

use thiserror::Error;

/// Input was incomplete or malformed at submission time.
///
/// Surfaced immediately, no state transition, input retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("phone number must have exactly 10 digits")]
    IncompletePhoneNumber,

    #[error("terms and conditions have not been accepted")]
    TermsNotAccepted,

    #[error("one-time code must have exactly 6 digits")]
    IncompleteOtp,

    #[error("phone number must be 10 decimal digits")]
    InvalidPhoneNumber,

    #[error("one-time code must be 6 decimal digits")]
    InvalidOtpCode,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::IncompletePhoneNumber | ValidationError::InvalidPhoneNumber => {
                "Please enter a valid 10-digit phone number"
            }
            ValidationError::TermsNotAccepted => "Please accept the Terms and Conditions",
            ValidationError::IncompleteOtp | ValidationError::InvalidOtpCode => {
                "Please enter a valid 6-digit OTP"
            }
        }
    }
}

/// Failure reported by a boundary call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend answered and said no (wrong code, number refused).
    #[error("rejected by backend: {reason}")]
    Rejected { reason: String },

    /// The call never produced an answer.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        GatewayError::Rejected {
            reason: reason.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        GatewayError::Transport(detail.into())
    }
}

/// Errors surfaced by the flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Dispatch failed; the phone number is kept so the user can retry.
    #[error("could not send code: {0}")]
    ChallengeDispatch(GatewayError),

    /// Code did not verify; the candidate has been cleared.
    #[error("could not verify code: {0}")]
    Verification(GatewayError),

    /// The action has no meaning in the current state (button disabled, call
    /// already in flight, flow finished).
    #[error("{action} is not available while {state}")]
    NotAvailable {
        action: &'static str,
        state: &'static str,
    },
}

impl FlowError {
    /// Text safe to show the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            FlowError::Validation(e) => e.user_message(),
            FlowError::ChallengeDispatch(_) => "Could not send OTP. Please try again.",
            FlowError::Verification(_) => "Invalid OTP. Please try again.",
            FlowError::NotAvailable { .. } => "Please wait a moment.",
        }
    }

    /// Every failure loops back to a stable state; this only reports whether
    /// simply retrying the same action can succeed without new input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FlowError::ChallengeDispatch(_) | FlowError::NotAvailable { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_transport_detail() {
        let err = FlowError::ChallengeDispatch(GatewayError::transport("tcp reset by 10.0.0.7"));
        assert!(!err.user_message().contains("10.0.0.7"));
        assert!(err.to_string().contains("10.0.0.7"), "Display keeps detail for logs");
    }

    #[test]
    fn test_validation_converts_into_flow_error() {
        let err: FlowError = ValidationError::IncompleteOtp.into();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Please enter a valid 6-digit OTP");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FlowError::ChallengeDispatch(GatewayError::Timeout(Duration::from_secs(5)))
            .is_retryable());
        assert!(!FlowError::Verification(GatewayError::rejected("pending")).is_retryable());
        assert!(!FlowError::Validation(ValidationError::TermsNotAccepted).is_retryable());
    }
}
