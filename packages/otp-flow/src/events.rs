use crate::commands::Ticket;
use crate::error::GatewayError;
use crate::keypad::KeypadEvent;

/// Everything the flow machine reacts to.
///
/// Intents come from the user through the shell. Facts come back from effects
/// and carry the [`Ticket`] of the command that produced them; a fact whose
/// ticket is no longer current is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    // Intents
    Keypad(KeypadEvent),
    TermsToggled,
    KeypadToggled,
    SendRequested,
    VerifyRequested,
    ResendRequested,
    EditNumberRequested,

    // Facts
    /// Initial dispatch succeeded.
    ChallengeSent { ticket: Ticket },
    ChallengeFailed { ticket: Ticket, error: GatewayError },
    /// A resend from code entry succeeded.
    ChallengeResent { ticket: Ticket },
    ResendFailed { ticket: Ticket, error: GatewayError },
    OtpAccepted { ticket: Ticket },
    OtpRejected { ticket: Ticket, error: GatewayError },
}

impl FlowEvent {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            FlowEvent::ChallengeSent { ticket }
            | FlowEvent::ChallengeFailed { ticket, .. }
            | FlowEvent::ChallengeResent { ticket }
            | FlowEvent::ResendFailed { ticket, .. }
            | FlowEvent::OtpAccepted { ticket }
            | FlowEvent::OtpRejected { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    pub fn is_fact(&self) -> bool {
        self.ticket().is_some()
    }
}
