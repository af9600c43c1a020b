use std::fmt;

use crate::candidate::{OtpCode, PhoneNumber};

/// Epoch stamp tying a boundary result to the command that asked for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) fn next(self) -> Self {
        Ticket(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Intent for a boundary call, decided by the machine and run by effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    DispatchOtp {
        ticket: Ticket,
        phone_number: PhoneNumber,
        /// Issued from code entry rather than the first send.
        resend: bool,
    },
    VerifyOtp {
        ticket: Ticket,
        phone_number: PhoneNumber,
        code: OtpCode,
    },
}

impl FlowCommand {
    pub fn ticket(&self) -> Ticket {
        match self {
            FlowCommand::DispatchOtp { ticket, .. } | FlowCommand::VerifyOtp { ticket, .. } => {
                *ticket
            }
        }
    }

    pub fn phone_number(&self) -> &PhoneNumber {
        match self {
            FlowCommand::DispatchOtp { phone_number, .. }
            | FlowCommand::VerifyOtp { phone_number, .. } => phone_number,
        }
    }
}
