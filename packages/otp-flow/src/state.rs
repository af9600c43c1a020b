//! The single owned flow state.

use serde::Serialize;

use crate::candidate::{OtpCandidate, OtpCode, PhoneCandidate, PhoneNumber};
use crate::keypad::KeypadInput;

/// Phone number entry, the initial state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneEntry {
    pub candidate: PhoneCandidate,
    pub keypad_visible: bool,
    pub terms_accepted: bool,
}

impl PhoneEntry {
    /// Send is enabled only with a full number and accepted terms.
    pub fn can_send(&self) -> bool {
        self.candidate.is_complete() && self.terms_accepted
    }

    /// Text cursor is drawn while the keypad is up and there is room left.
    pub fn shows_cursor(&self) -> bool {
        self.keypad_visible && !self.candidate.is_complete()
    }
}

/// Code entry for a number a challenge was dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpEntry {
    pub phone_number: PhoneNumber,
    pub candidate: OtpCandidate,
    /// A resend is awaiting its boundary call.
    pub resend_in_flight: bool,
}

impl OtpEntry {
    pub fn new(phone_number: PhoneNumber) -> Self {
        Self {
            phone_number,
            candidate: OtpCandidate::new(),
            resend_in_flight: false,
        }
    }

    pub fn can_verify(&self) -> bool {
        self.candidate.is_complete()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum FlowState {
    PhoneEntry(PhoneEntry),

    /// Challenge dispatch in flight.
    Dispatching {
        phone_number: PhoneNumber,
        /// Restored if dispatch fails.
        keypad_visible: bool,
    },

    OtpEntry(OtpEntry),

    /// Verification in flight.
    Verifying {
        phone_number: PhoneNumber,
        #[serde(skip_serializing)]
        submitted_otp: OtpCode,
    },

    /// Terminal. The shell takes over from here.
    Authenticated { phone_number: PhoneNumber },
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::PhoneEntry(PhoneEntry::default())
    }
}

impl FlowState {
    /// Short name used in log lines and errors.
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::PhoneEntry(_) => "entering phone number",
            FlowState::Dispatching { .. } => "sending code",
            FlowState::OtpEntry(_) => "entering code",
            FlowState::Verifying { .. } => "verifying code",
            FlowState::Authenticated { .. } => "signed in",
        }
    }

    /// A boundary call owns the flow; the shell should show a busy indicator
    /// and disable the triggering action.
    pub fn is_busy(&self) -> bool {
        match self {
            FlowState::Dispatching { .. } | FlowState::Verifying { .. } => true,
            FlowState::OtpEntry(entry) => entry.resend_in_flight,
            _ => false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, FlowState::Authenticated { .. })
    }

    /// The frozen number, once one exists.
    pub fn phone_number(&self) -> Option<&PhoneNumber> {
        match self {
            FlowState::PhoneEntry(_) => None,
            FlowState::Dispatching { phone_number, .. }
            | FlowState::Verifying { phone_number, .. }
            | FlowState::Authenticated { phone_number } => Some(phone_number),
            FlowState::OtpEntry(entry) => Some(&entry.phone_number),
        }
    }

    /// Keypad for this render. Only a candidate the user can edit gets live keys.
    pub fn keypad(&self) -> KeypadInput {
        match self {
            FlowState::PhoneEntry(entry) if entry.keypad_visible => KeypadInput::enabled(),
            FlowState::OtpEntry(_) => KeypadInput::enabled(),
            _ => KeypadInput::disabled(),
        }
    }

    pub fn as_phone_entry(&self) -> Option<&PhoneEntry> {
        match self {
            FlowState::PhoneEntry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_otp_entry(&self) -> Option<&OtpEntry> {
        match self {
            FlowState::OtpEntry(entry) => Some(entry),
            _ => None,
        }
    }
}
