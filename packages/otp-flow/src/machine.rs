//! Flow machine: pure, synchronous state transitions.
//!
//! The machine owns the [`FlowState`] and decides, for each [`FlowEvent`],
//! the next state and whether a boundary call is needed.
//!
//! # Key Properties
//!
//! - **No IO, no async**: boundary calls are returned as [`FlowCommand`]s
//! - **One event, at most one command**
//! - **Errors go in `Err`**: validation failures leave the state untouched;
//!   failure facts are applied first (revert/clear) and then returned as the
//!   error to surface
//! - **Stale facts are dropped**: only the most recent command's ticket is
//!   current
//!
//! | From        | Event            | Guard              | To                          |
//! |-------------|------------------|--------------------|-----------------------------|
//! | PhoneEntry  | SendRequested    | 10 digits ∧ terms  | Dispatching                 |
//! | Dispatching | ChallengeSent    |                    | OtpEntry                    |
//! | Dispatching | ChallengeFailed  |                    | PhoneEntry (digits kept)    |
//! | OtpEntry    | VerifyRequested  | 6 digits           | Verifying                   |
//! | Verifying   | OtpAccepted      |                    | Authenticated               |
//! | Verifying   | OtpRejected      |                    | OtpEntry (candidate cleared)|
//! | OtpEntry    | ResendRequested  | no resend pending  | OtpEntry (candidate cleared)|
//! | OtpEntry    | EditNumber       |                    | PhoneEntry (all cleared)    |

use tracing::{debug, warn};

use crate::candidate::{PhoneCandidate, PhoneNumber};
use crate::commands::{FlowCommand, Ticket};
use crate::error::{FlowError, ValidationError};
use crate::events::FlowEvent;
use crate::keypad::KeypadEvent;
use crate::state::{FlowState, OtpEntry, PhoneEntry};

/// Behaviour the two screen variants disagreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPolicy {
    /// Clear the terms checkbox when the user goes back to edit the number.
    pub reset_terms_on_edit: bool,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            reset_terms_on_edit: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowMachine {
    state: FlowState,
    ticket: Ticket,
    policy: FlowPolicy,
}

impl FlowMachine {
    pub fn new(policy: FlowPolicy) -> Self {
        Self {
            state: FlowState::default(),
            ticket: Ticket::default(),
            policy,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn policy(&self) -> FlowPolicy {
        self.policy
    }

    /// Whether a fact stamped with `ticket` would still be applied.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.ticket == ticket
    }

    /// Process an event and optionally return a command to run.
    pub fn decide(&mut self, event: &FlowEvent) -> Result<Option<FlowCommand>, FlowError> {
        if let Some(ticket) = event.ticket() {
            if !self.is_current(ticket) {
                debug!(%ticket, current = %self.ticket, "dropping stale boundary result");
                return Ok(None);
            }
        }

        match event {
            FlowEvent::Keypad(key) => self.on_keypad(*key).map(|_| None),
            FlowEvent::TermsToggled => {
                let entry = self.phone_entry_mut("accepting terms")?;
                entry.terms_accepted = !entry.terms_accepted;
                Ok(None)
            }
            FlowEvent::KeypadToggled => {
                let entry = self.phone_entry_mut("showing the keypad")?;
                entry.keypad_visible = !entry.keypad_visible;
                Ok(None)
            }
            FlowEvent::SendRequested => self.on_send().map(Some),
            FlowEvent::VerifyRequested => self.on_verify().map(Some),
            FlowEvent::ResendRequested => self.on_resend().map(Some),
            FlowEvent::EditNumberRequested => self.on_edit().map(|_| None),

            FlowEvent::ChallengeSent { .. } => {
                match &self.state {
                    FlowState::Dispatching { phone_number, .. } => {
                        self.state = FlowState::OtpEntry(OtpEntry::new(phone_number.clone()));
                    }
                    other => self.unexpected("ChallengeSent", other),
                }
                Ok(None)
            }
            FlowEvent::ChallengeFailed { error, .. } => {
                match &self.state {
                    FlowState::Dispatching {
                        phone_number,
                        keypad_visible,
                    } => {
                        self.state = FlowState::PhoneEntry(PhoneEntry {
                            candidate: candidate_from(phone_number),
                            keypad_visible: *keypad_visible,
                            terms_accepted: true,
                        });
                    }
                    other => {
                        self.unexpected("ChallengeFailed", other);
                        return Ok(None);
                    }
                }
                Err(FlowError::ChallengeDispatch(error.clone()))
            }
            FlowEvent::ChallengeResent { .. } => {
                match &mut self.state {
                    FlowState::OtpEntry(entry) => entry.resend_in_flight = false,
                    other => {
                        warn!(state = other.name(), "ChallengeResent outside code entry");
                    }
                }
                Ok(None)
            }
            FlowEvent::ResendFailed { error, .. } => match &mut self.state {
                FlowState::OtpEntry(entry) => {
                    entry.resend_in_flight = false;
                    Err(FlowError::ChallengeDispatch(error.clone()))
                }
                other => {
                    warn!(state = other.name(), "ResendFailed outside code entry");
                    Ok(None)
                }
            },
            FlowEvent::OtpAccepted { .. } => {
                match &self.state {
                    FlowState::Verifying { phone_number, .. } => {
                        self.state = FlowState::Authenticated {
                            phone_number: phone_number.clone(),
                        };
                    }
                    other => self.unexpected("OtpAccepted", other),
                }
                Ok(None)
            }
            FlowEvent::OtpRejected { error, .. } => {
                match &self.state {
                    FlowState::Verifying { phone_number, .. } => {
                        self.state = FlowState::OtpEntry(OtpEntry::new(phone_number.clone()));
                    }
                    other => {
                        self.unexpected("OtpRejected", other);
                        return Ok(None);
                    }
                }
                Err(FlowError::Verification(error.clone()))
            }
        }
    }

    fn on_keypad(&mut self, key: KeypadEvent) -> Result<(), FlowError> {
        let changed = match &mut self.state {
            FlowState::PhoneEntry(entry) => apply_key(&mut entry.candidate, key),
            FlowState::OtpEntry(entry) => apply_key(&mut entry.candidate, key),
            other => return Err(not_available("typing", other)),
        };
        if !changed {
            debug!(?key, "keypad input had no effect");
        }
        Ok(())
    }

    fn on_send(&mut self) -> Result<FlowCommand, FlowError> {
        let entry = self.phone_entry_mut("sending a code")?;
        let phone_number = entry.candidate.to_phone_number()?;
        if !entry.terms_accepted {
            return Err(ValidationError::TermsNotAccepted.into());
        }
        let keypad_visible = entry.keypad_visible;

        self.ticket = self.ticket.next();
        self.state = FlowState::Dispatching {
            phone_number: phone_number.clone(),
            keypad_visible,
        };
        Ok(FlowCommand::DispatchOtp {
            ticket: self.ticket,
            phone_number,
            resend: false,
        })
    }

    fn on_verify(&mut self) -> Result<FlowCommand, FlowError> {
        let entry = match &self.state {
            FlowState::OtpEntry(entry) => entry,
            other => return Err(not_available("verifying", other)),
        };
        let code = entry.candidate.to_otp_code()?;
        let phone_number = entry.phone_number.clone();

        self.ticket = self.ticket.next();
        self.state = FlowState::Verifying {
            phone_number: phone_number.clone(),
            submitted_otp: code.clone(),
        };
        Ok(FlowCommand::VerifyOtp {
            ticket: self.ticket,
            phone_number,
            code,
        })
    }

    fn on_resend(&mut self) -> Result<FlowCommand, FlowError> {
        let entry = match &mut self.state {
            FlowState::OtpEntry(entry) if !entry.resend_in_flight => entry,
            other => return Err(not_available("resending", other)),
        };
        entry.candidate.clear();
        entry.resend_in_flight = true;
        let phone_number = entry.phone_number.clone();

        self.ticket = self.ticket.next();
        Ok(FlowCommand::DispatchOtp {
            ticket: self.ticket,
            phone_number,
            resend: true,
        })
    }

    fn on_edit(&mut self) -> Result<(), FlowError> {
        match &self.state {
            FlowState::OtpEntry(_) | FlowState::Verifying { .. } => {}
            other => return Err(not_available("editing the number", other)),
        }
        // Anything still in flight belongs to the number being discarded.
        self.ticket = self.ticket.next();
        self.state = FlowState::PhoneEntry(PhoneEntry {
            candidate: PhoneCandidate::new(),
            keypad_visible: true,
            terms_accepted: !self.policy.reset_terms_on_edit,
        });
        Ok(())
    }

    fn phone_entry_mut(&mut self, action: &'static str) -> Result<&mut PhoneEntry, FlowError> {
        match &mut self.state {
            FlowState::PhoneEntry(entry) => Ok(entry),
            other => Err(not_available(action, other)),
        }
    }

    fn unexpected(&self, fact: &'static str, state: &FlowState) {
        warn!(fact, state = state.name(), "boundary result does not match flow state");
    }
}

fn apply_key<const MAX: usize>(
    candidate: &mut crate::candidate::DigitCandidate<MAX>,
    key: KeypadEvent,
) -> bool {
    match key {
        KeypadEvent::Digit(d) => candidate.push(d),
        KeypadEvent::Backspace => candidate.pop(),
    }
}

fn candidate_from(phone_number: &PhoneNumber) -> PhoneCandidate {
    let mut candidate = PhoneCandidate::new();
    for d in phone_number.as_str().chars() {
        candidate.push(d);
    }
    candidate
}

fn not_available(action: &'static str, state: &FlowState) -> FlowError {
    FlowError::NotAvailable {
        action,
        state: state.name(),
    }
}
