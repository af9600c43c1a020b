//! `AuthFlow` - the controller a shell embeds.
//!
//! Architecture (machine decides, effect executes):
//!   shell intent → machine.decide() → Some(FlowCommand) → effects.execute()
//!       → fact FlowEvent → apply() → machine.decide() → state + notices
//!
//! Responsibilities:
//! - Route keypad presses to whichever candidate is active
//! - Run boundary calls and apply their results
//! - Drop results that arrive after disposal or after the flow moved on
//! - Publish state for rendering and queue user-facing notices
//! - Fire `on_authenticated` exactly once

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::candidate::PhoneNumber;
use crate::commands::FlowCommand;
use crate::config::FlowConfig;
use crate::effects::FlowEffects;
use crate::error::FlowError;
use crate::events::FlowEvent;
use crate::gateway::OtpGateway;
use crate::keypad::{Key, KeypadEvent, KeypadInput};
use crate::machine::FlowMachine;
use crate::notice::Notice;
use crate::state::FlowState;

/// Called with the verified number when the flow completes.
pub type AuthenticatedCallback = Box<dyn FnMut(&PhoneNumber) + Send>;

/// Shared disposal flag. Clone it into whatever owns the screen lifetime;
/// once disposed, in-flight boundary results are discarded.
#[derive(Debug, Clone, Default)]
pub struct DisposeHandle(Arc<AtomicBool>);

impl DisposeHandle {
    pub fn dispose(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct AuthFlow {
    machine: FlowMachine,
    effects: FlowEffects,
    country_prefix: String,
    notices: Vec<Notice>,
    on_authenticated: Option<AuthenticatedCallback>,
    disposed: DisposeHandle,
    state_tx: watch::Sender<FlowState>,
}

impl AuthFlow {
    pub fn new(config: &FlowConfig, gateway: Arc<dyn OtpGateway>) -> Self {
        let machine = FlowMachine::new(config.policy());
        let (state_tx, _) = watch::channel(machine.state().clone());
        Self {
            machine,
            effects: FlowEffects::new(gateway).with_timeout(config.boundary_timeout),
            country_prefix: config.country_prefix.clone(),
            notices: Vec::new(),
            on_authenticated: None,
            disposed: DisposeHandle::default(),
            state_tx,
        }
    }

    /// Register the hand-off to navigation/session setup.
    pub fn on_authenticated<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&PhoneNumber) + Send + 'static,
    {
        self.on_authenticated = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &FlowState {
        self.machine.state()
    }

    /// Latest-value stream of the flow state, for rendering.
    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state_tx.subscribe()
    }

    pub fn country_prefix(&self) -> &str {
        &self.country_prefix
    }

    /// Keypad for the current render.
    pub fn keypad(&self) -> KeypadInput {
        if self.is_disposed() {
            return KeypadInput::disabled();
        }
        self.state().keypad()
    }

    /// Phone field text: the candidate while typing, the frozen number after.
    pub fn formatted_phone(&self) -> String {
        match self.state() {
            FlowState::PhoneEntry(entry) => entry.candidate.format(),
            other => other
                .phone_number()
                .map(|p| crate::candidate::format_phone_number(p.as_str()))
                .unwrap_or_default(),
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn dispose_handle(&self) -> DisposeHandle {
        self.disposed.clone()
    }

    pub fn dispose(&self) {
        debug!("auth flow disposed");
        self.disposed.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }

    /// A clone of the effect runner, for shells that run boundary calls on
    /// their own tasks and feed results back through [`AuthFlow::apply`].
    pub fn effects(&self) -> FlowEffects {
        self.effects.clone()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Press a keypad key. Suppressed presses (blank cell, disabled keypad)
    /// do nothing.
    pub fn press(&mut self, key: Key) -> Result<(), FlowError> {
        match self.keypad().press(key) {
            Some(event) => self.submit(FlowEvent::Keypad(event)).map(drop),
            None => Ok(()),
        }
    }

    pub fn append_digit(&mut self, d: char) -> Result<(), FlowError> {
        self.submit(FlowEvent::Keypad(KeypadEvent::Digit(d)))
            .map(drop)
    }

    pub fn backspace(&mut self) -> Result<(), FlowError> {
        self.submit(FlowEvent::Keypad(KeypadEvent::Backspace))
            .map(drop)
    }

    pub fn toggle_terms_accepted(&mut self) -> Result<(), FlowError> {
        self.submit(FlowEvent::TermsToggled).map(drop)
    }

    pub fn toggle_keypad(&mut self) -> Result<(), FlowError> {
        self.submit(FlowEvent::KeypadToggled).map(drop)
    }

    /// Back to phone entry with both candidates cleared. Anything in flight
    /// is discarded when it lands.
    pub fn edit_number(&mut self) -> Result<(), FlowError> {
        self.submit(FlowEvent::EditNumberRequested).map(drop)
    }

    // =========================================================================
    // Boundary operations
    // =========================================================================

    /// Dispatch a code to the typed number and wait for the outcome.
    pub async fn send_challenge(&mut self) -> Result<(), FlowError> {
        self.run(FlowEvent::SendRequested).await
    }

    /// Verify the typed code and wait for the outcome.
    pub async fn verify(&mut self) -> Result<(), FlowError> {
        self.run(FlowEvent::VerifyRequested).await
    }

    /// Dispatch a fresh code to the same number without leaving code entry.
    pub async fn resend(&mut self) -> Result<(), FlowError> {
        self.run(FlowEvent::ResendRequested).await
    }

    async fn run(&mut self, intent: FlowEvent) -> Result<(), FlowError> {
        let Some(cmd) = self.submit(intent)? else {
            return Ok(());
        };
        let fact = self.effects.execute(cmd).await;
        self.apply(fact)
    }

    // =========================================================================
    // Split API
    // =========================================================================

    /// Feed a user intent to the machine. Returns the boundary call to run,
    /// if any; its result must come back through [`AuthFlow::apply`].
    pub fn submit(&mut self, intent: FlowEvent) -> Result<Option<FlowCommand>, FlowError> {
        if self.is_disposed() {
            return Err(FlowError::NotAvailable {
                action: "input",
                state: "closed",
            });
        }
        if intent.is_fact() {
            warn!(?intent, "boundary result submitted as intent; use apply()");
            return Ok(None);
        }

        let result = self.machine.decide(&intent);
        self.publish();
        match &result {
            Err(FlowError::NotAvailable { action, state }) => {
                debug!(action, state, "ignored intent");
            }
            Err(e) => self.notices.push(Notice::from_error(e)),
            Ok(Some(cmd)) => debug!(ticket = %cmd.ticket(), "boundary call requested"),
            Ok(None) => {}
        }
        result
    }

    /// Apply a boundary result. Results are dropped once the flow is disposed
    /// or when a newer command has superseded theirs.
    pub fn apply(&mut self, fact: FlowEvent) -> Result<(), FlowError> {
        let Some(ticket) = fact.ticket() else {
            warn!(?fact, "intent passed to apply(); use submit()");
            return Ok(());
        };
        if self.is_disposed() {
            debug!(%ticket, "flow disposed, discarding boundary result");
            return Ok(());
        }
        if !self.machine.is_current(ticket) {
            debug!(%ticket, "flow moved on, discarding boundary result");
            return Ok(());
        }

        let result = self.machine.decide(&fact).map(drop);
        self.publish();

        match (&fact, &result) {
            (FlowEvent::ChallengeSent { .. } | FlowEvent::ChallengeResent { .. }, Ok(())) => {
                if let Some(phone) = self.machine.state().phone_number() {
                    self.notices
                        .push(Notice::code_sent(phone, &self.country_prefix));
                }
            }
            (FlowEvent::OtpAccepted { .. }, Ok(())) => self.complete(),
            (_, Err(e)) => self.notices.push(Notice::from_error(e)),
            _ => {}
        }
        result
    }

    fn complete(&mut self) {
        let FlowState::Authenticated { phone_number } = self.machine.state() else {
            return;
        };
        info!(phone = %phone_number.redacted(), "phone number verified, flow complete");
        if let Some(mut callback) = self.on_authenticated.take() {
            callback(phone_number);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.machine.state().clone());
    }
}
