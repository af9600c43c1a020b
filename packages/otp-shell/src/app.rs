//! Key loop driving an [`AuthFlow`] from a terminal.

use std::io;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use console::Term;
use otp_flow::{AuthFlow, FlowEvent, FlowState, Key, KeypadInput, Notice, PhoneNumber};
use tracing::{debug, warn};

use crate::render;

/// What a terminal key means to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Press(Key),
    ToggleTerms,
    ToggleKeypad,
    Submit,
    Resend,
    EditNumber,
    Quit,
}

pub fn action_for(key: &console::Key) -> Option<Action> {
    match key {
        console::Key::Backspace | console::Key::Del => Some(Action::Press(Key::Backspace)),
        console::Key::Enter => Some(Action::Submit),
        console::Key::Escape => Some(Action::Quit),
        console::Key::Char(c) => match c.to_ascii_lowercase() {
            'k' => Some(Action::ToggleKeypad),
            't' => Some(Action::ToggleTerms),
            'r' => Some(Action::Resend),
            'e' => Some(Action::EditNumber),
            'q' => Some(Action::Quit),
            '\n' | '\r' => Some(Action::Submit),
            c => KeypadInput::key_for_char(c).map(Action::Press),
        },
        _ => None,
    }
}

/// Ctrl-C at the prompt interrupts the read; treat it as quit.
pub fn action_for_read(read: io::Result<console::Key>) -> io::Result<Option<Action>> {
    match read {
        Ok(key) => Ok(action_for(&key)),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Some(Action::Quit)),
        Err(e) => Err(e),
    }
}

/// Enter sends on the phone screen and verifies on the code screen.
fn submit_intent(state: &FlowState) -> Option<FlowEvent> {
    match state {
        FlowState::PhoneEntry(_) => Some(FlowEvent::SendRequested),
        FlowState::OtpEntry(_) => Some(FlowEvent::VerifyRequested),
        _ => None,
    }
}

pub struct App {
    term: Term,
    flow: AuthFlow,
    notices: Vec<Notice>,
    signed_in: Arc<Mutex<Option<PhoneNumber>>>,
}

impl App {
    pub fn new(term: Term, flow: AuthFlow) -> Self {
        let signed_in = Arc::new(Mutex::new(None));
        let slot = signed_in.clone();
        let flow = flow.on_authenticated(move |phone| {
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(phone.clone());
            }
        });
        Self {
            term,
            flow,
            notices: Vec::new(),
            signed_in,
        }
    }

    /// Run until the user signs in (returns the number) or quits.
    pub async fn run(&mut self) -> Result<Option<PhoneNumber>> {
        loop {
            self.draw()?;
            if self.flow.state().is_authenticated() {
                break;
            }

            let Some(action) = action_for_read(self.read_key().await?)? else {
                continue;
            };
            self.notices.clear();

            let keep_going = match action {
                Action::Quit => false,
                Action::Press(key) => self.input(|flow| flow.press(key)),
                Action::ToggleTerms => self.input(AuthFlow::toggle_terms_accepted),
                Action::ToggleKeypad => self.input(AuthFlow::toggle_keypad),
                Action::EditNumber => self.input(AuthFlow::edit_number),
                Action::Resend => self.boundary(FlowEvent::ResendRequested).await?,
                Action::Submit => match submit_intent(self.flow.state()) {
                    Some(intent) => self.boundary(intent).await?,
                    None => true,
                },
            };
            self.notices.extend(self.flow.drain_notices());

            if !keep_going {
                self.flow.dispose();
                return Ok(None);
            }
        }

        let phone = self.signed_in.lock().ok().and_then(|slot| slot.clone());
        Ok(phone)
    }

    fn input<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut AuthFlow) -> Result<(), otp_flow::FlowError>,
    {
        if let Err(e) = f(&mut self.flow) {
            debug!(error = %e, "input refused");
        }
        true
    }

    /// Submit an intent that needs the gateway, redraw busy, and wait.
    /// Ctrl-C while waiting disposes the flow so the late result is dropped.
    async fn boundary(&mut self, intent: FlowEvent) -> Result<bool> {
        let cmd = match self.flow.submit(intent) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(true),
            Err(e) => {
                debug!(error = %e, "intent refused");
                return Ok(true);
            }
        };
        self.notices.extend(self.flow.drain_notices());
        self.draw()?;

        let effects = self.flow.effects();
        tokio::select! {
            fact = effects.execute(cmd) => {
                if let Err(e) = self.flow.apply(fact) {
                    debug!(error = %e, "boundary call failed");
                }
                Ok(true)
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted while waiting on the gateway");
                Ok(false)
            }
        }
    }

    async fn read_key(&self) -> Result<io::Result<console::Key>> {
        let term = self.term.clone();
        let read = tokio::task::spawn_blocking(move || term.read_key()).await?;
        Ok(read)
    }

    fn draw(&self) -> Result<()> {
        self.term.clear_screen()?;
        for line in render::screen(&self.flow, &self.notices) {
            self.term.write_line(&line)?;
        }
        Ok(())
    }
}
