//! # otp-flow
//!
//! Phone-number sign-in with a one-time code, driven by an on-screen keypad.
//!
//! ## Core Concepts
//!
//! - [`FlowState`] = the one owned value describing where the user is
//! - [`FlowEvent`] = intents from the user and facts from the backend
//! - [`FlowCommand`] = a boundary call the machine wants made
//!
//! ## Architecture
//!
//! ```text
//! Shell (screen / terminal)
//!     │ key presses, buttons
//!     ▼
//! AuthFlow ── KeypadInput ──► Digit / Backspace
//!     │
//!     ▼ submit(intent)
//! FlowMachine.decide() ──► Some(FlowCommand)
//!     │                          │
//!     │                          ▼
//!     │                    FlowEffects.execute() ──► OtpGateway
//!     │                          │
//!     ◄──────── apply(fact) ─────┘
//!     │
//!     ├─► watch::Receiver<FlowState>   (render)
//!     ├─► drain_notices()              (alerts)
//!     └─► on_authenticated(phone)      (hand-off, once)
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Candidates are clamped** - phone at 10 digits, code at 6; overflow is a no-op
//! 2. **Validation never transitions** - incomplete input or unaccepted terms
//!    leave the state as it was and never reach the gateway
//! 3. **Failures loop back** - dispatch failure keeps the number; verify
//!    failure clears the code and keeps the number
//! 4. **Stale results are dropped** - after edit, a newer submission, or disposal
//! 5. **Authenticated is terminal** - the callback fires exactly once
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use otp_flow::{AuthFlow, FlowConfig, SimulatedGateway};
//!
//! let config = FlowConfig::from_env()?;
//! let gateway = SimulatedGateway::new(config.simulated_latency, config.simulated_code.clone());
//! let mut flow = AuthFlow::new(&config, Arc::new(gateway))
//!     .on_authenticated(|phone| println!("signed in as {}", phone));
//!
//! for d in "9876543210".chars() {
//!     flow.append_digit(d)?;
//! }
//! flow.toggle_terms_accepted()?;
//! flow.send_challenge().await?;
//!
//! for d in "123456".chars() {
//!     flow.append_digit(d)?;
//! }
//! flow.verify().await?;
//! ```

pub mod candidate;
pub mod commands;
pub mod config;
pub mod controller;
pub mod effects;
pub mod error;
pub mod events;
pub mod gateway;
pub mod keypad;
pub mod machine;
pub mod notice;
pub mod state;

pub use candidate::{
    format_phone_number, DigitCandidate, OtpCandidate, OtpCode, PhoneCandidate, PhoneNumber,
    OTP_DIGITS, PHONE_DIGITS,
};
pub use commands::{FlowCommand, Ticket};
pub use config::{FlowConfig, TwilioConfig};
pub use controller::{AuthFlow, AuthenticatedCallback, DisposeHandle};
pub use effects::FlowEffects;
pub use error::{FlowError, GatewayError, ValidationError};
pub use events::FlowEvent;
pub use gateway::{OtpGateway, SimulatedGateway};
pub use keypad::{Key, KeypadEvent, KeypadInput};
pub use machine::{FlowMachine, FlowPolicy};
pub use notice::{Notice, NoticeLevel};
pub use state::{FlowState, OtpEntry, PhoneEntry};

#[cfg(feature = "twilio")]
pub use gateway::TwilioGateway;

// Re-export commonly used external types
pub use async_trait::async_trait;
