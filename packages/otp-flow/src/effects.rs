use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::commands::FlowCommand;
use crate::error::GatewayError;
use crate::events::FlowEvent;
use crate::gateway::OtpGateway;

/// Flow effect - runs boundary calls for commands and reports the outcome as a
/// fact event.
///
/// Effects are stateless: the command carries the number, the code and the
/// ticket. Nothing here touches flow state.
#[derive(Clone)]
pub struct FlowEffects {
    gateway: Arc<dyn OtpGateway>,
    timeout: Option<Duration>,
}

impl FlowEffects {
    pub fn new(gateway: Arc<dyn OtpGateway>) -> Self {
        Self {
            gateway,
            timeout: None,
        }
    }

    /// Give up on a boundary call after `timeout` and report
    /// [`GatewayError::Timeout`].
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn execute(&self, cmd: FlowCommand) -> FlowEvent {
        match cmd {
            FlowCommand::DispatchOtp {
                ticket,
                phone_number,
                resend,
            } => {
                let result = self
                    .bounded(self.gateway.dispatch_otp(&phone_number))
                    .await;
                match (result, resend) {
                    (Ok(()), false) => {
                        info!(phone = %phone_number.redacted(), %ticket, "OTP sent");
                        FlowEvent::ChallengeSent { ticket }
                    }
                    (Ok(()), true) => {
                        info!(phone = %phone_number.redacted(), %ticket, "OTP resent");
                        FlowEvent::ChallengeResent { ticket }
                    }
                    (Err(error), false) => {
                        warn!(phone = %phone_number.redacted(), %ticket, "Failed to send OTP: {}", error);
                        FlowEvent::ChallengeFailed { ticket, error }
                    }
                    (Err(error), true) => {
                        warn!(phone = %phone_number.redacted(), %ticket, "Failed to resend OTP: {}", error);
                        FlowEvent::ResendFailed { ticket, error }
                    }
                }
            }
            FlowCommand::VerifyOtp {
                ticket,
                phone_number,
                code,
            } => match self
                .bounded(self.gateway.verify_otp(&phone_number, &code))
                .await
            {
                Ok(()) => {
                    info!(phone = %phone_number.redacted(), %ticket, "OTP verified");
                    FlowEvent::OtpAccepted { ticket }
                }
                Err(error) => {
                    warn!(phone = %phone_number.redacted(), %ticket, "OTP verification failed: {}", error);
                    FlowEvent::OtpRejected { ticket, error }
                }
            },
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<(), GatewayError>
    where
        F: Future<Output = Result<(), GatewayError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GatewayError::Timeout(limit))),
            None => call.await,
        }
    }
}
