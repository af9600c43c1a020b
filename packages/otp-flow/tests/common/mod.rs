// Shared helpers for flow integration tests.
//
// RecordingGateway - scripted gateway that captures every boundary call.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use otp_flow::{
    async_trait, AuthFlow, FlowConfig, GatewayError, OtpCode, OtpGateway, PhoneNumber,
};

/// A boundary call captured by [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Dispatch { phone: String },
    Verify { phone: String, code: String },
}

type Hook = Box<dyn FnOnce() + Send>;

pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    dispatch_outcomes: Arc<Mutex<VecDeque<Result<(), GatewayError>>>>,
    verify_outcomes: Arc<Mutex<VecDeque<Result<(), GatewayError>>>>,
    accepted_code: String,
    delay: Option<Duration>,
    hang: bool,
    in_flight_hook: Arc<Mutex<Option<Hook>>>,
}

impl RecordingGateway {
    /// Dispatch always succeeds; only `123456` verifies.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            dispatch_outcomes: Arc::new(Mutex::new(VecDeque::new())),
            verify_outcomes: Arc::new(Mutex::new(VecDeque::new())),
            accepted_code: "123456".to_string(),
            delay: None,
            hang: false,
            in_flight_hook: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue the outcome of the next dispatch call.
    pub fn with_dispatch_outcome(self, outcome: Result<(), GatewayError>) -> Self {
        self.dispatch_outcomes.lock().unwrap().push_back(outcome);
        self
    }

    /// Queue the outcome of the next verify call, overriding the code check.
    pub fn with_verify_outcome(self, outcome: Result<(), GatewayError>) -> Self {
        self.verify_outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never answer.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Run `hook` while the next boundary call is in flight.
    pub fn while_in_flight(&self, hook: impl FnOnce() + Send + 'static) {
        *self.in_flight_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Dispatch { .. }))
            .count()
    }

    pub fn verify_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Verify { .. }))
            .count()
    }

    async fn in_flight(&self) {
        let hook = self.in_flight_hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl OtpGateway for RecordingGateway {
    async fn dispatch_otp(&self, phone_number: &PhoneNumber) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Dispatch {
            phone: phone_number.to_string(),
        });
        self.in_flight().await;
        let next = self.dispatch_outcomes.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn verify_otp(
        &self,
        phone_number: &PhoneNumber,
        code: &OtpCode,
    ) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Verify {
            phone: phone_number.to_string(),
            code: code.as_str().to_string(),
        });
        self.in_flight().await;
        let scripted = self.verify_outcomes.lock().unwrap().pop_front();
        if let Some(outcome) = scripted {
            return outcome;
        }
        if code.as_str() == self.accepted_code {
            Ok(())
        } else {
            Err(GatewayError::rejected("incorrect code"))
        }
    }
}

/// Flow wired to `gateway` with default config.
pub fn flow_with(gateway: &Arc<RecordingGateway>) -> AuthFlow {
    flow_with_config(gateway, &FlowConfig::default())
}

pub fn flow_with_config(gateway: &Arc<RecordingGateway>, config: &FlowConfig) -> AuthFlow {
    let gateway: Arc<dyn OtpGateway> = gateway.clone();
    AuthFlow::new(config, gateway)
}

pub fn type_digits(flow: &mut AuthFlow, digits: &str) {
    for d in digits.chars() {
        flow.append_digit(d).unwrap();
    }
}

/// Scenario A: number typed, terms accepted, code sent.
pub async fn reach_otp_entry(flow: &mut AuthFlow) {
    type_digits(flow, "9876543210");
    flow.toggle_terms_accepted().unwrap();
    flow.send_challenge().await.unwrap();
}
