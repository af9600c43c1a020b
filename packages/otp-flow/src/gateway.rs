// Boundary calls the flow depends on.
//
// These are INFRASTRUCTURE traits only - success or failure, nothing else.
// What a failure means for the flow is decided by the machine.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::candidate::{OtpCode, PhoneNumber};
use crate::error::GatewayError;

// =============================================================================
// Gateway Trait
// =============================================================================

#[async_trait]
pub trait OtpGateway: Send + Sync {
    /// Issue a one-time code to `phone_number`.
    async fn dispatch_otp(&self, phone_number: &PhoneNumber) -> Result<(), GatewayError>;

    /// Check `code` against the outstanding challenge for `phone_number`.
    async fn verify_otp(&self, phone_number: &PhoneNumber, code: &OtpCode)
        -> Result<(), GatewayError>;
}

// =============================================================================
// Simulated Gateway
// =============================================================================

pub const DEFAULT_SIMULATED_CODE: &str = "123456";
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(1500);

/// Stand-in backend: waits a fixed latency, always dispatches, and accepts a
/// single code for every number.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    accepted_code: OtpCode,
}

impl SimulatedGateway {
    pub fn new(latency: Duration, accepted_code: OtpCode) -> Self {
        Self {
            latency,
            accepted_code,
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self {
            latency: DEFAULT_SIMULATED_LATENCY,
            accepted_code: OtpCode::from_static(DEFAULT_SIMULATED_CODE),
        }
    }
}

#[async_trait]
impl OtpGateway for SimulatedGateway {
    async fn dispatch_otp(&self, phone_number: &PhoneNumber) -> Result<(), GatewayError> {
        tokio::time::sleep(self.latency).await;
        info!(
            phone = %phone_number.redacted(),
            "Simulated gateway: pretending to send OTP"
        );
        Ok(())
    }

    async fn verify_otp(
        &self,
        phone_number: &PhoneNumber,
        code: &OtpCode,
    ) -> Result<(), GatewayError> {
        tokio::time::sleep(self.latency).await;
        if code == &self.accepted_code {
            Ok(())
        } else {
            info!(
                phone = %phone_number.redacted(),
                "Simulated gateway: code does not match"
            );
            Err(GatewayError::rejected("code does not match"))
        }
    }
}

// =============================================================================
// Twilio Gateway
// =============================================================================

#[cfg(feature = "twilio")]
pub use self::twilio_gateway::TwilioGateway;

#[cfg(feature = "twilio")]
mod twilio_gateway {
    use async_trait::async_trait;
    use tracing::error;
    use twilio::{TwilioError, TwilioService};

    use super::OtpGateway;
    use crate::candidate::{OtpCode, PhoneNumber};
    use crate::error::GatewayError;

    /// Twilio Verify backend. Numbers are sent in E.164 form.
    pub struct TwilioGateway {
        service: TwilioService,
        country_prefix: String,
    }

    impl TwilioGateway {
        pub fn new(service: TwilioService, country_prefix: impl Into<String>) -> Self {
            Self {
                service,
                country_prefix: country_prefix.into(),
            }
        }
    }

    /// 4xx answers and non-approved checks are the backend saying no;
    /// everything else never got a real answer.
    fn map_error(e: TwilioError) -> GatewayError {
        match &e {
            TwilioError::NotApproved { status } => GatewayError::rejected(status.clone()),
            TwilioError::Api { status, .. } if status.is_client_error() => {
                GatewayError::rejected(e.to_string())
            }
            _ => GatewayError::transport(e.to_string()),
        }
    }

    #[async_trait]
    impl OtpGateway for TwilioGateway {
        async fn dispatch_otp(&self, phone_number: &PhoneNumber) -> Result<(), GatewayError> {
            self.service
                .send_otp(&phone_number.e164(&self.country_prefix))
                .await
                .map(|_| ())
                .map_err(|e| {
                    error!(phone = %phone_number.redacted(), "Failed to send OTP: {}", e);
                    map_error(e)
                })
        }

        async fn verify_otp(
            &self,
            phone_number: &PhoneNumber,
            code: &OtpCode,
        ) -> Result<(), GatewayError> {
            self.service
                .verify_otp(&phone_number.e164(&self.country_prefix), code.as_str())
                .await
                .map_err(|e| {
                    error!(phone = %phone_number.redacted(), "OTP verification failed: {}", e);
                    map_error(e)
                })
        }
    }

}
