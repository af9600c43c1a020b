//! Minimal Twilio Verify client: dispatch a code, check a code.

use std::collections::HashMap;

pub mod models;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{OTPResponse, OTPVerifyResponse};

pub use reqwest::StatusCode;

pub const DEFAULT_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub service_id: String,
}

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("request to Twilio failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Twilio returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to parse Twilio response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("verification not approved (status: {status})")]
    NotApproved { status: String },
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    base_url: String,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point at a different Verify host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn send_otp(&self, recipient: &str) -> Result<OTPResponse, TwilioError> {
        let channel = channel_for(recipient);
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("Channel", channel);

        debug!(channel, "dispatching verification");
        let response = self.post("Verifications", &form_body).await?;
        response.json::<OTPResponse>().await.map_err(TwilioError::Decode)
    }

    pub async fn verify_otp(&self, recipient: &str, code: &str) -> Result<(), TwilioError> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("Code", code);

        let response = self.post("VerificationCheck", &form_body).await?;
        let result = response
            .json::<OTPVerifyResponse>()
            .await
            .map_err(TwilioError::Decode)?;

        if result.is_approved() {
            Ok(())
        } else {
            Err(TwilioError::NotApproved {
                status: result.status,
            })
        }
    }

    async fn post(
        &self,
        resource: &str,
        form_body: &HashMap<&str, &str>,
    ) -> Result<reqwest::Response, TwilioError> {
        let url = self.resource_url(resource);
        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(form_body)
            .send()
            .await
            .map_err(TwilioError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Twilio error: {}", body);
            return Err(TwilioError::Api { status, body });
        }
        Ok(response)
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/Services/{}/{}",
            self.base_url, self.options.service_id, resource
        )
    }
}

/// Email addresses go out by email, everything else by SMS.
fn channel_for(recipient: &str) -> &'static str {
    if recipient.contains('@') {
        "email"
    } else {
        "sms"
    }
}
