use serde::{Deserialize, Serialize};

/// Verification resource returned when a code is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OTPResponse {
    pub sid: String,
    pub service_sid: String,
    pub to: String,
    pub channel: String,
    pub status: String,
    #[serde(default)]
    pub valid: bool,
}

/// Verification check resource. `status` is `"approved"` on a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OTPVerifyResponse {
    pub status: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub to: Option<String>,
}

impl OTPVerifyResponse {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}
