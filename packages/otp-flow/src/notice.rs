//! User-facing messages raised by the flow, rendered by the shell as alerts.

use serde::Serialize;

use crate::candidate::PhoneNumber;
use crate::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    /// "Code sent" confirmation after a dispatch or resend.
    pub fn code_sent(phone_number: &PhoneNumber, country_prefix: &str) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: "OTP Sent",
            message: format!(
                "OTP sent to {}",
                phone_number.display_with_prefix(country_prefix)
            ),
        }
    }

    pub fn from_error(error: &FlowError) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error",
            message: error.user_message().to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_code_sent_includes_prefix() {
        let phone: PhoneNumber = "9876543210".parse().unwrap();
        let notice = Notice::code_sent(&phone, "+91");
        assert_eq!(notice.message, "OTP sent to +91 9876543210");
        assert!(!notice.is_error());
    }

    #[test]
    fn test_error_notice_uses_user_message() {
        let notice = Notice::from_error(&ValidationError::IncompletePhoneNumber.into());
        assert!(notice.is_error());
        assert_eq!(notice.message, "Please enter a valid 10-digit phone number");
    }
}
