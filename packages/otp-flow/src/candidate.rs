//! In-progress digit values built from keypad input, and the frozen values
//! they turn into once complete.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const PHONE_DIGITS: usize = 10;
pub const OTP_DIGITS: usize = 6;

/// Digits shown before the space in a formatted phone number.
const PHONE_GROUP: usize = 5;

/// A bounded string of decimal digits.
///
/// Appending past `MAX` is a silent no-op; so is backspace on empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigitCandidate<const MAX: usize> {
    digits: String,
}

pub type PhoneCandidate = DigitCandidate<PHONE_DIGITS>;
pub type OtpCandidate = DigitCandidate<OTP_DIGITS>;

impl<const MAX: usize> DigitCandidate<MAX> {
    pub fn new() -> Self {
        Self {
            digits: String::with_capacity(MAX),
        }
    }

    /// Append `d` if it is a decimal digit and there is room.
    ///
    /// Returns whether the candidate changed.
    pub fn push(&mut self, d: char) -> bool {
        if !d.is_ascii_digit() || self.digits.len() >= MAX {
            return false;
        }
        self.digits.push(d);
        true
    }

    /// Remove the last digit. Returns whether the candidate changed.
    pub fn pop(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == MAX
    }

    pub const fn capacity() -> usize {
        MAX
    }

    /// One entry per box, `None` where nothing has been typed yet.
    pub fn slots(&self) -> impl Iterator<Item = Option<char>> + '_ {
        let mut chars = self.digits.chars();
        (0..MAX).map(move |_| chars.next())
    }
}

impl PhoneCandidate {
    /// Display form of the digits typed so far.
    pub fn format(&self) -> String {
        format_phone_number(&self.digits)
    }

    /// Freeze into a [`PhoneNumber`]. Fails unless exactly 10 digits are held.
    pub fn to_phone_number(&self) -> Result<PhoneNumber, ValidationError> {
        if !self.is_complete() {
            return Err(ValidationError::IncompletePhoneNumber);
        }
        Ok(PhoneNumber(self.digits.clone()))
    }
}

impl OtpCandidate {
    /// Freeze into an [`OtpCode`]. Fails unless exactly 6 digits are held.
    pub fn to_otp_code(&self) -> Result<OtpCode, ValidationError> {
        if !self.is_complete() {
            return Err(ValidationError::IncompleteOtp);
        }
        Ok(OtpCode(self.digits.clone()))
    }
}

/// Split raw digits as `first five` + space + `rest`.
///
/// Input of five digits or fewer is returned verbatim. Takes raw digits, not
/// its own output.
pub fn format_phone_number(digits: &str) -> String {
    if digits.len() <= PHONE_GROUP {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(PHONE_GROUP);
    format!("{} {}", head, tail)
}

fn all_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// A complete 10-digit national phone number, without country prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `+<country><number>` for backends that want E.164.
    pub fn e164(&self, country_prefix: &str) -> String {
        let prefix = country_prefix.trim().trim_start_matches('+');
        format!("+{}{}", prefix, self.0)
    }

    /// Human form with prefix, e.g. `+91 9876543210`.
    pub fn display_with_prefix(&self, country_prefix: &str) -> String {
        format!("{} {}", country_prefix.trim(), self.0)
    }

    /// Masked form for logs: only the last four digits survive.
    pub fn redacted(&self) -> String {
        let visible = PHONE_DIGITS - 4;
        format!("{}{}", "*".repeat(visible), &self.0[visible..])
    }
}

impl FromStr for PhoneNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !all_digits(s, PHONE_DIGITS) {
            return Err(ValidationError::InvalidPhoneNumber);
        }
        Ok(PhoneNumber(s.to_string()))
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete 6-digit one-time code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

impl OtpCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// For compile-time constants known to be six digits.
    pub(crate) fn from_static(code: &'static str) -> Self {
        debug_assert!(all_digits(code, OTP_DIGITS));
        OtpCode(code.to_string())
    }
}

impl FromStr for OtpCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !all_digits(s, OTP_DIGITS) {
            return Err(ValidationError::InvalidOtpCode);
        }
        Ok(OtpCode(s.to_string()))
    }
}

impl TryFrom<String> for OtpCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OtpCode> for String {
    fn from(value: OtpCode) -> Self {
        value.0
    }
}

// Codes stay out of logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_candidate_clamps_at_ten() {
        let mut candidate = PhoneCandidate::new();
        for d in "98765432109876".chars() {
            candidate.push(d);
        }
        assert_eq!(candidate.len(), 10);
        assert_eq!(candidate.as_str(), "9876543210");
        assert!(!candidate.push('1'), "push on full candidate is a no-op");
    }

    #[test]
    fn test_otp_candidate_clamps_at_six() {
        let mut candidate = OtpCandidate::new();
        for _ in 0..20 {
            candidate.push('7');
        }
        assert_eq!(candidate.as_str(), "777777");
    }

    #[test]
    fn test_non_digits_are_rejected() {
        let mut candidate = PhoneCandidate::new();
        assert!(!candidate.push('a'));
        assert!(!candidate.push('+'));
        assert!(!candidate.push('٣'), "non-ASCII digits are rejected");
        assert!(candidate.is_empty());
    }

    #[test]
    fn test_backspace_on_empty_is_idempotent() {
        let mut candidate = PhoneCandidate::new();
        assert!(!candidate.pop());
        assert!(!candidate.pop());
        assert!(candidate.is_empty());

        candidate.push('4');
        assert!(candidate.pop());
        assert!(candidate.is_empty());
    }

    #[test]
    fn test_format_short_input_is_verbatim() {
        assert_eq!(format_phone_number(""), "");
        assert_eq!(format_phone_number("9"), "9");
        assert_eq!(format_phone_number("98765"), "98765");
    }

    #[test]
    fn test_format_splits_after_five() {
        assert_eq!(format_phone_number("987654"), "98765 4");
        assert_eq!(format_phone_number("9876543"), "98765 43");
        assert_eq!(format_phone_number("9876543210"), "98765 43210");
    }

    #[test]
    fn test_candidate_format_uses_current_digits() {
        let mut candidate = PhoneCandidate::new();
        "9876543".chars().for_each(|d| {
            candidate.push(d);
        });
        assert_eq!(candidate.format(), "98765 43");
    }

    #[test]
    fn test_freeze_requires_complete_candidate() {
        let mut candidate = PhoneCandidate::new();
        "987654321".chars().for_each(|d| {
            candidate.push(d);
        });
        assert_eq!(
            candidate.to_phone_number(),
            Err(ValidationError::IncompletePhoneNumber)
        );
        candidate.push('0');
        assert_eq!(candidate.to_phone_number().unwrap().as_str(), "9876543210");
    }

    #[test]
    fn test_otp_slots_pad_with_none() {
        let mut candidate = OtpCandidate::new();
        candidate.push('1');
        candidate.push('2');
        let slots: Vec<_> = candidate.slots().collect();
        assert_eq!(slots, vec![Some('1'), Some('2'), None, None, None, None]);
    }

    #[test]
    fn test_phone_number_parse() {
        assert!("9876543210".parse::<PhoneNumber>().is_ok());
        assert_eq!(
            "98765".parse::<PhoneNumber>(),
            Err(ValidationError::InvalidPhoneNumber)
        );
        assert_eq!(
            "98765x3210".parse::<PhoneNumber>(),
            Err(ValidationError::InvalidPhoneNumber)
        );
    }

    #[test]
    fn test_phone_number_renderings() {
        let phone: PhoneNumber = "9876543210".parse().unwrap();
        assert_eq!(phone.e164("+91"), "+919876543210");
        assert_eq!(phone.e164("91"), "+919876543210");
        assert_eq!(phone.display_with_prefix("+91"), "+91 9876543210");
        assert_eq!(phone.redacted(), "******3210");
    }

    #[test]
    fn test_otp_code_debug_is_masked() {
        let code: OtpCode = "123456".parse().unwrap();
        assert!(!format!("{:?}", code).contains("123456"));
        assert_eq!(code.as_str(), "123456");
    }

    #[test]
    fn test_phone_number_serde_validates() {
        let phone: PhoneNumber = serde_json::from_str("\"9876543210\"").unwrap();
        assert_eq!(phone.as_str(), "9876543210");
        assert!(serde_json::from_str::<PhoneNumber>("\"123\"").is_err());
    }
}
