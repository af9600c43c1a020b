use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::candidate::OtpCode;
use crate::gateway::{DEFAULT_SIMULATED_CODE, DEFAULT_SIMULATED_LATENCY};
use crate::machine::FlowPolicy;

pub const DEFAULT_COUNTRY_PREFIX: &str = "+91";

/// Flow configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub country_prefix: String,
    pub reset_terms_on_edit: bool,
    /// None keeps boundary calls unbounded.
    pub boundary_timeout: Option<Duration>,
    pub simulated_latency: Duration,
    pub simulated_code: OtpCode,
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            country_prefix: DEFAULT_COUNTRY_PREFIX.to_string(),
            reset_terms_on_edit: true,
            boundary_timeout: None,
            simulated_latency: DEFAULT_SIMULATED_LATENCY,
            simulated_code: OtpCode::from_static(DEFAULT_SIMULATED_CODE),
            twilio: None,
        }
    }
}

impl FlowConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let boundary_timeout = match lookup("OTP_BOUNDARY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .context("OTP_BOUNDARY_TIMEOUT_SECS must be a whole number of seconds")?;
                if secs == 0 {
                    anyhow::bail!(
                        "OTP_BOUNDARY_TIMEOUT_SECS must be at least 1; unset it to disable the timeout"
                    );
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let simulated_latency = match lookup("OTP_SIMULATED_LATENCY_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .context("OTP_SIMULATED_LATENCY_MS must be a number")?,
            ),
            None => defaults.simulated_latency,
        };

        let simulated_code = match lookup("OTP_SIMULATED_CODE") {
            Some(raw) => raw
                .trim()
                .parse::<OtpCode>()
                .context("OTP_SIMULATED_CODE must be 6 digits")?,
            None => defaults.simulated_code,
        };

        let reset_terms_on_edit = match lookup("OTP_RESET_TERMS_ON_EDIT") {
            Some(raw) => parse_bool(&raw).context("OTP_RESET_TERMS_ON_EDIT must be true or false")?,
            None => defaults.reset_terms_on_edit,
        };

        let twilio = match (
            lookup("TWILIO_ACCOUNT_SID"),
            lookup("TWILIO_AUTH_TOKEN"),
            lookup("TWILIO_VERIFY_SERVICE_SID"),
        ) {
            (Some(account_sid), Some(auth_token), Some(verify_service_sid)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                verify_service_sid,
            }),
            _ => None,
        };

        Ok(Self {
            country_prefix: lookup("OTP_COUNTRY_PREFIX")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.country_prefix),
            reset_terms_on_edit,
            boundary_timeout,
            simulated_latency,
            simulated_code,
            twilio,
        })
    }

    pub fn policy(&self) -> FlowPolicy {
        FlowPolicy {
            reset_terms_on_edit: self.reset_terms_on_edit,
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = FlowConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.country_prefix, "+91");
        assert!(config.reset_terms_on_edit);
        assert_eq!(config.boundary_timeout, None);
        assert_eq!(config.simulated_latency, Duration::from_millis(1500));
        assert_eq!(config.simulated_code.as_str(), "123456");
        assert!(config.twilio.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = FlowConfig::from_lookup(lookup_from(&[
            ("OTP_COUNTRY_PREFIX", "+1"),
            ("OTP_RESET_TERMS_ON_EDIT", "false"),
            ("OTP_BOUNDARY_TIMEOUT_SECS", "30"),
            ("OTP_SIMULATED_LATENCY_MS", "0"),
            ("OTP_SIMULATED_CODE", "654321"),
        ]))
        .unwrap();
        assert_eq!(config.country_prefix, "+1");
        assert!(!config.policy().reset_terms_on_edit);
        assert_eq!(config.boundary_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.simulated_latency, Duration::ZERO);
        assert_eq!(config.simulated_code.as_str(), "654321");
    }

    #[test]
    fn test_twilio_needs_all_three_keys() {
        let partial = FlowConfig::from_lookup(lookup_from(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
        ]))
        .unwrap();
        assert!(partial.twilio.is_none());

        let full = FlowConfig::from_lookup(lookup_from(&[
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "secret"),
            ("TWILIO_VERIFY_SERVICE_SID", "VA456"),
        ]))
        .unwrap();
        assert_eq!(full.twilio.unwrap().verify_service_sid, "VA456");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = FlowConfig::from_lookup(lookup_from(&[("OTP_BOUNDARY_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"), "{}", err);

        let one = FlowConfig::from_lookup(lookup_from(&[("OTP_BOUNDARY_TIMEOUT_SECS", "1")]))
            .unwrap();
        assert_eq!(one.boundary_timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(FlowConfig::from_lookup(lookup_from(&[("OTP_SIMULATED_CODE", "12")])).is_err());
        assert!(
            FlowConfig::from_lookup(lookup_from(&[("OTP_BOUNDARY_TIMEOUT_SECS", "soon")])).is_err()
        );
        assert!(
            FlowConfig::from_lookup(lookup_from(&[("OTP_RESET_TERMS_ON_EDIT", "maybe")])).is_err()
        );
    }
}
