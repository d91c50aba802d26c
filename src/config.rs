//! Runtime configuration, read once at startup and handed to the clients.

use std::time::Duration;

use crate::sources::PricingError;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Bearer token sent to both upstream APIs
    pub api_token: String,
    pub cert_api_url: String,
    pub transactions_api_url: String,
    pub bind_address: String,
    /// No timeout is applied when unset
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    /// Reads the configuration from the process environment
    ///
    /// `.env` has to be loaded by the caller beforehand.
    pub fn from_env() -> Result<Self, PricingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PricingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_token = get("API_TOKEN")
            .ok_or_else(|| PricingError::InvalidConfig("API_TOKEN not set".to_owned()))?;
        let cert_api_url = get("CERT_API_URL")
            .ok_or_else(|| PricingError::InvalidConfig("CERT_API_URL not set".to_owned()))?;
        let transactions_api_url =
            get("TRANSACTIONS_API_URL").unwrap_or_else(|| cert_api_url.clone());
        let bind_address =
            get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned());

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(PricingError::InvalidConfig(format!(
                        "UPSTREAM_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    )))
                }
            },
            None => None,
        };

        Ok(Self {
            api_token,
            cert_api_url,
            transactions_api_url,
            bind_address,
            upstream_timeout,
        })
    }
}
