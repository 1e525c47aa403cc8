use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Upper bound for `REDIRECT_MAX_HOPS`
pub const MAX_REDIRECT_HOPS: usize = 20;

/// Reputation checking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReputationConfig {
    /// Safe Browsing API key; lookups are disabled without one
    pub api_key: Option<String>,

    /// Safe Browsing `threatMatches:find` endpoint
    pub endpoint: String,

    /// Upper bound for a single reputation check in milliseconds
    pub timeout_ms: u64,

    /// Hosts always classified as blacklisted
    pub blacklisted_hosts: Vec<String>,

    /// Hosts always classified as clean
    pub whitelisted_hosts: Vec<String>,

    /// Query the SURBL and Spamhaus DNS blocklists
    pub dnsbl_enabled: bool,

    /// Redirects followed from a target; 0 checks the target alone
    pub redirect_max_hops: usize,

    /// Time allowed for following all redirects of one target in milliseconds
    pub redirect_timeout_ms: u64,
}

impl ReputationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_millis(self.redirect_timeout_ms)
    }

    /// Validate reputation configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("REPUTATION_TIMEOUT_MS must be greater than 0".to_string());
        }

        if self.redirect_max_hops > MAX_REDIRECT_HOPS {
            return Err(format!(
                "REDIRECT_MAX_HOPS must be at most {}",
                MAX_REDIRECT_HOPS
            ));
        }

        if self.redirect_max_hops > 0
            && (self.redirect_timeout_ms == 0 || self.redirect_timeout_ms >= self.timeout_ms)
        {
            return Err(
                "REDIRECT_TIMEOUT_MS must be greater than 0 and less than REPUTATION_TIMEOUT_MS"
                    .to_string(),
            );
        }

        if self.api_key.is_some() {
            Url::parse(&self.endpoint)
                .map_err(|e| format!("REPUTATION_ENDPOINT is not a valid URL: {}", e))?;
        }

        Ok(())
    }
}
