use serde::Deserialize;

/// Upper bound for `RATE_LIMIT_BURST`; the lenient limiter doubles it
pub const MAX_BURST_SIZE: u32 = 10_000;

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests per minute
    pub requests_per_minute: u64,

    /// Maximum burst size for rate limiting
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// Validate rate limiting configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_minute == 0 || self.requests_per_minute > 30_000 {
            return Err("RATE_LIMIT_PER_MINUTE must be between 1 and 30000".to_string());
        }

        if self.burst_size == 0 || self.burst_size > MAX_BURST_SIZE {
            return Err(format!(
                "RATE_LIMIT_BURST must be between 1 and {}",
                MAX_BURST_SIZE
            ));
        }

        Ok(())
    }

    /// Replenish interval for the strict limiter
    pub fn strict_period_ms(&self) -> u64 {
        60_000 / self.requests_per_minute
    }

    /// Replenish interval for the lenient limiter, twice as fast
    pub fn lenient_period_ms(&self) -> u64 {
        60_000 / (self.requests_per_minute * 2)
    }

    /// Burst allowance for the lenient limiter
    pub fn lenient_burst_size(&self) -> u32 {
        self.burst_size.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(requests_per_minute: u64, burst_size: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_minute,
            burst_size,
        }
    }

    #[test]
    fn test_burst_bounds() {
        assert!(config(10, MAX_BURST_SIZE).validate().is_ok());
        assert!(config(10, MAX_BURST_SIZE + 1).validate().is_err());
        assert!(config(10, 0).validate().is_err());
    }

    #[test]
    fn test_lenient_burst_does_not_overflow() {
        assert_eq!(config(10, 5).lenient_burst_size(), 10);
        assert_eq!(config(10, u32::MAX).lenient_burst_size(), u32::MAX);
    }
}
