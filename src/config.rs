use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

mod alias;
mod cache;
mod cors;
mod database;
mod rate_limit;
mod reputation;
mod server;

pub use alias::{AliasConfig, DEFAULT_ALPHABET, MAX_ALIAS_LENGTH};
pub use cache::CacheConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use rate_limit::RateLimitConfig;
pub use reputation::ReputationConfig;
pub use server::ServerConfig;

use crate::reputation::safe_browsing::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub alias: AliasConfig,
    pub reputation: ReputationConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        None => Ok(default),
    }
}

/// Comma-separated list; blank entries are skipped
fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            base_url: String::new(),
        };
        server.base_url = lookup("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| server.derived_base_url());

        let store_uri = lookup("STORE_URI")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or_else(|| AppError::MissingEnvVar("STORE_URI".to_string()))?;

        let allowed_origins_str = lookup("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());
        let allowed_origins: Vec<String> = if allowed_origins_str.trim() == "*" {
            vec!["*".to_string()]
        } else {
            parse_list(Some(allowed_origins_str))
        };

        let config = Config {
            server,
            database: DatabaseConfig {
                url: store_uri,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?,
                acquire_timeout_seconds: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", 30)?,
            },
            alias: AliasConfig {
                min_len: parse_or(&lookup, "ALIAS_MIN_LEN", 4)?,
                max_len: parse_or(&lookup, "ALIAS_MAX_LEN", 6)?,
                alphabet: lookup("ALIAS_ALPHABET").unwrap_or_else(|| DEFAULT_ALPHABET.to_string()),
                max_attempts: parse_or(&lookup, "ALIAS_MAX_ATTEMPTS", 10)?,
                conflict_warn_limit: parse_or(&lookup, "ALIAS_CONFLICT_WARN_LIMIT", 3)?,
            },
            reputation: ReputationConfig {
                api_key: lookup("REPUTATION_API_KEY").filter(|key| !key.trim().is_empty()),
                endpoint: lookup("REPUTATION_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                timeout_ms: parse_or(&lookup, "REPUTATION_TIMEOUT_MS", 3000)?,
                blacklisted_hosts: parse_list(lookup("BLACKLISTED_HOSTS")),
                whitelisted_hosts: parse_list(lookup("WHITELISTED_HOSTS")),
                dnsbl_enabled: parse_or(&lookup, "DNSBL_ENABLED", true)?,
                redirect_max_hops: parse_or(&lookup, "REDIRECT_MAX_HOPS", 5)?,
                redirect_timeout_ms: parse_or(&lookup, "REDIRECT_TIMEOUT_MS", 1500)?,
            },
            cache: CacheConfig {
                enabled: parse_or(&lookup, "CACHE_ENABLED", true)?,
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
                max_connections: parse_or(&lookup, "CACHE_MAX_CONNECTIONS", 10)?,
                default_ttl_seconds: parse_or(&lookup, "CACHE_DEFAULT_TTL_SECONDS", 3600)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", 10)?,
                burst_size: parse_or(&lookup, "RATE_LIMIT_BURST", 5)?,
            },
            cors: CorsConfig { allowed_origins },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.database
            .validate()
            .and_then(|_| self.alias.validate())
            .and_then(|_| self.reputation.validate())
            .and_then(|_| self.cache.validate())
            .and_then(|_| self.rate_limit.validate())
            .map_err(AppError::Configuration)
    }
}
