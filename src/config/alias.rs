use regex::Regex;
use serde::Deserialize;

/// Characters aliases are drawn from unless configured otherwise
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Widest alias the store accepts
pub const MAX_ALIAS_LENGTH: usize = 64;

/// Alias generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AliasConfig {
    /// Minimum length of a newly generated alias
    pub min_len: usize,

    /// Maximum length of a newly generated alias
    pub max_len: usize,

    /// Characters a generated alias may contain (homoglyphs are folded)
    pub alphabet: String,

    /// Maximum number of candidates tried before giving up
    pub max_attempts: u32,

    /// Collisions in a single allocation above which a warning is logged
    pub conflict_warn_limit: u32,
}

impl AliasConfig {
    /// Validate alias configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.min_len == 0 || self.min_len > self.max_len {
            return Err(format!(
                "ALIAS_MIN_LEN and ALIAS_MAX_LEN must satisfy 0 < min <= max, got {} and {}",
                self.min_len, self.max_len
            ));
        }

        if self.max_len > MAX_ALIAS_LENGTH {
            return Err(format!("ALIAS_MAX_LEN must be at most {}", MAX_ALIAS_LENGTH));
        }

        let allowed = Regex::new(r"^[A-Za-z0-9_-]+$").map_err(|e| e.to_string())?;
        if !allowed.is_match(&self.alphabet) {
            return Err(
                "ALIAS_ALPHABET may only contain letters, digits, underscores and hyphens"
                    .to_string(),
            );
        }

        if self.max_attempts < 1 || self.max_attempts > 100 {
            return Err("ALIAS_MAX_ATTEMPTS must be between 1 and 100".to_string());
        }

        Ok(())
    }
}
