use crate::error::{AppError, AppResult};
use std::fmt;
use url::Url;

/// Longest target URL accepted, matching the stored column width
pub const MAX_TARGET_LENGTH: usize = 2083;

/// A well-formed, normalized target URL.
///
/// Normalization lowercases the scheme and host, drops default ports,
/// turns an empty path into `/` and removes the fragment. Two inputs that
/// normalize to the same string are the same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetUrl(Url);

impl TargetUrl {
    pub fn parse(input: &str) -> AppResult<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(AppError::InvalidUrl("A target URL is required".to_string()));
        }

        let mut url = Url::parse(input)
            .map_err(|e| AppError::InvalidUrl(format!("A valid URL is required: {}", e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(AppError::InvalidUrl("URL must contain a host".to_string()));
        }

        url.set_fragment(None);

        if url.as_str().len() > MAX_TARGET_LENGTH {
            return Err(AppError::InvalidUrl(format!(
                "URL must not be longer than {} characters",
                MAX_TARGET_LENGTH
            )));
        }

        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Host without a trailing dot
    pub fn host(&self) -> &str {
        self.0
            .host_str()
            .map(|h| h.trim_end_matches('.'))
            .unwrap_or_default()
    }

    /// Resolve a possibly relative reference, such as a `Location` header
    pub fn join(&self, reference: &str) -> AppResult<Self> {
        let joined = self
            .0
            .join(reference.trim())
            .map_err(|e| AppError::InvalidUrl(format!("A valid URL is required: {}", e)))?;
        Self::parse(joined.as_str())
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
