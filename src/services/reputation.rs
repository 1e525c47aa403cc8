use crate::error::{AppError, AppResult};
use crate::reputation::{Classification, ReputationChecker, Verdict};
use crate::target::TargetUrl;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Message returned when a URL is refused at registration
pub const REJECTION_MESSAGE: &str = "The URL has been recognized as spam.";

/// Message returned when a URL's host is on the configured blacklist
pub const BLACKLIST_REJECTION_MESSAGE: &str = "The URL's host has been blacklisted.";

/// Warning shown on the preview of a flagged URL
pub const PREVIEW_WARNING: &str =
    "This URL has been recognized as spam or is blacklisted. Proceed with caution.";

/// Applies reputation checks with a bounded wait.
///
/// A checker error or timeout becomes `AppError::ReputationCheckFailed`;
/// it is never read as a clean verdict.
#[derive(Clone)]
pub struct ReputationGuard {
    checker: Arc<dyn ReputationChecker>,
    timeout: Duration,
    messages: HashMap<String, String>,
}

impl ReputationGuard {
    pub fn new(checker: Arc<dyn ReputationChecker>, timeout: Duration) -> Self {
        Self {
            checker,
            timeout,
            messages: HashMap::new(),
        }
    }

    /// Use `message` when the checker named `source` refuses a registration
    pub fn with_message(mut self, source: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(source.into(), message.into());
        self
    }

    fn rejection_message(&self, source: &str) -> String {
        self.messages
            .get(source)
            .cloned()
            .unwrap_or_else(|| REJECTION_MESSAGE.to_string())
    }

    /// Classify `url`, failing on error or timeout
    pub async fn classify(&self, url: &TargetUrl) -> AppResult<Classification> {
        match tokio::time::timeout(self.timeout, self.checker.classify(url)).await {
            Ok(Ok(classification)) => Ok(classification),
            Ok(Err(e)) => Err(AppError::ReputationCheckFailed(e.to_string())),
            Err(_) => Err(AppError::ReputationCheckFailed(format!(
                "{} did not answer within {} ms",
                self.checker.name(),
                self.timeout.as_millis()
            ))),
        }
    }

    /// Gate a registration: only clean URLs may be shortened
    pub async fn check_for_registration(&self, url: &TargetUrl) -> AppResult<()> {
        let classification = self.classify(url).await?;

        if classification.verdict.is_clean() {
            return Ok(());
        }

        info!(
            url = %url,
            verdict = ?classification.verdict,
            source = %classification.source,
            "Registration refused"
        );
        Err(AppError::UrlRejected(
            self.rejection_message(&classification.source),
        ))
    }

    /// Classify a registered target at preview time.
    ///
    /// Always asks the checker again; a URL that was clean when it was
    /// registered may be listed since.
    pub async fn check_reputation_for_preview(&self, url: &TargetUrl) -> AppResult<Verdict> {
        let classification = self.classify(url).await?;

        if !classification.verdict.is_clean() {
            warn!(
                url = %url,
                verdict = ?classification.verdict,
                source = %classification.source,
                "Previewed URL is flagged"
            );
        }

        Ok(classification.verdict)
    }
}
