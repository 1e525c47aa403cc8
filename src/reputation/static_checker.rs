use async_trait::async_trait;
use parking_lot::RwLock;
use std::time::Duration;

use super::{Classification, ReputationChecker, ReputationError, Verdict};
use crate::target::TargetUrl;

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Verdict(Verdict),
    Failure,
}

/// Checker with a fixed, switchable outcome.
///
/// Used as a deterministic stand-in for the remote services in tests and
/// local runs.
pub struct StaticChecker {
    outcome: RwLock<Outcome>,
    delay: Option<Duration>,
}

impl StaticChecker {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            outcome: RwLock::new(Outcome::Verdict(verdict)),
            delay: None,
        }
    }

    /// A checker whose every call fails
    pub fn failing() -> Self {
        Self {
            outcome: RwLock::new(Outcome::Failure),
            delay: None,
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_verdict(&self, verdict: Verdict) {
        *self.outcome.write() = Outcome::Verdict(verdict);
    }

    pub fn set_failing(&self) {
        *self.outcome.write() = Outcome::Failure;
    }
}

#[async_trait]
impl ReputationChecker for StaticChecker {
    fn name(&self) -> &str {
        "static checker"
    }

    async fn classify(&self, _url: &TargetUrl) -> Result<Classification, ReputationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = *self.outcome.read();
        match outcome {
            Outcome::Verdict(verdict) => Ok(Classification::new(verdict, self.name())),
            Outcome::Failure => Err(ReputationError::Transport {
                checker: self.name().to_string(),
                reason: "configured to fail".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_switching_outcome() {
        let checker = StaticChecker::new(Verdict::Clean);
        let url = TargetUrl::parse("https://example.com/").unwrap();

        assert_eq!(checker.classify(&url).await.unwrap().verdict, Verdict::Clean);

        checker.set_verdict(Verdict::Spam);
        assert_eq!(checker.classify(&url).await.unwrap().verdict, Verdict::Spam);

        checker.set_failing();
        assert!(checker.classify(&url).await.is_err());
    }
}
