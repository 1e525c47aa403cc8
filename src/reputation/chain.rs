use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Classification, HostList, ReputationChecker, ReputationError, Verdict};
use crate::target::TargetUrl;

/// Runs checkers in order; the first non-clean verdict wins.
///
/// Hosts on the whitelist are clean without consulting any checker. An error
/// from any checker fails the chain.
#[derive(Default)]
pub struct CheckerChain {
    whitelist: Option<HostList>,
    checkers: Vec<Arc<dyn ReputationChecker>>,
}

impl CheckerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whitelist(mut self, whitelist: HostList) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// Append a checker to the end of the chain
    pub fn with_checker(mut self, checker: Arc<dyn ReputationChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

#[async_trait]
impl ReputationChecker for CheckerChain {
    fn name(&self) -> &str {
        "checker chain"
    }

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError> {
        if let Some(whitelist) = &self.whitelist {
            if whitelist.contains(url.host()) {
                debug!(host = %url.host(), "Host is whitelisted");
                return Ok(Classification::new(Verdict::Clean, whitelist.name()));
            }
        }

        for checker in &self.checkers {
            let classification = checker.classify(url).await?;
            if !classification.verdict.is_clean() {
                return Ok(classification);
            }
        }

        Ok(Classification::new(Verdict::Clean, self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::StaticChecker;

    fn url(s: &str) -> TargetUrl {
        TargetUrl::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_empty_chain_is_clean() {
        let chain = CheckerChain::new();
        let result = chain.classify(&url("https://example.com/")).await.unwrap();
        assert_eq!(result.verdict, Verdict::Clean);
    }

    #[tokio::test]
    async fn test_first_non_clean_verdict_wins() {
        let chain = CheckerChain::new()
            .with_checker(Arc::new(StaticChecker::new(Verdict::Clean)))
            .with_checker(Arc::new(StaticChecker::new(Verdict::Spam)))
            .with_checker(Arc::new(StaticChecker::new(Verdict::Blacklisted)));

        let result = chain.classify(&url("https://example.com/")).await.unwrap();
        assert_eq!(result.verdict, Verdict::Spam);
    }

    #[tokio::test]
    async fn test_error_is_not_clean() {
        let chain = CheckerChain::new()
            .with_checker(Arc::new(StaticChecker::failing()))
            .with_checker(Arc::new(StaticChecker::new(Verdict::Clean)));

        assert!(chain.classify(&url("https://example.com/")).await.is_err());
    }

    #[tokio::test]
    async fn test_whitelist_short_circuits() {
        let chain = CheckerChain::new()
            .with_whitelist(HostList::new("whitelist", &["trusted.example"]))
            .with_checker(Arc::new(StaticChecker::failing()));

        let result = chain
            .classify(&url("https://docs.trusted.example/page"))
            .await
            .unwrap();
        assert_eq!(result.verdict, Verdict::Clean);
        assert!(chain.classify(&url("https://other.example/")).await.is_err());
    }
}
