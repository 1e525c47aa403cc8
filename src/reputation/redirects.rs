//! Redirect-aware classification.
//!
//! A short link to a clean page that redirects to a blacklisted one is as
//! harmful as a direct link, so every address reached by following the
//! target's redirects is classified too.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info};

use super::{Classification, ReputationChecker, ReputationError};
use crate::error::{AppError, AppResult};
use crate::target::TargetUrl;

/// Follows `Location` headers one hop at a time.
///
/// Resolution stops at the first non-redirect answer, at an unreachable or
/// malformed hop, at a loop, after `max_hops` hops or when the time budget
/// runs out. The hops collected up to that point are returned.
pub struct RedirectResolver {
    http_client: reqwest::Client,
    max_hops: usize,
    budget: Duration,
}

impl RedirectResolver {
    pub fn new(max_hops: usize, budget: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            // Hops are fetched directly, never through a configured proxy
            .no_proxy()
            .timeout(budget)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create redirect client: {}", e))
            })?;

        Ok(Self {
            http_client,
            max_hops,
            budget,
        })
    }

    /// Addresses reached from `url`, in order, not including `url` itself
    pub async fn resolve(&self, url: &TargetUrl) -> Vec<TargetUrl> {
        let deadline = Instant::now() + self.budget;
        let mut hops: Vec<TargetUrl> = Vec::new();
        let mut current = url.clone();

        while hops.len() < self.max_hops {
            let response =
                match timeout_at(deadline, self.http_client.head(current.as_str()).send()).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => {
                        debug!(url = %current, error = %e, "Redirect hop unreachable");
                        break;
                    }
                    Err(_) => {
                        debug!(url = %current, "Redirect resolution budget exhausted");
                        break;
                    }
                };

            if !response.status().is_redirection() {
                break;
            }

            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
            else {
                break;
            };

            let next = match current.join(location) {
                Ok(next) => next,
                Err(e) => {
                    debug!(url = %current, location, error = %e, "Ignoring redirect target");
                    break;
                }
            };

            if next == *url || hops.contains(&next) {
                debug!(url = %next, "Redirect loop");
                break;
            }

            hops.push(next.clone());
            current = next;
        }

        hops
    }
}

/// Classifies a URL and every address it redirects to.
///
/// The submitted URL is classified first, so known-bad targets are refused
/// without contacting them. The first non-clean verdict wins and an error on
/// any address fails the check.
pub struct RedirectFollowingChecker {
    inner: Arc<dyn ReputationChecker>,
    resolver: RedirectResolver,
}

impl RedirectFollowingChecker {
    pub fn new(inner: Arc<dyn ReputationChecker>, resolver: RedirectResolver) -> Self {
        Self { inner, resolver }
    }
}

#[async_trait]
impl ReputationChecker for RedirectFollowingChecker {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError> {
        let classification = self.inner.classify(url).await?;
        if !classification.verdict.is_clean() {
            return Ok(classification);
        }

        for hop in self.resolver.resolve(url).await {
            let hop_classification = self.inner.classify(&hop).await?;
            if !hop_classification.verdict.is_clean() {
                info!(
                    url = %url,
                    redirect = %hop,
                    source = %hop_classification.source,
                    "Redirect target is not clean"
                );
                return Ok(hop_classification);
            }
        }

        Ok(classification)
    }
}
