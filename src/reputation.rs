//! URL reputation checking.
//!
//! A [`ReputationChecker`] classifies a target URL as clean, spam or
//! blacklisted. Concrete checkers are combined into a [`CheckerChain`]; a
//! failing checker fails the whole chain, an unverifiable URL is never
//! treated as clean. [`RedirectFollowingChecker`] runs the chain on every
//! address the target redirects to.

pub mod chain;
pub mod dnsbl;
pub mod host_list;
pub mod redirects;
pub mod safe_browsing;
pub mod static_checker;

use crate::config::ReputationConfig;
use crate::error::AppResult;
use crate::target::TargetUrl;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub use chain::CheckerChain;
pub use dnsbl::{DnsblChecker, SystemDnsLookup};
pub use host_list::{HostList, HostListChecker};
pub use redirects::{RedirectFollowingChecker, RedirectResolver};
pub use safe_browsing::SafeBrowsingChecker;
pub use static_checker::StaticChecker;

/// Name of the host list built from `BLACKLISTED_HOSTS`
pub const BLACKLIST_NAME: &str = "custom host blacklist";

/// Name of the host list built from `WHITELISTED_HOSTS`
pub const WHITELIST_NAME: &str = "custom host whitelist";

/// Classification of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Clean,
    Spam,
    Blacklisted,
}

impl Verdict {
    pub fn is_clean(self) -> bool {
        self == Verdict::Clean
    }
}

/// A verdict together with the checker that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub source: String,
}

impl Classification {
    pub fn new(verdict: Verdict, source: impl Into<String>) -> Self {
        Self {
            verdict,
            source: source.into(),
        }
    }
}

/// Failure to obtain a verdict
#[derive(Error, Debug)]
pub enum ReputationError {
    #[error("request to {checker} failed: {reason}")]
    Transport { checker: String, reason: String },

    #[error("{checker} answered with status {status}: {body}")]
    Upstream {
        checker: String,
        status: u16,
        body: String,
    },

    #[error("{checker} sent an unreadable response: {reason}")]
    InvalidResponse { checker: String, reason: String },
}

/// Capability of classifying a URL.
#[async_trait]
pub trait ReputationChecker: Send + Sync {
    /// Name used in logs and in classifications
    fn name(&self) -> &str;

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError>;
}

/// Build the checker chain described by the configuration.
pub fn build_checker(config: &ReputationConfig) -> AppResult<Arc<dyn ReputationChecker>> {
    let whitelist = HostList::new(WHITELIST_NAME, config.whitelisted_hosts.as_slice());
    info!(
        "{} loaded. The number of elements it contains is: {}",
        whitelist.name(),
        whitelist.len()
    );

    let blacklist = HostList::new(BLACKLIST_NAME, config.blacklisted_hosts.as_slice());
    info!(
        "{} loaded. The number of elements it contains is: {}",
        blacklist.name(),
        blacklist.len()
    );

    let mut chain = CheckerChain::new()
        .with_whitelist(whitelist)
        .with_checker(Arc::new(HostListChecker::new(blacklist)));

    match &config.api_key {
        Some(api_key) => {
            let checker = SafeBrowsingChecker::new(
                &config.endpoint,
                api_key,
                config.timeout(),
            )?;
            chain = chain.with_checker(Arc::new(checker));
            info!("Google Safe Browsing API client loaded.");
        }
        None => {
            warn!("REPUTATION_API_KEY is not set, Safe Browsing lookups are disabled");
        }
    }

    if config.dnsbl_enabled {
        let lookup = Arc::new(SystemDnsLookup::new()?);
        for blocklist in dnsbl::DEFAULT_BLOCKLISTS {
            chain = chain.with_checker(Arc::new(DnsblChecker::new(blocklist, lookup.clone())));
            info!("{} DNS blocklist client loaded.", blocklist.name);
        }
    }

    info!("Reputation chain has {} checkers", chain.len());

    if config.redirect_max_hops == 0 {
        return Ok(Arc::new(chain));
    }

    let resolver = RedirectResolver::new(config.redirect_max_hops, config.redirect_timeout())?;
    info!(
        "Redirect addresses are checked too, up to {} hops",
        config.redirect_max_hops
    );

    Ok(Arc::new(RedirectFollowingChecker::new(
        Arc::new(chain),
        resolver,
    )))
}
