//! DNS blocklist (DNSBL) lookups.
//!
//! A host is listed when `<host>.<zone>` (or the reversed IPv4 octets for
//! address lists) resolves to an address in `127.0.0.0/8`. A name that does
//! not exist is not listed.

use async_trait::async_trait;
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

use super::{Classification, ReputationChecker, ReputationError, Verdict};
use crate::error::{AppError, AppResult};
use crate::target::TargetUrl;

/// Kinds of host a blocklist zone lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListedHosts {
    Domains,
    Addresses,
    Both,
}

impl ListedHosts {
    fn domains(self) -> bool {
        matches!(self, ListedHosts::Domains | ListedHosts::Both)
    }

    fn addresses(self) -> bool {
        matches!(self, ListedHosts::Addresses | ListedHosts::Both)
    }
}

/// A DNS blocklist zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocklist {
    pub name: &'static str,
    pub zone: &'static str,
    pub listed: ListedHosts,
}

pub const SURBL_MULTI: Blocklist = Blocklist {
    name: "SURBL multi",
    zone: "multi.surbl.org",
    listed: ListedHosts::Both,
};

pub const SPAMHAUS_ZEN: Blocklist = Blocklist {
    name: "Spamhaus ZEN",
    zone: "zen.spamhaus.org",
    listed: ListedHosts::Addresses,
};

pub const SPAMHAUS_DBL: Blocklist = Blocklist {
    name: "Spamhaus DBL",
    zone: "dbl.spamhaus.org",
    listed: ListedHosts::Domains,
};

/// Zones consulted when DNSBL checking is enabled, in order
pub const DEFAULT_BLOCKLISTS: [Blocklist; 3] = [SURBL_MULTI, SPAMHAUS_ZEN, SPAMHAUS_DBL];

/// IPv4 resolution used by [`DnsblChecker`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// A records of a fully qualified name; empty when the name does not exist
    async fn lookup_ipv4(&self, name: &str) -> Result<Vec<Ipv4Addr>, String>;
}

/// [`DnsLookup`] backed by the system resolver configuration
pub struct SystemDnsLookup {
    resolver: TokioAsyncResolver,
}

impl SystemDnsLookup {
    pub fn new() -> AppResult<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| {
            AppError::Configuration(format!("Failed to create DNS resolver: {}", e))
        })?;

        Ok(Self { resolver })
    }
}

#[async_trait]
impl DnsLookup for SystemDnsLookup {
    async fn lookup_ipv4(&self, name: &str) -> Result<Vec<Ipv4Addr>, String> {
        match self.resolver.ipv4_lookup(name).await {
            Ok(answers) => Ok(answers.iter().map(|record| record.0).collect()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(Vec::new()),
                _ => Err(e.to_string()),
            },
        }
    }
}

/// Checker backed by one DNS blocklist zone
pub struct DnsblChecker {
    blocklist: Blocklist,
    lookup: Arc<dyn DnsLookup>,
}

impl DnsblChecker {
    pub fn new(blocklist: Blocklist, lookup: Arc<dyn DnsLookup>) -> Self {
        Self { blocklist, lookup }
    }

    /// Name to query for `host`, or `None` when the zone does not list hosts of its kind
    pub fn query_name(&self, host: &str) -> Option<String> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() || host.starts_with('[') || host.contains(':') {
            return None;
        }

        match host.parse::<Ipv4Addr>() {
            Ok(address) if self.blocklist.listed.addresses() => {
                let [a, b, c, d] = address.octets();
                Some(format!("{}.{}.{}.{}.{}.", d, c, b, a, self.blocklist.zone))
            }
            Ok(_) => None,
            Err(_) if self.blocklist.listed.domains() => {
                Some(format!("{}.{}.", host, self.blocklist.zone))
            }
            Err(_) => None,
        }
    }

    fn verdict_for(&self, answers: &[Ipv4Addr]) -> Result<Verdict, ReputationError> {
        for answer in answers {
            let [first, second, third, _] = answer.octets();
            // 127.0.0.1 and 127.255.255.0/24 report a refused or blocked query
            let refused = *answer == Ipv4Addr::LOCALHOST || (second == 255 && third == 255);
            if first != 127 || refused {
                return Err(ReputationError::InvalidResponse {
                    checker: self.blocklist.name.to_string(),
                    reason: format!("unexpected answer {}", answer),
                });
            }
        }

        if answers.is_empty() {
            Ok(Verdict::Clean)
        } else {
            Ok(Verdict::Spam)
        }
    }
}

#[async_trait]
impl ReputationChecker for DnsblChecker {
    fn name(&self) -> &str {
        self.blocklist.name
    }

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError> {
        let Some(query) = self.query_name(url.host()) else {
            return Ok(Classification::new(Verdict::Clean, self.name()));
        };

        let answers = self
            .lookup
            .lookup_ipv4(&query)
            .await
            .map_err(|reason| ReputationError::Transport {
                checker: self.blocklist.name.to_string(),
                reason,
            })?;

        let verdict = self.verdict_for(&answers)?;
        if !verdict.is_clean() {
            debug!(url = %url, query = %query, answers = ?answers, "DNS blocklist hit");
        }

        Ok(Classification::new(verdict, self.name()))
    }
}
