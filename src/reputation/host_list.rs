use async_trait::async_trait;
use std::collections::HashSet;

use super::{Classification, ReputationChecker, ReputationError, Verdict};
use crate::target::TargetUrl;

/// A named set of hosts.
///
/// A host matches when it, or any of its parent domains, is in the set.
#[derive(Debug, Clone)]
pub struct HostList {
    name: String,
    hosts: HashSet<String>,
}

impl HostList {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, hosts: &[S]) -> Self {
        let hosts = hosts
            .iter()
            .map(|h| normalize_host(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();

        Self {
            name: name.into(),
            hosts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, host: &str) -> bool {
        let host = normalize_host(host);
        let mut candidate = host.as_str();

        loop {
            if self.hosts.contains(candidate) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => candidate = parent,
                _ => return false,
            }
        }
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Checker flagging URLs whose host is on a configured blacklist
pub struct HostListChecker {
    list: HostList,
}

impl HostListChecker {
    pub fn new(list: HostList) -> Self {
        Self { list }
    }
}

#[async_trait]
impl ReputationChecker for HostListChecker {
    fn name(&self) -> &str {
        self.list.name()
    }

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError> {
        let verdict = if self.list.contains(url.host()) {
            Verdict::Blacklisted
        } else {
            Verdict::Clean
        };
        Ok(Classification::new(verdict, self.list.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_matches_parent_domains() {
        let list = HostList::new("test", &["Evil.Example.", "10.0.0.1"]);

        assert!(list.contains("evil.example"));
        assert!(list.contains("cdn.evil.example"));
        assert!(list.contains("a.b.EVIL.example"));
        assert!(list.contains("10.0.0.1"));
        assert!(!list.contains("notevil.example"));
        assert!(!list.contains("example"));
        assert!(!list.contains("10.0.0.2"));
    }

    #[test]
    fn test_empty_entries_are_ignored() {
        let list = HostList::new("test", &["", "  "]);
        assert!(list.is_empty());
        assert!(!list.contains("example.com"));
    }

    #[tokio::test]
    async fn test_checker_verdicts() {
        let checker = HostListChecker::new(HostList::new("blacklist", &["spam.test"]));

        let bad = TargetUrl::parse("http://spam.test/buy").unwrap();
        let good = TargetUrl::parse("http://ham.test/").unwrap();

        let result = checker.classify(&bad).await.unwrap();
        assert_eq!(result.verdict, Verdict::Blacklisted);
        assert_eq!(result.source, "blacklist");
        assert_eq!(checker.classify(&good).await.unwrap().verdict, Verdict::Clean);
    }
}
