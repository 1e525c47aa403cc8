//! Google Safe Browsing v4 lookup client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Classification, ReputationChecker, ReputationError, Verdict};
use crate::error::{AppError, AppResult};
use crate::target::TargetUrl;

pub const DEFAULT_ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

const CHECKER_NAME: &str = "Google Safe Browsing";

const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindRequest<'a> {
    client: ClientInfo<'a>,
    threat_info: ThreatInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: &'a [&'a str],
    platform_types: [&'a str; 1],
    threat_entry_types: [&'a str; 1],
    threat_entries: Vec<ThreatEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ThreatEntry<'a> {
    url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatMatch {
    threat_type: String,
}

fn request_body(url: &str) -> FindRequest<'_> {
    FindRequest {
        client: ClientInfo {
            client_id: env!("CARGO_PKG_NAME"),
            client_version: env!("CARGO_PKG_VERSION"),
        },
        threat_info: ThreatInfo {
            threat_types: THREAT_TYPES,
            platform_types: ["ANY_PLATFORM"],
            threat_entry_types: ["URL"],
            threat_entries: vec![ThreatEntry { url }],
        },
    }
}

/// Any reported match classifies the URL as spam
fn verdict_for(response: &FindResponse) -> Verdict {
    if response.matches.is_empty() {
        Verdict::Clean
    } else {
        Verdict::Spam
    }
}

/// Checker backed by the Safe Browsing `threatMatches:find` API
pub struct SafeBrowsingChecker {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SafeBrowsingChecker {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create Safe Browsing client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn transport_error(reason: impl ToString) -> ReputationError {
        ReputationError::Transport {
            checker: CHECKER_NAME.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ReputationChecker for SafeBrowsingChecker {
    fn name(&self) -> &str {
        CHECKER_NAME
    }

    async fn classify(&self, url: &TargetUrl) -> Result<Classification, ReputationError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(url.as_str()))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ReputationError::Upstream {
                checker: CHECKER_NAME.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: FindResponse =
            response
                .json()
                .await
                .map_err(|e| ReputationError::InvalidResponse {
                    checker: CHECKER_NAME.to_string(),
                    reason: e.to_string(),
                })?;

        for threat in &body.matches {
            debug!(url = %url, threat_type = %threat.threat_type, "Safe Browsing match");
        }

        Ok(Classification::new(verdict_for(&body), CHECKER_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(request_body("https://example.com/")).unwrap();

        assert_eq!(body["client"]["clientId"], env!("CARGO_PKG_NAME"));
        assert_eq!(body["threatInfo"]["platformTypes"][0], "ANY_PLATFORM");
        assert_eq!(body["threatInfo"]["threatEntryTypes"][0], "URL");
        assert_eq!(
            body["threatInfo"]["threatEntries"][0]["url"],
            "https://example.com/"
        );
        assert_eq!(
            body["threatInfo"]["threatTypes"].as_array().unwrap().len(),
            THREAT_TYPES.len()
        );
    }

    #[test]
    fn test_empty_response_is_clean() {
        let response: FindResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(verdict_for(&response), Verdict::Clean);
    }

    #[test]
    fn test_match_is_spam() {
        let response: FindResponse = serde_json::from_str(
            r#"{"matches":[{"threatType":"MALWARE","platformType":"ANY_PLATFORM",
                "threat":{"url":"http://malware.testing.google.test/"}}]}"#,
        )
        .unwrap();
        assert_eq!(verdict_for(&response), Verdict::Spam);
        assert_eq!(response.matches[0].threat_type, "MALWARE");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let checker = SafeBrowsingChecker::new(
            "http://127.0.0.1:9/v4/threatMatches:find",
            "key",
            Duration::from_millis(500),
        )
        .unwrap();
        let url = TargetUrl::parse("https://example.com/").unwrap();

        assert!(checker.classify(&url).await.is_err());
    }
}
