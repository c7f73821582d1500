//! Forge API payload types.
//!
//! Payloads are loosely shaped: any field may be missing or `null`, so every
//! field has a default. Non-optional fields read `null` through
//! [`null_as_default`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Read a field that may be `null`, mapping `null` to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Repository owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOwner {
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
}

/// License object embedded in repository payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiLicense {
    pub key: Option<String>,
    pub name: Option<String>,
    pub spdx_id: Option<String>,
    /// API URL of the license resource.
    pub url: Option<String>,
}

/// Parent (or source) repository of a fork.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiParent {
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
    pub license: Option<ApiLicense>,
}

/// Repository as returned by the account listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    pub owner: Option<ApiOwner>,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub fork: bool,
    pub license: Option<ApiLicense>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub stargazers_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub forks_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

impl RepoSummary {
    /// Owner login, falling back to the `owner/` part of `full_name`.
    #[must_use]
    pub fn owner_login(&self) -> String {
        match &self.owner {
            Some(owner) if !owner.login.is_empty() => owner.login.clone(),
            _ => self
                .full_name
                .split_once('/')
                .map(|(owner, _)| owner.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Repository as returned by the single-repository endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoDetail {
    #[serde(flatten)]
    pub summary: RepoSummary,
    /// Direct upstream of a fork.
    pub parent: Option<ApiParent>,
    /// Root of the fork network.
    pub source: Option<ApiParent>,
}

/// A single rate limit resource entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResource {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Requests used in current period.
    #[serde(default)]
    pub used: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// Unix timestamp when the rate limit resets.
    pub reset: i64,
}

impl RateLimitResource {
    /// Get the reset time as a DateTime.
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset, 0).unwrap_or_else(Utc::now)
    }
}

/// Rate limit resources reported by `/rate_limit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResources {
    /// Core API rate limit (non-search REST endpoints).
    pub core: RateLimitResource,
    /// Search API rate limit.
    #[serde(default)]
    pub search: Option<RateLimitResource>,
    /// GraphQL API rate limit.
    #[serde(default)]
    pub graphql: Option<RateLimitResource>,
}

/// Full `/rate_limit` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tolerates_nulls_and_missing_fields() {
        let json = serde_json::json!({
            "name": "hello-world",
            "full_name": "octocat/hello-world",
            "description": null,
            "license": null,
            "topics": ["demo"]
        });

        let summary: RepoSummary = serde_json::from_value(json).expect("summary should parse");
        assert_eq!(summary.name, "hello-world");
        assert!(summary.owner.is_none());
        assert!(summary.description.is_none());
        assert!(summary.license.is_none());
        assert!(!summary.fork);
        assert_eq!(summary.stargazers_count, 0);
        assert_eq!(summary.topics, vec!["demo".to_string()]);
        assert_eq!(summary.owner_login(), "octocat");
    }

    #[test]
    fn null_scalars_and_lists_read_as_defaults() {
        let json = serde_json::json!({
            "name": "nulls",
            "full_name": null,
            "owner": {"login": null},
            "html_url": null,
            "fork": null,
            "stargazers_count": null,
            "forks_count": null,
            "topics": null
        });

        let summary: RepoSummary = serde_json::from_value(json).expect("summary should parse");
        assert_eq!(summary.name, "nulls");
        assert_eq!(summary.full_name, "");
        assert_eq!(summary.html_url, "");
        assert!(!summary.fork);
        assert_eq!(summary.stargazers_count, 0);
        assert_eq!(summary.forks_count, 0);
        assert!(summary.topics.is_empty());
        assert_eq!(summary.owner.map(|o| o.login), Some(String::new()));

        let parent: ApiParent =
            serde_json::from_value(serde_json::json!({"full_name": "a/b", "html_url": null}))
                .expect("parent should parse");
        assert_eq!(parent.full_name, "a/b");
        assert_eq!(parent.html_url, "");
    }

    #[test]
    fn wrong_types_are_still_rejected() {
        let result = serde_json::from_value::<RepoSummary>(serde_json::json!({"name": 42}));
        assert!(result.is_err());
    }

    #[test]
    fn owner_login_prefers_owner_object() {
        let summary = RepoSummary {
            full_name: "someone/else".to_string(),
            owner: Some(ApiOwner {
                login: "octocat".to_string(),
            }),
            ..RepoSummary::default()
        };
        assert_eq!(summary.owner_login(), "octocat");
    }

    #[test]
    fn detail_flattens_summary_and_reads_parent() {
        let json = serde_json::json!({
            "name": "linux",
            "full_name": "octocat/linux",
            "owner": {"login": "octocat", "id": 1},
            "html_url": "https://github.com/octocat/linux",
            "fork": true,
            "stargazers_count": 3,
            "forks_count": 1,
            "created_at": "2020-01-02T03:04:05Z",
            "parent": {
                "full_name": "torvalds/linux",
                "html_url": "https://github.com/torvalds/linux",
                "license": {"key": "other", "name": "Other", "spdx_id": "NOASSERTION"}
            }
        });

        let detail: RepoDetail = serde_json::from_value(json).expect("detail should parse");
        assert!(detail.summary.fork);
        assert_eq!(detail.summary.stargazers_count, 3);
        assert_eq!(
            detail.summary.created_at.map(|t| t.timestamp()),
            Some(1_577_934_245)
        );
        let parent = detail.parent.expect("parent present");
        assert_eq!(parent.full_name, "torvalds/linux");
        assert_eq!(
            parent.license.and_then(|l| l.spdx_id),
            Some("NOASSERTION".to_string())
        );
        assert!(detail.source.is_none());
    }

    #[test]
    fn rate_limit_response_parses_optional_resources() {
        let json = r#"{
            "resources": {
                "core": {"limit": 5000, "used": 100, "remaining": 4900, "reset": 1700000000}
            },
            "rate": {"limit": 5000, "used": 100, "remaining": 4900, "reset": 1700000000}
        }"#;

        let response: RateLimitResponse = serde_json::from_str(json).expect("should parse");
        assert_eq!(response.resources.core.remaining, 4900);
        assert!(response.resources.search.is_none());
        assert!(response.resources.graphql.is_none());
        assert_eq!(response.resources.core.reset_at().timestamp(), 1_700_000_000);
    }
}
