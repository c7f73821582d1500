//! Resolved repository records handed to the report renderer.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a record's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// The single-repository endpoint answered.
    Detail,
    /// The detail lookup failed; fields come from the account listing.
    ListFallback,
}

/// License of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseInfo {
    /// Display name, e.g. "MIT License".
    pub name: Option<String>,
    /// SPDX identifier when the forge knows it.
    pub spdx_id: Option<String>,
    /// Canonical license text link.
    pub url: Option<String>,
}

/// Upstream repository of a fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentInfo {
    pub full_name: String,
    pub url: String,
    pub license: Option<LicenseInfo>,
}

/// One repository as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    /// The account this repository was listed under.
    pub account: String,
    /// Owner login as reported by the forge.
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub url: String,
    pub description: Option<String>,
    pub fork: bool,
    pub license: Option<LicenseInfo>,
    pub parent: Option<ParentInfo>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stars: u64,
    pub forks: u64,
    pub topics: Vec<String>,
    pub source: RecordSource,
}

impl RepositoryRecord {
    /// True when the record was built from listing data only.
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == RecordSource::ListFallback
    }
}
