//! Conversion from forge payloads to report records.

use super::types::{ApiLicense, ApiParent, RepoDetail, RepoSummary};
use crate::record::{LicenseInfo, ParentInfo, RecordSource, RepositoryRecord};

/// SPDX id the forge uses for licenses it could not identify.
const SPDX_NOASSERTION: &str = "NOASSERTION";

/// Canonical text link for an SPDX identifier.
#[must_use]
pub fn spdx_license_url(spdx_id: &str) -> Option<String> {
    let id = spdx_id.trim();
    if id.is_empty() || id.eq_ignore_ascii_case(SPDX_NOASSERTION) {
        return None;
    }
    Some(format!("https://spdx.org/licenses/{id}.html"))
}

/// Convert an API license object. Returns `None` when it names nothing.
pub fn to_license_info(license: &ApiLicense) -> Option<LicenseInfo> {
    let name = license.name.clone().filter(|n| !n.trim().is_empty());
    let spdx_id = license.spdx_id.clone().filter(|s| !s.trim().is_empty());
    if name.is_none() && spdx_id.is_none() {
        return None;
    }

    let url = spdx_id.as_deref().and_then(spdx_license_url);
    Some(LicenseInfo { name, spdx_id, url })
}

fn to_parent_info(parent: &ApiParent) -> Option<ParentInfo> {
    if parent.full_name.is_empty() {
        return None;
    }
    Some(ParentInfo {
        full_name: parent.full_name.clone(),
        url: parent.html_url.clone(),
        license: parent.license.as_ref().and_then(to_license_info),
    })
}

/// Build a record from the single-repository payload.
///
/// The direct parent is preferred; the network root stands in when the
/// payload carries no parent. Text fields the payload leaves empty are taken
/// from the `listed` entry.
pub fn record_from_detail(
    account: &str,
    listed: &RepoSummary,
    detail: &RepoDetail,
) -> RepositoryRecord {
    let parent = detail
        .parent
        .as_ref()
        .or(detail.source.as_ref())
        .and_then(to_parent_info);

    RepositoryRecord {
        parent,
        source: RecordSource::Detail,
        ..record_from_summary(account, &fill_gaps(&detail.summary, listed))
    }
}

/// `detail` with its empty or absent fields taken from `listed`. Counts and the fork flag stay as the detail reports them.
fn fill_gaps(detail: &RepoSummary, listed: &RepoSummary) -> RepoSummary {
    fn or_listed(value: &str, listed: &str) -> String {
        let chosen = if value.is_empty() { listed } else { value };
        chosen.to_string()
    }

    let owner = match &detail.owner {
        Some(owner) if !owner.login.is_empty() => detail.owner.clone(),
        _ => listed.owner.clone().or_else(|| detail.owner.clone()),
    };

    RepoSummary {
        name: or_listed(&detail.name, &listed.name),
        full_name: or_listed(&detail.full_name, &listed.full_name),
        owner,
        html_url: or_listed(&detail.html_url, &listed.html_url),
        description: detail.description.clone().or_else(|| listed.description.clone()),
        license: detail.license.clone().or_else(|| listed.license.clone()),
        created_at: detail.created_at.or(listed.created_at),
        updated_at: detail.updated_at.or(listed.updated_at),
        topics: if detail.topics.is_empty() {
            listed.topics.clone()
        } else {
            detail.topics.clone()
        },
        ..detail.clone()
    }
}

/// Build a record from listing data alone.
pub fn record_from_summary(account: &str, summary: &RepoSummary) -> RepositoryRecord {
    let owner = summary.owner_login();
    let full_name = match (summary.full_name.is_empty(), owner.is_empty()) {
        (false, _) => summary.full_name.clone(),
        (true, false) => format!("{owner}/{}", summary.name),
        (true, true) => summary.name.clone(),
    };

    RepositoryRecord {
        account: account.to_string(),
        owner,
        name: summary.name.clone(),
        full_name,
        url: summary.html_url.clone(),
        description: summary
            .description
            .clone()
            .filter(|d| !d.trim().is_empty()),
        fork: summary.fork,
        license: summary.license.as_ref().and_then(to_license_info),
        parent: None,
        created_at: summary.created_at,
        updated_at: summary.updated_at,
        stars: summary.stargazers_count,
        forks: summary.forks_count,
        topics: summary.topics.clone(),
        source: RecordSource::ListFallback,
    }
}
