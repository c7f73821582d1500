//! Repository operations: account listing and detail lookups.

use serde_json::Value;

use super::client::ForgeClient;
use super::error::{FetchError, short_error_message};
use super::types::{RepoDetail, RepoSummary};
use crate::scan::{ProgressCallback, RepoFilter, ScanProgress, emit};

/// Page size requested from the listing endpoint.
pub const PAGE_SIZE: usize = 100;

impl ForgeClient {
    /// List the repositories owned by `account`, page by page.
    ///
    /// Paging stops at the first page holding fewer than [`PAGE_SIZE`] items;
    /// a payload that is not an array counts as an empty page. `filter` is
    /// applied to every page as it arrives.
    ///
    /// A failure on the first page is returned to the caller. A failure on a
    /// later page keeps what was already listed.
    pub async fn list_account_repos(
        &self,
        account: &str,
        filter: &RepoFilter,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<RepoSummary>, FetchError> {
        let mut kept = Vec::new();
        let mut listed = 0usize;
        let mut page = 1u32;

        emit(
            on_progress,
            ScanProgress::FetchingRepos {
                account: account.to_string(),
            },
        );

        loop {
            let page_str = page.to_string();
            let url = self.endpoint(
                &["users", account, "repos"],
                &[
                    ("type", "owner"),
                    ("sort", "full_name"),
                    ("per_page", "100"),
                    ("page", &page_str),
                ],
            );

            let payload = match self
                .fetch_json(&url, &format!("list_{account}_p{page}"))
                .await
            {
                Ok(payload) => payload,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        account,
                        page,
                        kept = kept.len(),
                        "Listing stopped early, keeping earlier pages: {}",
                        e
                    );
                    emit(
                        on_progress,
                        ScanProgress::ListingTruncated {
                            account: account.to_string(),
                            page,
                            error: short_error_message(&e),
                        },
                    );
                    break;
                }
            };

            let items = page_items(account, page, payload);
            let count = items.len();
            listed += count;

            for item in items {
                match serde_json::from_value::<RepoSummary>(item) {
                    Ok(repo) => match filter.exclusion_reason(&repo) {
                        None => kept.push(repo),
                        Some(reason) => {
                            tracing::debug!(account, repo = %repo.name, ?reason, "Skipping repository");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(account, page, "Skipping malformed repository entry: {}", e);
                    }
                }
            }

            emit(
                on_progress,
                ScanProgress::FetchedPage {
                    account: account.to_string(),
                    page,
                    count,
                    kept_so_far: kept.len(),
                },
            );

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        tracing::info!(account, listed, kept = kept.len(), "Listed repositories");
        emit(
            on_progress,
            ScanProgress::FetchComplete {
                account: account.to_string(),
                listed,
                kept: kept.len(),
            },
        );

        Ok(kept)
    }

    /// Fetch the single-repository resource for `owner/name`.
    ///
    /// A payload naming no repository at all (e.g. `{}`) is a decode error,
    /// so callers fall back to listing data instead of an empty record.
    pub async fn resolve_detail(&self, owner: &str, name: &str) -> Result<RepoDetail, FetchError> {
        let url = self.endpoint(&["repos", owner, name], &[]);
        let payload = self
            .fetch_json(&url, &format!("detail_{owner}_{name}"))
            .await?;

        match serde_json::from_value::<RepoDetail>(payload) {
            Ok(detail) if detail.summary.name.is_empty() && detail.summary.full_name.is_empty() => {
                Err(FetchError::Decode {
                    url,
                    message: "payload names no repository".to_string(),
                })
            }
            Ok(detail) => Ok(detail),
            Err(e) => Err(FetchError::Decode {
                url,
                message: e.to_string(),
            }),
        }
    }
}

/// Items of a listing page. Anything but an array is an empty page.
fn page_items(account: &str, page: u32, payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(
                account,
                page,
                "Listing page is not an array, treating it as empty: {}",
                preview(&other)
            );
            Vec::new()
        }
    }
}

fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockTransport};
    use crate::retry::RetryConfig;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://forge.test";

    fn list_url(account: &str, page: u32) -> String {
        format!(
            "{BASE}/users/{account}/repos?type=owner&sort=full_name&per_page=100&page={page}"
        )
    }

    fn ok_json(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string().into_bytes(),
        }
    }

    fn status(code: u16) -> HttpResponse {
        HttpResponse {
            status: code,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn repos(account: &str, names: impl IntoIterator<Item = String>) -> Value {
        Value::Array(
            names
                .into_iter()
                .map(|name| {
                    json!({
                        "name": name,
                        "full_name": format!("{account}/{name}"),
                        "owner": { "login": account },
                        "html_url": format!("https://forge.test/{account}/{name}"),
                        "fork": false
                    })
                })
                .collect(),
        )
    }

    fn client(transport: &MockTransport, max_attempts: i64) -> ForgeClient {
        ForgeClient::new_with_transport(
            BASE,
            None,
            RetryConfig::with_max_attempts(max_attempts),
            Arc::new(transport.clone()),
        )
        .expect("client should build")
    }

    fn recorder() -> (Arc<Mutex<Vec<ScanProgress>>>, ProgressCallback) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });
        (events, callback)
    }

    #[tokio::test]
    async fn short_first_page_needs_one_request() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("octocat", 1),
            ok_json(repos("octocat", ["a".to_string(), "b".to_string()])),
        );

        let listed = client(&transport, 3)
            .list_account_repos("octocat", &RepoFilter::default(), None)
            .await
            .expect("listing");

        assert_eq!(listed.len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn full_page_requests_the_next_one() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("big", 1),
            ok_json(repos("big", (0..100).map(|i| format!("repo-{i:03}")))),
        );
        transport.push_response(list_url("big", 2), ok_json(json!([])));

        let (events, callback) = recorder();
        let listed = client(&transport, 3)
            .list_account_repos("big", &RepoFilter::default(), Some(&callback))
            .await
            .expect("listing");

        assert_eq!(listed.len(), 100);
        assert_eq!(transport.request_count(&list_url("big", 2)), 1);

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(events.contains(&ScanProgress::FetchComplete {
            account: "big".to_string(),
            listed: 100,
            kept: 100,
        }));
    }

    #[tokio::test]
    async fn paging_counts_raw_items_not_kept_ones() {
        let transport = MockTransport::new();
        let mut page: Vec<String> = (0..99).map(|i| format!("repo-{i:03}")).collect();
        page.push(".hidden".to_string());
        transport.push_response(list_url("dots", 1), ok_json(repos("dots", page)));
        transport.push_response(
            list_url("dots", 2),
            ok_json(repos("dots", ["last".to_string()])),
        );

        let filter = RepoFilter::new(Vec::<String>::new(), true, false);
        let listed = client(&transport, 1)
            .list_account_repos("dots", &filter, None)
            .await
            .expect("listing");

        assert_eq!(listed.len(), 100);
        assert!(listed.iter().all(|r| !r.name.starts_with('.')));
    }

    #[tokio::test]
    async fn non_array_payload_ends_listing() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("odd", 1),
            ok_json(json!({ "message": "weird" })),
        );

        let listed = client(&transport, 1)
            .list_account_repos("odd", &RepoFilter::default(), None)
            .await
            .expect("listing");

        assert!(listed.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("mixed", 1),
            ok_json(json!([
                { "name": "good", "full_name": "mixed/good" },
                { "name": 42 },
                "not an object"
            ])),
        );

        let listed = client(&transport, 1)
            .list_account_repos("mixed", &RepoFilter::default(), None)
            .await
            .expect("listing");

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "good");
    }

    #[tokio::test]
    async fn entries_with_null_fields_are_kept() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("sparse", 1),
            ok_json(json!([
                { "name": "ok", "full_name": "sparse/ok", "topics": ["a"] },
                { "name": "no-topics", "full_name": "sparse/no-topics", "topics": null },
                { "name": "no-url", "full_name": "sparse/no-url", "html_url": null },
                { "name": "no-stars", "full_name": "sparse/no-stars", "stargazers_count": null, "fork": null }
            ])),
        );

        let listed = client(&transport, 1)
            .list_account_repos("sparse", &RepoFilter::default(), None)
            .await
            .expect("listing");

        let names: Vec<&str> = listed.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ok", "no-topics", "no-url", "no-stars"]);
        assert!(listed[1].topics.is_empty());
        assert_eq!(listed[2].html_url, "");
        assert_eq!(listed[3].stargazers_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn first_page_failure_is_returned() {
        let transport = MockTransport::new();
        transport.push_response(list_url("ghost", 1), status(404));
        transport.push_response(list_url("ghost", 1), status(404));

        let err = client(&transport, 2)
            .list_account_repos("ghost", &RepoFilter::default(), None)
            .await
            .expect_err("first page should fail");

        assert!(err.is_exhausted());
        assert_eq!(err.last_status(), Some(404));
    }

    #[tokio::test(start_paused = true)]
    async fn later_page_failure_keeps_earlier_pages() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("flaky", 1),
            ok_json(repos("flaky", (0..100).map(|i| format!("r{i:03}")))),
        );
        transport.push_response(list_url("flaky", 2), status(502));
        transport.push_response(list_url("flaky", 2), status(502));

        let (events, callback) = recorder();
        let listed = client(&transport, 2)
            .list_account_repos("flaky", &RepoFilter::default(), Some(&callback))
            .await
            .expect("partial listing");

        assert_eq!(listed.len(), 100);
        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(events.iter().any(|e| matches!(
            e,
            ScanProgress::ListingTruncated { page: 2, .. }
        )));
    }

    #[tokio::test]
    async fn resolve_detail_decodes_parent() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/repos/octocat/linux"),
            ok_json(json!({
                "name": "linux",
                "full_name": "octocat/linux",
                "fork": true,
                "parent": { "full_name": "torvalds/linux", "html_url": "https://forge.test/torvalds/linux" }
            })),
        );

        let detail = client(&transport, 1)
            .resolve_detail("octocat", "linux")
            .await
            .expect("detail");

        assert!(detail.summary.fork);
        assert_eq!(
            detail.parent.map(|p| p.full_name),
            Some("torvalds/linux".to_string())
        );
    }

    #[tokio::test]
    async fn resolve_detail_rejects_payload_without_identity() {
        let transport = MockTransport::new();
        transport.push_response(format!("{BASE}/repos/octocat/blank"), ok_json(json!({})));
        transport.push_response(
            format!("{BASE}/repos/octocat/anon"),
            ok_json(json!({ "name": null, "full_name": null, "stargazers_count": 7 })),
        );

        let forge = client(&transport, 1);
        for name in ["blank", "anon"] {
            let err = forge
                .resolve_detail("octocat", name)
                .await
                .expect_err("identity-less detail should be rejected");
            assert!(matches!(err, FetchError::Decode { .. }));
        }
    }

    #[tokio::test]
    async fn resolve_detail_rejects_non_object_payload() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/repos/octocat/odd"),
            HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: b"<html></html>".to_vec(),
            },
        );

        let err = client(&transport, 1)
            .resolve_detail("octocat", "odd")
            .await
            .expect_err("decode should fail");
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
