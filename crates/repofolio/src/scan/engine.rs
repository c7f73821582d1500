//! Scan engine: list each account, then resolve every kept repository.
//!
//! Everything runs sequentially: one account, one repository and one HTTP
//! call at a time. Failures degrade only the unit they happen in. An account
//! that cannot be listed yields an empty, inaccessible report; a repository
//! whose detail lookup fails is built from its listing entry instead.
//!
//! # Example
//!
//! ```ignore
//! use repofolio::scan::{ScanOptions, scan_accounts};
//!
//! let accounts = vec!["alice".to_string(), "bob".to_string()];
//! let reports = scan_accounts(&client, &accounts, &ScanOptions::default(), None).await;
//! ```

use super::progress::{ProgressCallback, ScanProgress, emit};
use super::types::{AccountReport, ScanOptions, ScanSummary};
use crate::forge::{
    ForgeClient, RepoSummary, record_from_detail, record_from_summary, short_error_message,
};
use crate::record::RepositoryRecord;

/// Scan one account.
pub async fn scan_account(
    client: &ForgeClient,
    account: &str,
    options: &ScanOptions,
    on_progress: Option<&ProgressCallback>,
) -> AccountReport {
    let summaries = match client
        .list_account_repos(account, &options.filter, on_progress)
        .await
    {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::warn!(account, "Account is inaccessible, skipping: {}", e);
            emit(
                on_progress,
                ScanProgress::AccountInaccessible {
                    account: account.to_string(),
                    error: short_error_message(&e),
                },
            );
            return AccountReport {
                account: account.to_string(),
                records: Vec::new(),
                accessible: false,
                error: Some(e.to_string()),
            };
        }
    };

    emit(
        on_progress,
        ScanProgress::ResolvingDetails {
            account: account.to_string(),
            count: summaries.len(),
        },
    );

    let mut records = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let record = resolve_record(client, account, summary, on_progress).await;
        emit(
            on_progress,
            ScanProgress::ResolvedRepo {
                account: account.to_string(),
                full_name: record.full_name.clone(),
                source: record.source,
            },
        );
        records.push(record);
    }

    tracing::info!(account, records = records.len(), "Account scanned");
    emit(
        on_progress,
        ScanProgress::AccountComplete {
            account: account.to_string(),
            records: records.len(),
        },
    );

    AccountReport {
        account: account.to_string(),
        records,
        accessible: true,
        error: None,
    }
}

async fn resolve_record(
    client: &ForgeClient,
    account: &str,
    summary: &RepoSummary,
    on_progress: Option<&ProgressCallback>,
) -> RepositoryRecord {
    let owner = match summary.owner_login() {
        login if login.is_empty() => account.to_string(),
        login => login,
    };

    match client.resolve_detail(&owner, &summary.name).await {
        Ok(detail) => record_from_detail(account, summary, &detail),
        Err(e) => {
            let record = record_from_summary(account, summary);
            tracing::warn!(
                account,
                repo = %record.full_name,
                "Detail lookup failed, using listing data: {}",
                e
            );
            emit(
                on_progress,
                ScanProgress::DetailFallback {
                    account: account.to_string(),
                    full_name: record.full_name.clone(),
                    error: short_error_message(&e),
                },
            );
            record
        }
    }
}

/// Scan several accounts in input order.
///
/// Duplicate accounts are scanned again and reported twice.
pub async fn scan_accounts(
    client: &ForgeClient,
    accounts: &[String],
    options: &ScanOptions,
    on_progress: Option<&ProgressCallback>,
) -> Vec<AccountReport> {
    emit(
        on_progress,
        ScanProgress::ScanningAccounts {
            count: accounts.len(),
        },
    );

    let mut reports = Vec::with_capacity(accounts.len());
    for account in accounts {
        reports.push(scan_account(client, account, options, on_progress).await);
    }

    let summary = ScanSummary::from_reports(&reports);
    tracing::info!(
        accounts = summary.accounts,
        records = summary.records,
        inaccessible = summary.inaccessible,
        fallbacks = summary.fallbacks,
        "Scan complete"
    );
    emit(
        on_progress,
        ScanProgress::ScanComplete {
            accounts: summary.accounts,
            records: summary.records,
            inaccessible: summary.inaccessible,
        },
    );

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockTransport};
    use crate::record::RecordSource;
    use crate::retry::RetryConfig;
    use crate::scan::RepoFilter;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://forge.test";

    fn list_url(account: &str) -> String {
        format!("{BASE}/users/{account}/repos?type=owner&sort=full_name&per_page=100&page=1")
    }

    fn detail_url(owner: &str, name: &str) -> String {
        format!("{BASE}/repos/{owner}/{name}")
    }

    fn ok_json(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string().into_bytes(),
        }
    }

    fn server_error() -> HttpResponse {
        HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: b"{\"message\":\"boom\"}".to_vec(),
        }
    }

    fn repo_json(owner: &str, name: &str, fork: bool) -> Value {
        json!({
            "name": name,
            "full_name": format!("{owner}/{name}"),
            "owner": { "login": owner },
            "html_url": format!("https://forge.test/{owner}/{name}"),
            "description": format!("{name} description"),
            "fork": fork,
            "stargazers_count": 1,
            "forks_count": 0,
            "topics": []
        })
    }

    fn detail_json(owner: &str, name: &str) -> Value {
        let mut detail = repo_json(owner, name, false);
        detail["license"] = json!({ "name": "MIT License", "spdx_id": "MIT" });
        detail["stargazers_count"] = json!(10);
        detail
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

    fn octocat_transport() -> MockTransport {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("octocat"),
            ok_json(json!([
                repo_json("octocat", "hello-world", false),
                repo_json("octocat", "spoon-knife", false)
            ])),
        );
        transport.push_response(
            detail_url("octocat", "hello-world"),
            ok_json(detail_json("octocat", "hello-world")),
        );
        for _ in 0..3 {
            transport.push_response(detail_url("octocat", "spoon-knife"), server_error());
        }
        transport
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_detail_falls_back_to_listing_data() {
        let transport = octocat_transport();
        let report = scan_account(
            &client(&transport, 3),
            "octocat",
            &ScanOptions::default(),
            None,
        )
        .await;

        assert!(report.accessible);
        assert_eq!(report.records.len(), 2);
        assert_eq!(transport.request_count(&list_url("octocat")), 1);
        assert_eq!(
            transport.request_count(&detail_url("octocat", "hello-world")),
            1
        );
        assert_eq!(
            transport.request_count(&detail_url("octocat", "spoon-knife")),
            3
        );

        let hello = &report.records[0];
        assert_eq!(hello.source, RecordSource::Detail);
        assert_eq!(hello.stars, 10);
        assert!(hello.license.is_some());

        let spoon = &report.records[1];
        assert_eq!(spoon.source, RecordSource::ListFallback);
        assert_eq!(spoon.full_name, "octocat/spoon-knife");
        assert_eq!(spoon.description.as_deref(), Some("spoon-knife description"));
        assert_eq!(report.fallback_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn inaccessible_account_does_not_stop_the_scan() {
        let transport = MockTransport::new();
        transport.push_response(list_url("alice"), server_error());
        transport.push_response(list_url("alice"), server_error());
        transport.push_response(
            list_url("bob"),
            ok_json(json!([
                repo_json("bob", "a", false),
                repo_json("bob", "b", true),
                repo_json("bob", "c", false)
            ])),
        );
        transport.push_response(detail_url("bob", "a"), ok_json(detail_json("bob", "a")));
        transport.push_response(detail_url("bob", "c"), ok_json(detail_json("bob", "c")));

        let options = ScanOptions {
            filter: RepoFilter::new(Vec::<String>::new(), false, true),
        };
        let accounts = crate::scan::parse_name_list("alice, bob");
        let reports = scan_accounts(&client(&transport, 2), &accounts, &options, None).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].account, "alice");
        assert!(!reports[0].accessible);
        assert!(reports[0].records.is_empty());
        assert!(reports[0].error.is_some());

        assert_eq!(reports[1].account, "bob");
        let names: Vec<&str> = reports[1].records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(transport.request_count(&detail_url("bob", "b")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_scans_are_identical() {
        let first = octocat_transport();
        let second = octocat_transport();
        let options = ScanOptions::default();
        let accounts = vec!["octocat".to_string()];

        let a = scan_accounts(&client(&first, 3), &accounts, &options, None).await;
        let b = scan_accounts(&client(&second, 3), &accounts, &options, None).await;

        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).expect("serialize"),
            serde_json::to_string(&b).expect("serialize")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn progress_events_follow_the_scan() {
        let transport = octocat_transport();
        let events = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });

        scan_accounts(
            &client(&transport, 3),
            &["octocat".to_string()],
            &ScanOptions::default(),
            Some(&callback),
        )
        .await;

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(
            events.first(),
            Some(&ScanProgress::ScanningAccounts { count: 1 })
        );
        assert!(events.contains(&ScanProgress::DetailFallback {
            account: "octocat".to_string(),
            full_name: "octocat/spoon-knife".to_string(),
            error: "gave up on https://forge.test/repos/octocat/spoon-knife after 3 attempt(s), last status: 500".to_string(),
        }));
        assert_eq!(
            events.last(),
            Some(&ScanProgress::ScanComplete {
                accounts: 1,
                records: 2,
                inaccessible: 0,
            })
        );
    }

    #[tokio::test]
    async fn empty_detail_object_falls_back_to_listing_data() {
        let transport = MockTransport::new();
        transport.push_response(
            list_url("octocat"),
            ok_json(json!([repo_json("octocat", "hello-world", false)])),
        );
        transport.push_response(detail_url("octocat", "hello-world"), ok_json(json!({})));

        let report = scan_account(
            &client(&transport, 1),
            "octocat",
            &ScanOptions::default(),
            None,
        )
        .await;

        let record = &report.records[0];
        assert_eq!(record.source, RecordSource::ListFallback);
        assert_eq!(record.full_name, "octocat/hello-world");
        assert_eq!(record.url, "https://forge.test/octocat/hello-world");
        assert_eq!(record.stars, 1);
    }

    #[tokio::test]
    async fn empty_account_is_accessible_with_no_records() {
        let transport = MockTransport::new();
        transport.push_response(list_url("empty"), ok_json(json!([])));

        let report = scan_account(
            &client(&transport, 1),
            "empty",
            &ScanOptions::default(),
            None,
        )
        .await;

        assert!(report.accessible);
        assert!(report.records.is_empty());
        assert_eq!(report.error, None);
    }
}
