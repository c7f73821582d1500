//! Static HTML report rendering.
//!
//! The page is rendered from an embedded Jinja template with HTML
//! auto-escaping, so repository descriptions and topics cannot inject markup.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use minijinja::{Environment, context};
use serde::Serialize;
use thiserror::Error;

use crate::record::RepositoryRecord;
use crate::scan::AccountReport;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE_SOURCE: &str = include_str!("../../templates/report.html");

/// Default page title.
pub const DEFAULT_TITLE: &str = "Public repositories";

/// Errors from rendering or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report template failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Presentation options for a report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    /// Lowercased repository names shown in italics.
    italic: HashSet<String>,
    pub generated_at: DateTime<Utc>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            italic: HashSet::new(),
            generated_at: Utc::now(),
        }
    }
}

impl ReportOptions {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Names (matched case-insensitively against the repository name) to
    /// render in italics.
    #[must_use]
    pub fn with_italic<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.italic = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    fn is_italic(&self, name: &str) -> bool {
        self.italic.contains(&name.to_lowercase())
    }
}

#[derive(Debug, Serialize)]
struct TemplateRow {
    full_name: String,
    url: String,
    italic: bool,
    description: String,
    license_name: String,
    license_url: Option<String>,
    fork: bool,
    parent_full_name: Option<String>,
    parent_url: Option<String>,
    parent_license_name: Option<String>,
    parent_license_url: Option<String>,
    stars: u64,
    forks: u64,
    topics: Vec<String>,
    created: String,
    updated: String,
    fallback: bool,
}

impl TemplateRow {
    fn new(record: &RepositoryRecord, options: &ReportOptions) -> Self {
        let license_name = record
            .license
            .as_ref()
            .and_then(|l| l.name.clone().or_else(|| l.spdx_id.clone()))
            .unwrap_or_default();
        let parent = record.parent.as_ref();
        let parent_license = parent.and_then(|p| p.license.as_ref());

        Self {
            full_name: record.full_name.clone(),
            url: record.url.clone(),
            italic: options.is_italic(&record.name),
            description: record.description.clone().unwrap_or_default(),
            license_name,
            license_url: record.license.as_ref().and_then(|l| l.url.clone()),
            fork: record.fork,
            parent_full_name: parent.map(|p| p.full_name.clone()),
            parent_url: parent.map(|p| p.url.clone()).filter(|u| !u.is_empty()),
            parent_license_name: parent_license
                .and_then(|l| l.name.clone().or_else(|| l.spdx_id.clone())),
            parent_license_url: parent_license.and_then(|l| l.url.clone()),
            stars: record.stars,
            forks: record.forks,
            topics: record.topics.clone(),
            created: format_date(record.created_at),
            updated: format_date(record.updated_at),
            fallback: record.is_fallback(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TemplateSection {
    account: String,
    accessible: bool,
    error: Option<String>,
    rows: Vec<TemplateRow>,
}

fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Sort records by full name, case-insensitively. Ties keep input order.
pub fn sort_records(records: &mut [RepositoryRecord]) {
    records.sort_by_cached_key(|r| r.full_name.to_lowercase());
}

/// Render the report page. Sections follow `reports` order.
pub fn render_report(
    reports: &[AccountReport],
    options: &ReportOptions,
) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;

    let sections: Vec<TemplateSection> = reports
        .iter()
        .map(|report| {
            let mut records = report.records.clone();
            sort_records(&mut records);
            TemplateSection {
                account: report.account.clone(),
                accessible: report.accessible,
                error: report.error.clone(),
                rows: records
                    .iter()
                    .map(|r| TemplateRow::new(r, options))
                    .collect(),
            }
        })
        .collect();
    let total: usize = sections.iter().map(|s| s.rows.len()).sum();

    let template = env.get_template(TEMPLATE_NAME)?;
    let html = template.render(context! {
        title => &options.title,
        generated_at => options.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        total => total,
        sections => sections,
    })?;

    Ok(html)
}

/// Write `html` to `path`, creating parent directories as needed.
pub fn write_report(path: &Path, html: &str) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, html).map_err(write_err)?;

    tracing::info!(path = %path.display(), bytes = html.len(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LicenseInfo, ParentInfo, RecordSource};
    use chrono::TimeZone;

    fn record(account: &str, name: &str) -> RepositoryRecord {
        RepositoryRecord {
            account: account.to_string(),
            owner: account.to_string(),
            name: name.to_string(),
            full_name: format!("{account}/{name}"),
            url: format!("https://github.com/{account}/{name}"),
            description: None,
            fork: false,
            license: None,
            parent: None,
            created_at: Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()),
            updated_at: None,
            stars: 0,
            forks: 0,
            topics: Vec::new(),
            source: RecordSource::Detail,
        }
    }

    fn options() -> ReportOptions {
        ReportOptions::default()
            .with_title("Test report")
            .with_generated_at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    fn report(account: &str, records: Vec<RepositoryRecord>) -> AccountReport {
        AccountReport {
            account: account.to_string(),
            records,
            accessible: true,
            error: None,
        }
    }

    #[test]
    fn sort_is_case_insensitive() {
        let mut records = vec![
            record("octocat", "zeta"),
            record("octocat", "Alpha"),
            record("octocat", "beta"),
        ];
        sort_records(&mut records);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn header_shows_title_timestamp_and_total() {
        let html = render_report(
            &[
                report("alice", vec![record("alice", "first-one")]),
                report(
                    "bob",
                    vec![record("bob", "second-two"), record("bob", "Second-three")],
                ),
            ],
            &options(),
        )
        .expect("render");

        assert!(html.contains("<title>Test report</title>"));
        assert!(html.contains("Generated 2024-01-02T03:04:05Z"));
        assert!(html.contains("3 repositories"));
        assert!(html.find("first-one").expect("alice row") < html.find("second").expect("bob row"));
        assert!(
            html.find("Second-three").expect("three") < html.find("second-two").expect("two")
        );
        assert!(html.contains("2021-03-04"));
    }

    #[test]
    fn descriptions_are_escaped() {
        let mut rec = record("octocat", "xss");
        rec.description = Some("<script>alert(1)</script>".to_string());
        let html = render_report(&[report("octocat", vec![rec])], &options()).expect("render");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn fork_fallback_and_italic_markers() {
        let mut fork = record("octocat", "linux");
        fork.fork = true;
        fork.parent = Some(ParentInfo {
            full_name: "torvalds/linux".to_string(),
            url: "https://github.com/torvalds/linux".to_string(),
            license: Some(LicenseInfo {
                name: Some("GPL 2.0".to_string()),
                spdx_id: Some("GPL-2.0".to_string()),
                url: Some("https://spdx.org/licenses/GPL-2.0.html".to_string()),
            }),
        });
        let mut fallback = record("octocat", "Notes");
        fallback.source = RecordSource::ListFallback;

        let html = render_report(
            &[report("octocat", vec![fork, fallback])],
            &options().with_italic(["notes"]),
        )
        .expect("render");

        assert!(html.contains("fork of <a href="));
        assert!(html.contains("torvalds"));
        assert!(html.contains("GPL 2.0</a>"));
        assert!(html.contains("(summary data)"));

        assert_eq!(html.matches("<em>").count(), 1);
        let italic = &html[html.find("<em>").expect("italic")..];
        let end = italic.find("</em>").expect("closing tag");
        assert!(italic[..end].contains("Notes"));
    }

    #[test]
    fn inaccessible_account_is_flagged() {
        let html = render_report(
            &[AccountReport {
                account: "ghost".to_string(),
                records: Vec::new(),
                accessible: false,
                error: Some("gave up".to_string()),
            }],
            &options(),
        )
        .expect("render");

        assert!(html.contains("Account could not be listed: gave up"));
        assert!(html.contains("0 repositories"));
    }

    #[test]
    fn write_report_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out/report.html");

        write_report(&path, "<html></html>").expect("write");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "<html></html>"
        );
    }

    #[test]
    fn write_report_surfaces_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").expect("write blocker");

        let err = write_report(&blocker.join("report.html"), "x").expect_err("should fail");
        assert!(matches!(err, ReportError::Write { .. }));
    }
}
