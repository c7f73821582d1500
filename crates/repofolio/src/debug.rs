//! Optional on-disk dumps of API responses for troubleshooting.
//!
//! Artifacts are write-only: nothing in the crate reads them back, and a
//! failed write is logged and otherwise ignored.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::http::HttpHeaders;

/// Characters that are not allowed in file names on common platforms.
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// One captured response (or failed request) to persist.
#[derive(Debug, Clone)]
pub struct DebugArtifact<'a> {
    /// Name prefix, e.g. `list_octocat_p1` or `detail_octocat_hello-world`.
    pub prefix: &'a str,
    /// Request URL.
    pub url: &'a str,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Response status, `None` when no response arrived.
    pub status: Option<u16>,
    /// Response headers (empty when no response arrived).
    pub headers: &'a HttpHeaders,
    /// Body text: a preview for failures, the full body for successes.
    pub body: &'a str,
}

/// Receiver for debug artifacts.
pub trait DebugSink: Send + Sync {
    fn record(&self, artifact: &DebugArtifact<'_>);
}

/// Writes each artifact as a `.headers.txt` and a `.body.txt` file.
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    dir: PathBuf,
}

impl FileDebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, artifact: &DebugArtifact<'_>, now: DateTime<Utc>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stem = format!(
            "{}_a{}_{}",
            sanitize_prefix(artifact.prefix),
            artifact.attempt,
            now.format("%Y%m%dT%H%M%S%.3fZ")
        );

        let mut headers = String::new();
        let _ = writeln!(headers, "url: {}", artifact.url);
        match artifact.status {
            Some(status) => {
                let _ = writeln!(headers, "status: {status}");
            }
            None => headers.push_str("status: (no response)\n"),
        }
        headers.push('\n');
        for (name, value) in artifact.headers {
            let _ = writeln!(headers, "{name}: {value}");
        }

        let mut body = String::new();
        for line in artifact.body.lines() {
            body.push_str(line);
            body.push('\n');
        }

        fs::write(self.dir.join(format!("{stem}.headers.txt")), headers)?;
        let body_path = self.dir.join(format!("{stem}.body.txt"));
        fs::write(&body_path, body)?;
        Ok(body_path)
    }
}

impl DebugSink for FileDebugSink {
    fn record(&self, artifact: &DebugArtifact<'_>) {
        match self.write(artifact, Utc::now()) {
            Ok(path) => tracing::debug!(path = %path.display(), "Saved debug artifact"),
            Err(e) => tracing::debug!(
                dir = %self.dir.display(),
                prefix = artifact.prefix,
                error = %e,
                "Failed to save debug artifact"
            ),
        }
    }
}

/// Replace characters that cannot appear in file names with `_`.
///
/// Whitespace and control characters are replaced too. An empty prefix
/// becomes `_`.
#[must_use]
pub fn sanitize_prefix(prefix: &str) -> String {
    let sanitized: String = prefix
        .chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) || c.is_control() || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}
