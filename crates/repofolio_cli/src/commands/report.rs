use std::path::PathBuf;
use std::sync::Arc;

use repofolio::scan::{RepoFilter, ScanOptions, ScanSummary, parse_name_list, scan_accounts};
use repofolio::{FetchError, ReportError, ReportOptions, render_report, write_report};
use thiserror::Error;

use crate::commands::shared::{ApiOverrides, build_client};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Arguments for the report command.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReportArgs {
    /// Account names; commas and whitespace also separate names
    #[arg(value_name = "ACCOUNTS")]
    pub(crate) accounts: Vec<String>,

    /// Leave out forks
    #[arg(long)]
    pub(crate) hide_forks: bool,

    /// Leave out repositories whose name starts with a dot
    #[arg(long)]
    pub(crate) skip_dot_prefix: bool,

    /// Repository names to leave out, case-insensitive (repeatable, comma separated)
    #[arg(short = 'x', long, value_name = "NAMES")]
    pub(crate) exclude: Vec<String>,

    /// Repository names to show in italics (repeatable, comma separated)
    #[arg(short = 'i', long, value_name = "NAMES")]
    pub(crate) italic: Vec<String>,

    /// Attempts per request, clamped to 1-20 (default from config or 6)
    #[arg(short = 'm', long, allow_negative_numbers = true)]
    pub(crate) max_attempts: Option<i64>,

    /// Save response headers and bodies for every request
    #[arg(long)]
    pub(crate) save_debug_files: bool,

    /// Directory for debug files (default from config or ./repofolio-debug)
    #[arg(long, value_name = "DIR")]
    pub(crate) debug_dir: Option<PathBuf>,

    /// Report file to write (default from config or ./repositories.html)
    #[arg(short, long, value_name = "FILE")]
    pub(crate) output: Option<PathBuf>,

    /// Page title
    #[arg(long)]
    pub(crate) title: Option<String>,

    /// API base URL
    #[arg(long, value_name = "URL")]
    pub(crate) base_url: Option<String>,

    /// Environment variable holding the API token
    #[arg(long, value_name = "NAME")]
    pub(crate) token_env: Option<String>,
}

/// Fatal outcomes of the report command.
#[derive(Debug, Error)]
pub(crate) enum ReportCommandError {
    #[error("no accounts given")]
    NoAccounts,

    #[error(transparent)]
    Client(#[from] FetchError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ReportCommandError {
    /// Process exit status for this failure.
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Self::NoAccounts => 2,
            Self::Report(_) => 3,
            Self::Client(_) => 1,
        }
    }
}

/// Report settings after merging flags over configuration.
#[derive(Debug)]
pub(crate) struct ReportPlan {
    pub(crate) accounts: Vec<String>,
    pub(crate) options: ScanOptions,
    pub(crate) report: ReportOptions,
    pub(crate) output: PathBuf,
    pub(crate) api: ApiOverrides,
}

/// Split repeated, comma or whitespace separated values into names.
fn split_names(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|v| parse_name_list(v)).collect()
}

impl ReportPlan {
    pub(crate) fn new(args: ReportArgs, config: &Config) -> Result<Self, ReportCommandError> {
        let accounts = split_names(&args.accounts);
        if accounts.is_empty() {
            return Err(ReportCommandError::NoAccounts);
        }

        let mut exclude = config.report.exclude.clone();
        exclude.extend(split_names(&args.exclude));
        let mut italic = config.report.italic.clone();
        italic.extend(split_names(&args.italic));

        let filter = RepoFilter::new(
            exclude,
            args.skip_dot_prefix || config.report.skip_dot_prefix,
            args.hide_forks || config.report.hide_forks,
        );

        let debug_dir = (args.save_debug_files || config.debug.save_files)
            .then(|| args.debug_dir.unwrap_or_else(|| config.debug.dir.clone()));

        Ok(Self {
            accounts,
            options: ScanOptions { filter },
            report: ReportOptions::default()
                .with_title(args.title.unwrap_or_else(|| config.report.title.clone()))
                .with_italic(italic),
            output: args.output.unwrap_or_else(|| config.report.output.clone()),
            api: ApiOverrides {
                base_url: args.base_url,
                token_env: args.token_env,
                max_attempts: args.max_attempts,
                debug_dir,
            },
        })
    }
}

/// Scan the accounts and write the HTML report.
pub(crate) async fn handle_report(
    args: ReportArgs,
    config: &Config,
) -> Result<ScanSummary, ReportCommandError> {
    let plan = ReportPlan::new(args, config)?;
    let client = build_client(config, &plan.api)?;

    tracing::info!(
        accounts = plan.accounts.len(),
        output = %plan.output.display(),
        "Building repository report"
    );

    let reporter = Arc::new(ProgressReporter::new());
    let callback = reporter.as_callback();
    let reports = scan_accounts(
        &client,
        &plan.accounts,
        &plan.options,
        Some(callback.as_ref()),
    )
    .await;
    reporter.finish();

    let html = render_report(&reports, &plan.report)?;
    write_report(&plan.output, &html)?;

    let summary = ScanSummary::from_reports(&reports);
    println!(
        "Wrote {} repositories from {} account(s) to {}",
        summary.records,
        summary.accounts,
        plan.output.display()
    );
    if summary.inaccessible > 0 {
        println!("  {} account(s) could not be listed", summary.inaccessible);
    }
    if summary.fallbacks > 0 {
        println!(
            "  {} repositories built from listing data",
            summary.fallbacks
        );
    }

    Ok(summary)
}
