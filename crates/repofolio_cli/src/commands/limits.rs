use clap::ValueEnum;
use repofolio::FetchError;
use repofolio::forge::{RateLimitResource, RateLimitResources};

use crate::commands::shared::{ApiOverrides, build_client};
use crate::config::Config;

/// Output format for rate limit display.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// Show the current API quota for the configured forge.
pub(crate) async fn handle_limits(
    output: OutputFormat,
    config: &Config,
    overrides: &ApiOverrides,
) -> Result<(), FetchError> {
    let client = build_client(config, overrides)?;
    if !client.is_authenticated() {
        tracing::info!("No API token set; showing the unauthenticated quota");
    }

    let rate_limits = client.get_rate_limits().await?;
    RateLimitDisplay::print_many(rate_limits_to_display(&rate_limits.resources), output);
    Ok(())
}

/// Rate limit information for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct RateLimitDisplay {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Used")]
    pub used: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
    #[tabled(rename = "Usage %")]
    pub usage_percent: String,
    #[tabled(rename = "Resets At")]
    pub reset_at: String,
    #[tabled(rename = "Resets In")]
    pub reset_in: String,
}

impl RateLimitDisplay {
    pub(crate) fn from_resource(name: &str, resource: &RateLimitResource) -> Self {
        let usage_percent = match resource.limit {
            0 => 0.0,
            limit => resource.used as f64 * 100.0 / limit as f64,
        };
        let reset_at = resource.reset_at();
        let until_reset = reset_at - chrono::Utc::now();
        let reset_in = if until_reset > chrono::Duration::zero() {
            format_duration(until_reset)
        } else {
            "now".to_string()
        };

        Self {
            resource: name.to_string(),
            limit: resource.limit.to_string(),
            used: resource.used.to_string(),
            remaining: resource.remaining.to_string(),
            usage_percent: format!("{:.1}%", usage_percent),
            reset_at: reset_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            reset_in,
        }
    }

    pub(crate) fn print_many(mut items: Vec<Self>, format: OutputFormat) {
        items.sort_by(|a, b| a.resource.cmp(&b.resource));

        match format {
            OutputFormat::Table => {
                let mut table = tabled::Table::new(items);
                table.with(tabled::settings::Style::rounded());
                println!("{}", table);
            }
            OutputFormat::Json => match serde_json::to_string_pretty(&items) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!("Failed to encode rate limits: {}", e),
            },
        }
    }
}

/// Build display rows for every resource the forge reported.
pub(crate) fn rate_limits_to_display(limits: &RateLimitResources) -> Vec<RateLimitDisplay> {
    let mut items = vec![RateLimitDisplay::from_resource("core", &limits.core)];

    if let Some(ref r) = limits.search {
        items.push(RateLimitDisplay::from_resource("search", r));
    }
    if let Some(ref r) = limits.graphql {
        items.push(RateLimitDisplay::from_resource("graphql", r));
    }

    items
}

/// Largest two units of a positive duration, e.g. `1h 5m` or `2m`.
fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (major, minor) = match total {
        0..60 => return format!("{}s", total),
        60..3600 => ((total / 60, "m"), (total % 60, "s")),
        _ => ((total / 3600, "h"), ((total % 3600) / 60, "m")),
    };

    if minor.0 > 0 {
        format!("{}{} {}{}", major.0, major.1, minor.0, minor.1)
    } else {
        format!("{}{}", major.0, major.1)
    }
}
