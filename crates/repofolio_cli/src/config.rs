//! Configuration file support for repofolio.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. `REPOFOLIO_MAX_ATTEMPTS`, then other environment variables prefixed with
//!    `REPOFOLIO_` (sections separated by `__`, e.g. `REPOFOLIO_API__BASE_URL`)
//! 3. `./repofolio.toml`
//! 4. `~/.config/repofolio/config.toml`
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [api]
//! base_url = "https://api.github.com"
//! token_env = "GITHUB_TOKEN"   # name of the variable holding the token
//! user_agent = "repofolio"
//! timeout_secs = 30
//!
//! [fetch]
//! max_attempts = 6             # clamped to 1..=20
//!
//! [report]
//! output = "repositories.html"
//! title = "Public repositories"
//! hide_forks = false
//! skip_dot_prefix = false
//! exclude = ["scratch"]
//! italic = ["archived-thing"]
//!
//! [debug]
//! save_files = false
//! dir = "repofolio-debug"
//! ```

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config as Layers, ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use repofolio::forge::{DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use repofolio::report::DEFAULT_TITLE;
use repofolio::retry::DEFAULT_MAX_ATTEMPTS;
use serde::Deserialize;

/// Flat override for the attempt budget; beats every other non-CLI source.
pub const MAX_ATTEMPTS_ENV: &str = "REPOFOLIO_MAX_ATTEMPTS";

const ENV_PREFIX: &str = "REPOFOLIO";
const LOCAL_CONFIG_FILE: &str = "repofolio.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub report: ReportConfig,
    pub debug: DebugConfig,
}

/// Forge API access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Retry behavior.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per request. Out-of-range values are clamped, not rejected.
    pub max_attempts: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: i64::from(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

/// Report defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: PathBuf,
    pub title: String,
    pub hide_forks: bool,
    pub skip_dot_prefix: bool,
    pub exclude: Vec<String>,
    pub italic: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("repositories.html"),
            title: DEFAULT_TITLE.to_string(),
            hide_forks: false,
            skip_dot_prefix: false,
            exclude: Vec::new(),
            italic: Vec::new(),
        }
    }
}

/// Debug artifact dumps.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub save_files: bool,
    pub dir: PathBuf,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            save_files: false,
            dir: PathBuf::from("repofolio-debug"),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Falls back to defaults (with a warning) when a source is malformed.
    pub fn load() -> Self {
        let mut files = Vec::new();
        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            files.push(xdg_config);
        }
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            tracing::debug!("Loading config from ./{}", LOCAL_CONFIG_FILE);
            files.push(local_config);
        }

        let builder = Self::file_sources(&files).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("report.exclude")
                .with_list_parse_key("report.italic")
                .try_parsing(true),
        );
        let max_attempts = std::env::var(MAX_ATTEMPTS_ENV).ok();

        match Self::finish(builder, max_attempts.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Config::default()
            }
        }
    }

    /// Builder over `files`, later files taking precedence.
    fn file_sources(files: &[PathBuf]) -> ConfigBuilder<DefaultState> {
        files.iter().fold(Layers::builder(), |builder, path| {
            builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
        })
    }

    /// Apply the flat attempt override and deserialize.
    fn finish(
        builder: ConfigBuilder<DefaultState>,
        max_attempts_env: Option<&str>,
    ) -> Result<Self, config::ConfigError> {
        let builder = match max_attempts_env.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) => builder.set_override("fetch.max_attempts", value)?,
                Err(_) => {
                    tracing::warn!("Ignoring {}={:?}: not an integer", MAX_ATTEMPTS_ENV, raw);
                    builder
                }
            },
            None => builder,
        };

        builder.build()?.try_deserialize()
    }

    /// Read the API token from the configured environment variable.
    pub fn token(&self, token_env: Option<&str>) -> Option<String> {
        let name = token_env.unwrap_or(&self.api.token_env);
        std::env::var(name)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "repofolio").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
