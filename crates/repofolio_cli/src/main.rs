//! Repofolio CLI - builds an HTML report of the public repositories owned by
//! a set of forge accounts.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::limits::OutputFormat;
use crate::commands::report::ReportArgs;
use crate::commands::shared::ApiOverrides;

#[derive(Parser)]
#[command(name = "repofolio")]
#[command(version)]
#[command(about = "Static HTML reports of the public repositories of forge accounts")]
#[command(
    long_about = "Repofolio lists the public repositories owned by one or more accounts, \
resolves each one through the single-repository endpoint, and writes a sortable HTML \
report. Requests wait out rate limits instead of failing, so large accounts finish \
even without a token."
)]
#[command(after_long_help = r#"EXAMPLES
    Report on two accounts, hiding forks:
        $ repofolio report alice bob --hide-forks

    Accounts may also be comma separated:
        $ repofolio report "alice, bob" -o site/index.html

    Keep raw responses for troubleshooting:
        $ repofolio report octocat --save-debug-files --debug-dir dumps

    Check the remaining API quota:
        $ repofolio limits --output json

    Generate shell completions:
        $ repofolio completions bash > ~/.local/share/bash-completion/completions/repofolio

CONFIGURATION
    Repofolio reads configuration from (later wins):
      1. ~/.config/repofolio/config.toml (or $XDG_CONFIG_HOME/repofolio/config.toml)
      2. ./repofolio.toml
      3. Environment variables (REPOFOLIO_* prefix, sections separated by __)
      4. Command-line flags
    A .env file in the current directory is loaded first.

ENVIRONMENT VARIABLES
    GITHUB_TOKEN              API token (variable name set by api.token_env or --token-env)
    REPOFOLIO_MAX_ATTEMPTS    Attempts per request, clamped to 1-20 (default: 6)
    REPOFOLIO_API__BASE_URL   API base URL (default: https://api.github.com)
    RUST_LOG                  Log filter (default: repofolio=info,repofolio_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan accounts and write the HTML report
    Report(ReportArgs),
    /// Show current rate limit status
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,

        /// API base URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Environment variable holding the API token
        #[arg(long, value_name = "NAME")]
        token_env: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    // Interactive runs show progress bars, so only warnings reach the log
    let default_filter = if Term::stdout().is_term() {
        "repofolio=warn,repofolio_cli=warn"
    } else {
        "repofolio=info,repofolio_cli=info"
    };
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_filter),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Commands that don't need configuration
    match &cli.command {
        Commands::Completions { shell } => {
            return match commands::meta::handle_completions(*shell) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(&e),
            };
        }
        Commands::Man { output } => {
            return match commands::meta::handle_man(output.clone()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(&e),
            };
        }
        _ => {}
    }

    let config = config::Config::load();

    match cli.command {
        Commands::Report(args) => match commands::report::handle_report(args, &config).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(e.exit_code())
            }
        },
        Commands::Limits {
            output,
            base_url,
            token_env,
        } => {
            let overrides = ApiOverrides {
                base_url,
                token_env,
                ..ApiOverrides::default()
            };
            match commands::limits::handle_limits(output, &config, &overrides).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(&e),
            }
        }
        Commands::Completions { .. } | Commands::Man { .. } => ExitCode::SUCCESS,
    }
}

fn fail(e: &dyn std::error::Error) -> ExitCode {
    eprintln!("Error: {}", e);
    ExitCode::FAILURE
}
