use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use repofolio::{FetchError, FileDebugSink, ForgeClient, RetryConfig};

use crate::config::Config;

/// Command-line overrides for forge access. `None` keeps the configured value.
#[derive(Debug, Default, Clone)]
pub(crate) struct ApiOverrides {
    pub(crate) base_url: Option<String>,
    pub(crate) token_env: Option<String>,
    pub(crate) max_attempts: Option<i64>,
    /// Directory for debug artifacts; `None` disables them.
    pub(crate) debug_dir: Option<PathBuf>,
}

/// Attempt budget after applying overrides, before clamping.
pub(crate) fn requested_attempts(config: &Config, overrides: &ApiOverrides) -> i64 {
    overrides.max_attempts.unwrap_or(config.fetch.max_attempts)
}

/// Build a forge client from configuration and command-line overrides.
pub(crate) fn build_client(
    config: &Config,
    overrides: &ApiOverrides,
) -> Result<ForgeClient, FetchError> {
    let base_url = overrides
        .base_url
        .as_deref()
        .unwrap_or(&config.api.base_url);
    let token = config.token(overrides.token_env.as_deref());
    let retry = RetryConfig::with_max_attempts(requested_attempts(config, overrides));

    tracing::debug!(
        base_url,
        authenticated = token.is_some(),
        max_attempts = retry.max_attempts,
        "Building forge client"
    );

    let timeout = Duration::from_secs(config.api.timeout_secs);
    let mut client = ForgeClient::new(base_url, token, retry, timeout)?
        .with_user_agent(config.api.user_agent.clone());

    if let Some(dir) = &overrides.debug_dir {
        tracing::info!(dir = %dir.display(), "Saving request debug files");
        client = client.with_debug_sink(Arc::new(FileDebugSink::new(dir.clone())));
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let mut config = Config::default();
        config.fetch.max_attempts = 3;

        assert_eq!(requested_attempts(&config, &ApiOverrides::default()), 3);
        let overrides = ApiOverrides {
            max_attempts: Some(0),
            ..ApiOverrides::default()
        };
        assert_eq!(requested_attempts(&config, &overrides), 0);
    }

    #[test]
    fn build_client_clamps_attempts_and_uses_base_url_override() {
        let config = Config::default();
        let overrides = ApiOverrides {
            base_url: Some("http://127.0.0.1:9/api".to_string()),
            token_env: Some("REPOFOLIO_TEST_TOKEN_THAT_IS_NEVER_SET".to_string()),
            max_attempts: Some(99),
            debug_dir: None,
        };

        let client = build_client(&config, &overrides).expect("client should build");
        assert_eq!(client.retry_config().max_attempts, 20);
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:9/api");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn build_client_rejects_invalid_base_url() {
        let overrides = ApiOverrides {
            base_url: Some("not a url".to_string()),
            ..ApiOverrides::default()
        };
        assert!(matches!(
            build_client(&Config::default(), &overrides),
            Err(FetchError::InvalidBaseUrl { .. })
        ));
    }
}
