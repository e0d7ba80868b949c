//! Wiki connection settings.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Action API endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://test2.wikipedia.org/w/api.php";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connect timeout applied to every request.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Settings for talking to one MediaWiki instance.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    /// Action API endpoint (`.../api.php`).
    pub endpoint: Url,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl WikiConfig {
    /// Build a config from raw settings, as supplied on the command line.
    ///
    /// A timeout of zero seconds disables the request timeout.
    pub fn new(endpoint: &str, timeout_secs: u64, user_agent: Option<String>) -> Result<Self> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            user_agent: user_agent.unwrap_or_else(default_user_agent),
        })
    }

    /// Replace the endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }
}

impl Default for WikiConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            user_agent: default_user_agent(),
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("invalid wiki endpoint `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "wiki endpoint must be http or https, got `{other}`"
        ))),
    }
}

fn default_user_agent() -> String {
    format!(
        "{}/{} (MediaWiki edit tool)",
        crate::server::SERVER_NAME,
        crate::server::SERVER_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_test_wiki() {
        let config = WikiConfig::default();
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.user_agent.starts_with("wikipedia-mcp-server/"));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = WikiConfig::new("http://localhost/w/api.php", 0, None).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn custom_user_agent_is_kept() {
        let config =
            WikiConfig::new(DEFAULT_ENDPOINT, 5, Some("my-bot/1.0 (ops@example.org)".into()))
                .unwrap();
        assert_eq!(config.user_agent, "my-bot/1.0 (ops@example.org)");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn rejects_relative_or_non_http_endpoints() {
        assert!(matches!(
            WikiConfig::new("w/api.php", 30, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WikiConfig::default().with_endpoint("ftp://example.org/api.php"),
            Err(Error::Config(_))
        ));
    }
}
