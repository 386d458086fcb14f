use crate::config::ApiConfig;
use crate::config::constants::defaults;
use std::time::Duration;

/// Configuration for the provider's HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,
    /// How long to keep idle connections alive
    pub pool_idle_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 4,
            pool_idle_timeout: Duration::from_secs(90),
            request_timeout: Duration::from_secs(defaults::DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(defaults::DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: defaults::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&ApiConfig> for ClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            request_timeout: api.request_timeout(),
            connect_timeout: api.connect_timeout(),
            ..Self::default()
        }
    }
}
