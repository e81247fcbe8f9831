use kapi_client::DEFAULT_PREFIX;
use serde::Deserialize;

/// Where and how to reach the keys API.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Base URLs of the servers, tried in order.
    pub endpoints: Vec<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Per-request timeout. 0 disables it, leaving long-polls bounded only by
    /// the caller's cancellation token.
    #[serde(default)]
    pub request_timeout_ms: u64,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            endpoints: vec!["http://127.0.0.1:2379".to_string()],
            prefix: default_prefix(),
            request_timeout_ms: 0,
        }
    }
}
