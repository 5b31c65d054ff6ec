use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP host configuration, read from `modules.api_ingress`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// "host:port"; when absent the server section decides.
    pub bind_addr: Option<String>,
    pub cors_enabled: bool,
    /// Deadline for a single request, handler and queries included.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            cors_enabled: true,
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
