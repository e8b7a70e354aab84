//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default production endpoint for the list-builder job service.
pub const DEFAULT_API_BASE_URL: &str =
    "https://growth-api2.unifygtm.com/api/v1/agentic-list-builder";

/// Flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Base URL of the job service (no trailing slash).
    pub api_base_url: String,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Per-request timeout, so a hung request cannot wedge a poll tick.
    pub request_timeout: Duration,
    /// Maximum flow starts per browser session.
    pub usage_limit: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(20),
            usage_limit: 5,
        }
    }
}

impl FlowConfig {
    /// Build a config from `LEAD_FLOW_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("LEAD_FLOW_API_BASE") {
            let base = base.trim().trim_end_matches('/').to_string();
            if base.is_empty() {
                return Err(ConfigError::EmptyBaseUrl);
            }
            config.api_base_url = base;
        }
        if let Ok(secs) = std::env::var("LEAD_FLOW_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(parse_secs("LEAD_FLOW_POLL_INTERVAL_SECS", &secs)?);
        }
        if let Ok(secs) = std::env::var("LEAD_FLOW_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_secs("LEAD_FLOW_REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Ok(limit) = std::env::var("LEAD_FLOW_USAGE_LIMIT") {
            config.usage_limit =
                limit
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "LEAD_FLOW_USAGE_LIMIT".to_string(),
                        message: format!("{e}"),
                    })?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{e}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1 second".to_string(),
        });
    }
    Ok(secs)
}
