//! Error types for the lead flow.

use crate::api::SubmissionErrorKind;
use crate::validate::FieldId;

/// Top-level error type for the flow.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("API base URL must not be empty")]
    EmptyBaseUrl,
}

/// Errors from calls to the remote job service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Submission rejected ({http_status}): {kind}")]
    Submission {
        kind: SubmissionErrorKind,
        http_status: u16,
    },

    #[error("Context update rejected ({http_status})")]
    ContextUpdate { http_status: u16 },

    #[error("Status check failed ({http_status})")]
    Status { http_status: u16 },
}

/// Orchestration errors local to the flow instance.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("No active job; a submitted job id is required")]
    NoActiveJob,

    #[error("Usage limit reached for this session")]
    UsageLimitReached,

    #[error("Field {0} failed validation")]
    InvalidField(FieldId),
}

/// Result type alias for the flow.
pub type Result<T> = std::result::Result<T, Error>;
