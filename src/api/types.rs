//! Wire types for the job service.

use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the service on creation.
///
/// Immutable for the lifetime of a flow instance — every status check and
/// context update for the flow uses the id returned by the initial
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Step-1 submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub email: String,
    pub company_domain: String,
    pub company_name: String,
}

/// Response to a successful initial submission. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub id: JobId,
}

/// Job status reported by the service.
///
/// Only two tags drive transitions; everything else means "still in
/// progress, keep polling".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "WAITING_FOR_COMPANY_CONTEXT_USER_INPUT")]
    WaitingForCompanyContextUserInput,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(other)]
    Other,
}

impl JobStatus {
    /// Whether this status keeps a poll running.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Other)
    }
}

/// `GET /status/{id}` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub company_context: Option<CompanyContext>,
}

/// Business context for a company, supplied by the backend as a pre-fill
/// and sent back after the user edits it.
///
/// The backend's key spellings are unstable; the aliases below are the
/// full accepted set per field. Missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContext {
    #[serde(default, alias = "business_description", alias = "description")]
    pub business_description: String,
    #[serde(default, alias = "icpDescription", alias = "icp_description")]
    pub icp: String,
    #[serde(default, alias = "value_proposition", alias = "valueProp")]
    pub value_proposition: String,
}

impl CompanyContext {
    /// Whether any field carries content worth pre-filling.
    pub fn is_empty(&self) -> bool {
        self.business_description.trim().is_empty()
            && self.icp.trim().is_empty()
            && self.value_proposition.trim().is_empty()
    }
}

/// `PUT /submit-input/{id}/company-context` body wrapper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContextUpdate {
    pub company_context: CompanyContext,
}

/// Error body the service attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<String>,
}

/// Named error panels for step-1 submission failures.
///
/// The backend reports a `status` code in the error body; each code maps
/// to a dedicated panel, with `Internal` as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    InvalidEmail,
    InvalidDomain,
    EmailAlreadyExists,
    EmailUsedTooManyTimes,
    EmailAndDomainAlreadySubmitted,
    InvalidStatus,
    JobNotFound,
    Internal,
}

impl SubmissionErrorKind {
    /// Map a backend-reported status code to its panel. Unknown codes fall
    /// back to the internal-error panel.
    pub fn from_backend_status(status: &str) -> Self {
        match status {
            "invalid_email" => Self::InvalidEmail,
            "invalid_domain" => Self::InvalidDomain,
            "email_already_exists" => Self::EmailAlreadyExists,
            "email_used_too_many_times" => Self::EmailUsedTooManyTimes,
            "email_and_domain_already_submitted" => Self::EmailAndDomainAlreadySubmitted,
            "invalid_status" => Self::InvalidStatus,
            "job_not_found" => Self::JobNotFound,
            _ => Self::Internal,
        }
    }

    /// Fallback mapping when the error body carries no usable status code.
    pub fn from_http_status(code: u16) -> Self {
        match code {
            400 => Self::InvalidEmail,
            404 => Self::JobNotFound,
            _ => Self::Internal,
        }
    }
}

impl std::fmt::Display for SubmissionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidEmail => "invalid_email",
            Self::InvalidDomain => "invalid_domain",
            Self::EmailAlreadyExists => "email_already_exists",
            Self::EmailUsedTooManyTimes => "email_used_too_many_times",
            Self::EmailAndDomainAlreadySubmitted => "email_and_domain_already_submitted",
            Self::InvalidStatus => "invalid_status",
            Self::JobNotFound => "job_not_found",
            Self::Internal => "error",
        };
        write!(f, "{s}")
    }
}
