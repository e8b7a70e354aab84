//! HTTP client for the job service.

use async_trait::async_trait;

use crate::api::types::{
    ApiErrorBody, CompanyContext, CompanyContextUpdate, CompanyInput, JobId, StatusResponse,
    SubmissionErrorKind, SubmitResponse,
};
use crate::config::FlowConfig;
use crate::error::ApiError;

/// Operations against the list-builder job service.
///
/// The flow controller and poller only see this trait; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait LeadsApi: Send + Sync {
    /// Connectivity probe. Callers ignore the outcome beyond logging.
    async fn probe(&self) -> Result<(), ApiError>;

    /// Create a job from the step-1 fields.
    async fn submit_initial_input(&self, input: &CompanyInput) -> Result<SubmitResponse, ApiError>;

    /// Send the user-edited company context for an existing job.
    async fn update_company_context(
        &self,
        id: &JobId,
        context: &CompanyContext,
    ) -> Result<(), ApiError>;

    /// Fetch the job's current status.
    async fn check_status(&self, id: &JobId) -> Result<StatusResponse, ApiError>;
}

/// reqwest-backed implementation.
pub struct HttpLeadsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLeadsApi {
    /// Build a client with the configured request timeout. The cap keeps
    /// a hung request from wedging a poll tick.
    pub fn new(config: &FlowConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl LeadsApi for HttpLeadsApi {
    async fn probe(&self) -> Result<(), ApiError> {
        self.client
            .request(reqwest::Method::OPTIONS, self.url("submit-input"))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        Ok(())
    }

    async fn submit_initial_input(&self, input: &CompanyInput) -> Result<SubmitResponse, ApiError> {
        let response = self
            .client
            .post(self.url("submit-input"))
            .json(input)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The service reports a status code in the JSON body; fall back
            // to the HTTP status when the body is absent or not JSON.
            let body = response.text().await.unwrap_or_default();
            let kind = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.status)
                .map(|code| SubmissionErrorKind::from_backend_status(&code))
                .unwrap_or_else(|| SubmissionErrorKind::from_http_status(status.as_u16()));
            return Err(ApiError::Submission {
                kind,
                http_status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    async fn update_company_context(
        &self,
        id: &JobId,
        context: &CompanyContext,
    ) -> Result<(), ApiError> {
        let body = CompanyContextUpdate {
            company_context: context.clone(),
        };
        let response = self
            .client
            .put(self.url(&format!("submit-input/{id}/company-context")))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::ContextUpdate {
                http_status: status.as_u16(),
            });
        }
        // Success body is arbitrary JSON the flow never reads.
        Ok(())
    }

    async fn check_status(&self, id: &JobId) -> Result<StatusResponse, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("status/{id}")))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                http_status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}
