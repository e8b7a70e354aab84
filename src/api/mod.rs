//! Client for the remote list-builder job service.

pub mod client;
pub mod types;

pub use client::{HttpLeadsApi, LeadsApi};
pub use types::{
    CompanyContext, CompanyContextUpdate, CompanyInput, JobId, JobStatus, StatusResponse,
    SubmissionErrorKind, SubmitResponse,
};
