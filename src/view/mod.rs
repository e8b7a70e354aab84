//! Presentation seam for the flow.
//!
//! The controller never touches rendering directly; every visible effect
//! goes through this trait, which keeps the orchestration logic
//! unit-testable against a recording stub.

pub mod cli;

pub use cli::CliView;

use crate::api::{CompanyContext, SubmissionErrorKind};
use crate::phase::FlowPhase;
use crate::validate::FieldId;

/// Everything the flow can do to its presentation.
pub trait FlowView: Send + Sync {
    /// Show exactly this phase's region and heading, hiding all others.
    fn show_phase(&self, phase: FlowPhase);

    /// Set or clear a field's visible error state.
    fn set_field_error(&self, field: FieldId, has_error: bool);

    /// Enable or disable the action button of the given step.
    fn set_action_enabled(&self, phase: FlowPhase, enabled: bool);

    /// Toggle the submit button's in-flight spinner state.
    fn set_submitting(&self, submitting: bool);

    /// Reveal the "analyzing your company" text once the initial
    /// submission has been accepted.
    fn show_analysis_pending(&self);

    /// Show the error panel matching a rejected submission.
    fn show_submission_error(&self, kind: SubmissionErrorKind);

    /// Hide all submission error panels.
    fn clear_submission_errors(&self);

    /// Permanent maxed-out state: the form is gone for this session.
    fn show_usage_exhausted(&self);

    /// Broadcast the company name into the copy that mentions it.
    fn set_company_name(&self, name: &str);

    /// Broadcast the lead email into the completion copy.
    fn set_lead_email(&self, email: &str);

    /// Display the captured domain on the loading screen.
    fn set_company_domain(&self, domain: &str);

    /// Pre-fill the step-2 inputs from the backend's context payload and
    /// size them to their content.
    fn prefill_company_context(&self, context: &CompanyContext);
}
