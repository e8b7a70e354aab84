//! Terminal rendering of the flow — stderr for chrome, stdout for content.

use crate::api::{CompanyContext, SubmissionErrorKind};
use crate::phase::FlowPhase;
use crate::validate::FieldId;
use crate::view::FlowView;

/// Renders the flow as plain terminal output.
pub struct CliView;

impl CliView {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliView {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowView for CliView {
    fn show_phase(&self, phase: FlowPhase) {
        let banner = match phase {
            FlowPhase::CompanyInput => "── Step 1: Tell us about your company ──",
            FlowPhase::ContextEdit => "── Step 2: Review what we found ──",
            FlowPhase::Loading => "── Step 3: Building your lead list ──",
            FlowPhase::Done => "── Done: your leads are on the way ──",
        };
        eprintln!("\n{banner}");
    }

    fn set_field_error(&self, field: FieldId, has_error: bool) {
        if has_error {
            eprintln!("⚠️  {field} looks invalid");
        }
    }

    fn set_action_enabled(&self, _phase: FlowPhase, _enabled: bool) {
        // Terminal prompts re-ask instead of greying a button out.
    }

    fn set_submitting(&self, submitting: bool) {
        if submitting {
            eprintln!("⏳ Submitting…");
        }
    }

    fn show_analysis_pending(&self) {
        eprintln!("⏳ Analyzing your company — this can take a little while…");
    }

    fn show_submission_error(&self, kind: SubmissionErrorKind) {
        let message = match kind {
            SubmissionErrorKind::InvalidEmail => "That email address was rejected.",
            SubmissionErrorKind::InvalidDomain => "That company domain was rejected.",
            SubmissionErrorKind::EmailAlreadyExists => "This email has already been used.",
            SubmissionErrorKind::EmailUsedTooManyTimes => {
                "This email has hit its submission limit."
            }
            SubmissionErrorKind::EmailAndDomainAlreadySubmitted => {
                "This email and domain were already submitted together."
            }
            SubmissionErrorKind::InvalidStatus => "The job is in an unexpected state.",
            SubmissionErrorKind::JobNotFound => "The job could not be found.",
            SubmissionErrorKind::Internal => "Something went wrong on our side. Try again.",
        };
        eprintln!("❌ {message}");
    }

    fn clear_submission_errors(&self) {}

    fn show_usage_exhausted(&self) {
        eprintln!("🚫 You've reached the limit for this session. Come back later.");
    }

    fn set_company_name(&self, name: &str) {
        eprintln!("🏷  Company: {name}");
    }

    fn set_lead_email(&self, email: &str) {
        eprintln!("📬 Leads will be sent to {email}");
    }

    fn set_company_domain(&self, domain: &str) {
        eprintln!("🔎 Working on {domain}");
    }

    fn prefill_company_context(&self, context: &CompanyContext) {
        println!("\nWhat we found:");
        println!("  Business:    {}", context.business_description);
        println!("  Ideal buyer: {}", context.icp);
        println!("  Value prop:  {}", context.value_proposition);
    }
}
