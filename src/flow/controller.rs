//! The flow controller — one instance per page load.
//!
//! Owns the phase, the form state, the job id and the poll slot, and
//! drives the view through the [`FlowView`] seam. All mutation happens in
//! the caller's task; the only concurrent piece is the poll task, which
//! communicates back through an event channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{CompanyContext, CompanyInput, JobId, LeadsApi};
use crate::config::FlowConfig;
use crate::error::{ApiError, FlowError, Result};
use crate::flow::poller::{FlowEvent, PollKind, Poller};
use crate::phase::FlowPhase;
use crate::usage::{CookieJar, UsageLimiter};
use crate::validate::{FieldId, FormFields, InputRules, TouchedFields};
use crate::view::FlowView;

/// Orchestrates the four-phase lead-capture flow.
pub struct FlowController {
    api: Arc<dyn LeadsApi>,
    view: Arc<dyn FlowView>,
    usage: UsageLimiter,
    rules: InputRules,
    poller: Poller,
    events_tx: mpsc::Sender<FlowEvent>,
    events_rx: mpsc::Receiver<FlowEvent>,
    phase: FlowPhase,
    job: Option<JobId>,
    fields: FormFields,
    touched: TouchedFields,
    /// Set when the session is maxed out: nothing is bound, every
    /// operation is inert.
    disabled: bool,
}

impl FlowController {
    pub fn new(
        config: &FlowConfig,
        api: Arc<dyn LeadsApi>,
        view: Arc<dyn FlowView>,
        jar: Arc<dyn CookieJar>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(8);
        Self {
            poller: Poller::new(Arc::clone(&api), config.poll_interval),
            usage: UsageLimiter::new(jar, config.usage_limit),
            api,
            view,
            rules: InputRules::new(),
            events_tx,
            events_rx,
            phase: FlowPhase::CompanyInput,
            job: None,
            fields: FormFields::default(),
            touched: TouchedFields::default(),
            disabled: false,
        }
    }

    /// Initialize the flow: probe the API, enforce the session usage
    /// limit, and show the first screen. A maxed-out session gets the
    /// permanent substitute state instead of a bound form.
    pub async fn init(&mut self) {
        if let Err(error) = self.api.probe().await {
            tracing::warn!(%error, "API connectivity probe failed");
        }

        // Any error panel left over from a previous render starts hidden.
        self.view.clear_submission_errors();

        if self.usage.is_exhausted() {
            tracing::info!(count = self.usage.count(), "Session usage exhausted; flow not bound");
            self.disabled = true;
            self.view.show_usage_exhausted();
            return;
        }

        self.navigate_to(FlowPhase::CompanyInput);
    }

    /// Whether the instance accepted initialization (not maxed out).
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job.as_ref()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Live edit of a field. Updates the owning step's button state but
    /// never surfaces errors while the user is still typing.
    pub fn on_field_changed(&mut self, field: FieldId, value: impl Into<String>) {
        if self.disabled {
            return;
        }
        self.fields.set(field, value);
        self.refresh_action(field.phase());
    }

    /// The user left a field: mark it touched and show its error state.
    pub fn on_field_blurred(&mut self, field: FieldId) {
        if self.disabled {
            return;
        }
        self.touched.touch(field);
        self.refresh_field_error(field);
        self.refresh_action(field.phase());
    }

    /// Submit step 1. On success the job id is fixed for the rest of the
    /// flow instance and the context poll starts; on rejection the mapped
    /// error panel is shown and the screen stays put.
    pub async fn submit_company(&mut self) -> Result<()> {
        self.guard()?;
        if let Some(field) = self.first_invalid_step1_field() {
            return Err(FlowError::InvalidField(field).into());
        }

        self.view.clear_submission_errors();
        self.view.set_submitting(true);

        let input = CompanyInput {
            email: self.fields.email.clone(),
            company_domain: self.fields.company_domain.clone(),
            company_name: self.fields.company_name.clone(),
        };

        match self.api.submit_initial_input(&input).await {
            Ok(response) => {
                tracing::info!(job_id = %response.id, "Job created");
                self.job = Some(response.id);
                self.view.show_analysis_pending();
                self.view.set_company_name(&self.fields.company_name);
                // Counted once, on the first successful submission only.
                self.usage.record_use();
                self.start_poll(PollKind::CompanyContext)?;
                Ok(())
            }
            Err(error) => {
                if let ApiError::Submission { kind, .. } = &error {
                    self.view.show_submission_error(*kind);
                } else {
                    // Transport-level failure: reset the button, no panel.
                    tracing::warn!(%error, "Initial submission failed before reaching the service");
                }
                self.view.set_submitting(false);
                Err(error.into())
            }
        }
    }

    /// Submit the edited context. Navigation to the loading screen happens
    /// before the PUT, and a PUT failure is swallowed — the completion
    /// poll decides the real outcome either way.
    pub async fn submit_context(&mut self) -> Result<()> {
        self.guard()?;
        if let Some(field) = self.first_invalid_step2_field() {
            return Err(FlowError::InvalidField(field).into());
        }
        let job = self.job.clone().ok_or(FlowError::NoActiveJob)?;

        self.view.set_lead_email(&self.fields.email);
        self.navigate_to(FlowPhase::Loading);

        let context = CompanyContext {
            business_description: self.fields.business_description.clone(),
            icp: self.fields.icp_description.clone(),
            value_proposition: self.fields.value_proposition.clone(),
        };
        if let Err(error) = self.api.update_company_context(&job, &context).await {
            tracing::warn!(job_id = %job, %error, "Context update failed; polling decides the outcome");
        }

        self.start_poll(PollKind::Completion)?;
        Ok(())
    }

    /// Back to step 1: stop whichever poll is active, discard the job,
    /// and reset the submit button.
    pub fn back_to_company_input(&mut self) {
        if self.disabled {
            return;
        }
        self.poller.stop();
        self.job = None;
        self.view.set_submitting(false);
        self.navigate_to(FlowPhase::CompanyInput);
    }

    /// Apply a poll outcome.
    pub fn handle_event(&mut self, event: FlowEvent) {
        // A poll stopped mid-flight can still have an outcome in the
        // channel; once the job is gone it is ignored.
        if self.job.is_none() {
            tracing::debug!(?event, "Stale poll outcome ignored");
            return;
        }
        self.poller.stop();
        match event {
            FlowEvent::ContextReady(context) => {
                self.prefill_context(&context);
                self.view.prefill_company_context(&context);
                self.navigate_to(FlowPhase::ContextEdit);
            }
            FlowEvent::Completed => {
                // One-way terminal transition; nothing polls or submits
                // after this.
                self.navigate_to(FlowPhase::Done);
            }
        }
    }

    /// Receive and apply the next poll outcome. Returns the event, or
    /// `None` if the flow is torn down.
    pub async fn process_next_event(&mut self) -> Option<FlowEvent> {
        let event = self.events_rx.recv().await?;
        self.handle_event(event.clone());
        Some(event)
    }

    /// Apply an already-delivered poll outcome without waiting.
    pub fn try_process_event(&mut self) -> Option<FlowEvent> {
        let event = self.events_rx.try_recv().ok()?;
        self.handle_event(event.clone());
        Some(event)
    }

    fn guard(&self) -> Result<()> {
        if self.disabled {
            return Err(FlowError::UsageLimitReached.into());
        }
        Ok(())
    }

    fn start_poll(&mut self, kind: PollKind) -> Result<()> {
        let job = self.job.clone().ok_or(FlowError::NoActiveJob)?;
        self.poller.start(kind, job, self.events_tx.clone());
        Ok(())
    }

    /// Show a phase and apply its entry side effects. Gating happened
    /// upstream; a transition outside the flow graph is only logged.
    fn navigate_to(&mut self, phase: FlowPhase) {
        if phase != self.phase && !self.phase.can_transition_to(phase) {
            tracing::debug!(from = %self.phase, to = %phase, "Transition outside the flow graph");
        }
        self.phase = phase;
        self.view.show_phase(phase);

        match phase {
            FlowPhase::CompanyInput => {
                self.refresh_step_errors(FlowPhase::CompanyInput);
                self.refresh_action(FlowPhase::CompanyInput);
            }
            FlowPhase::ContextEdit => {
                self.refresh_step_errors(FlowPhase::ContextEdit);
                self.refresh_action(FlowPhase::ContextEdit);
            }
            FlowPhase::Loading => {
                self.view.set_company_domain(&self.fields.company_domain);
            }
            FlowPhase::Done => {}
        }
    }

    /// Copy a pre-fill payload into the form, keeping existing values for
    /// any field the backend left blank.
    fn prefill_context(&mut self, context: &CompanyContext) {
        if !context.business_description.is_empty() {
            self.fields.business_description = context.business_description.clone();
        }
        if !context.icp.is_empty() {
            self.fields.icp_description = context.icp.clone();
        }
        if !context.value_proposition.is_empty() {
            self.fields.value_proposition = context.value_proposition.clone();
        }
    }

    fn refresh_field_error(&self, field: FieldId) {
        let visible = self.rules.field_error(&self.fields, field) && self.touched.contains(field);
        self.view.set_field_error(field, visible);
    }

    fn refresh_step_errors(&self, phase: FlowPhase) {
        for field in FieldId::all() {
            if field.phase() == phase {
                self.refresh_field_error(field);
            }
        }
    }

    fn refresh_action(&self, phase: FlowPhase) {
        self.view
            .set_action_enabled(phase, self.rules.step_valid(&self.fields, phase));
    }

    fn first_invalid_step1_field(&self) -> Option<FieldId> {
        if !self.rules.is_valid_work_email(&self.fields.email) {
            Some(FieldId::WorkEmail)
        } else if self.fields.company_name.trim().is_empty() {
            Some(FieldId::CompanyName)
        } else if !self.rules.is_valid_domain(&self.fields.company_domain) {
            Some(FieldId::CompanyDomain)
        } else {
            None
        }
    }

    fn first_invalid_step2_field(&self) -> Option<FieldId> {
        if self.fields.business_description.trim().is_empty() {
            Some(FieldId::BusinessDescription)
        } else if self.fields.icp_description.trim().is_empty() {
            Some(FieldId::IcpDescription)
        } else if self.fields.value_proposition.trim().is_empty() {
            Some(FieldId::ValueProposition)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("phase", &self.phase)
            .field("job", &self.job)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}
