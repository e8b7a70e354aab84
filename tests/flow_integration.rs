//! Integration tests for the flow controller.
//!
//! A scripted stub stands in for the job service and a recording view
//! captures everything the controller renders, so each property of the
//! orchestration is observable without a real backend or UI.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use lead_flow::api::{
    CompanyContext, CompanyInput, JobId, JobStatus, LeadsApi, StatusResponse, SubmissionErrorKind,
    SubmitResponse,
};
use lead_flow::config::FlowConfig;
use lead_flow::error::ApiError;
use lead_flow::flow::{FlowController, FlowEvent};
use lead_flow::phase::FlowPhase;
use lead_flow::usage::{CookieJar, MemoryCookieJar, UsageLimiter, USAGE_COOKIE};
use lead_flow::validate::FieldId;
use lead_flow::view::FlowView;

/// Maximum time any await in these tests may take before we consider the
/// flow hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll fast so tests finish quickly; the cadence logic is interval-size
/// agnostic.
const TEST_POLL_INTERVAL: Duration = Duration::from_millis(20);

// ── Scripted backend ─────────────────────────────────────────────────

#[derive(Clone)]
enum StatusStep {
    InProgress,
    WaitingWith(CompanyContext),
    Completed,
    Fail,
}

impl StatusStep {
    fn to_result(&self) -> Result<StatusResponse, ApiError> {
        match self {
            Self::InProgress => Ok(StatusResponse {
                status: JobStatus::Other,
                company_context: None,
            }),
            Self::WaitingWith(context) => Ok(StatusResponse {
                status: JobStatus::WaitingForCompanyContextUserInput,
                company_context: Some(context.clone()),
            }),
            Self::Completed => Ok(StatusResponse {
                status: JobStatus::Completed,
                company_context: None,
            }),
            Self::Fail => Err(ApiError::Status { http_status: 500 }),
        }
    }
}

/// Stub job service: scripted status sequence (last step repeats), plus
/// request recording for the id round-trip checks.
struct StubApi {
    job_id: &'static str,
    submit_error: Option<SubmissionErrorKind>,
    put_fails: bool,
    script: Mutex<Vec<StatusStep>>,
    status_calls: AtomicUsize,
    status_ids: Mutex<Vec<String>>,
    context_ids: Mutex<Vec<String>>,
    submitted: Mutex<Vec<CompanyInput>>,
}

impl StubApi {
    fn new(script: Vec<StatusStep>) -> Self {
        Self {
            job_id: "job-123",
            submit_error: None,
            put_fails: false,
            script: Mutex::new(script),
            status_calls: AtomicUsize::new(0),
            status_ids: Mutex::new(Vec::new()),
            context_ids: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(kind: SubmissionErrorKind) -> Self {
        Self {
            submit_error: Some(kind),
            ..Self::new(vec![StatusStep::InProgress])
        }
    }

    fn with_failing_put(script: Vec<StatusStep>) -> Self {
        Self {
            put_fails: true,
            ..Self::new(script)
        }
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn status_ids(&self) -> Vec<String> {
        self.status_ids.lock().unwrap().clone()
    }

    fn context_ids(&self) -> Vec<String> {
        self.context_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeadsApi for StubApi {
    async fn probe(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn submit_initial_input(&self, input: &CompanyInput) -> Result<SubmitResponse, ApiError> {
        self.submitted.lock().unwrap().push(input.clone());
        match self.submit_error {
            Some(kind) => Err(ApiError::Submission {
                kind,
                http_status: 400,
            }),
            None => Ok(SubmitResponse {
                id: JobId::new(self.job_id),
            }),
        }
    }

    async fn update_company_context(
        &self,
        id: &JobId,
        _context: &CompanyContext,
    ) -> Result<(), ApiError> {
        self.context_ids.lock().unwrap().push(id.to_string());
        if self.put_fails {
            Err(ApiError::ContextUpdate { http_status: 500 })
        } else {
            Ok(())
        }
    }

    async fn check_status(&self, id: &JobId) -> Result<StatusResponse, ApiError> {
        self.status_ids.lock().unwrap().push(id.to_string());
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap();
        let step = &script[call.min(script.len() - 1)];
        step.to_result()
    }
}

// ── Recording view ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ViewCall {
    Phase(FlowPhase),
    FieldError(FieldId, bool),
    ActionEnabled(FlowPhase, bool),
    Submitting(bool),
    AnalysisPending,
    SubmissionError(SubmissionErrorKind),
    ClearErrors,
    UsageExhausted,
    CompanyName(String),
    LeadEmail(String),
    CompanyDomain(String),
    Prefill(CompanyContext),
}

#[derive(Default)]
struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: ViewCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn last_phase(&self) -> Option<FlowPhase> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                ViewCall::Phase(phase) => Some(phase),
                _ => None,
            })
    }

    fn has(&self, expected: &ViewCall) -> bool {
        self.calls().iter().any(|call| call == expected)
    }
}

impl FlowView for RecordingView {
    fn show_phase(&self, phase: FlowPhase) {
        self.push(ViewCall::Phase(phase));
    }
    fn set_field_error(&self, field: FieldId, has_error: bool) {
        self.push(ViewCall::FieldError(field, has_error));
    }
    fn set_action_enabled(&self, phase: FlowPhase, enabled: bool) {
        self.push(ViewCall::ActionEnabled(phase, enabled));
    }
    fn set_submitting(&self, submitting: bool) {
        self.push(ViewCall::Submitting(submitting));
    }
    fn show_analysis_pending(&self) {
        self.push(ViewCall::AnalysisPending);
    }
    fn show_submission_error(&self, kind: SubmissionErrorKind) {
        self.push(ViewCall::SubmissionError(kind));
    }
    fn clear_submission_errors(&self) {
        self.push(ViewCall::ClearErrors);
    }
    fn show_usage_exhausted(&self) {
        self.push(ViewCall::UsageExhausted);
    }
    fn set_company_name(&self, name: &str) {
        self.push(ViewCall::CompanyName(name.to_string()));
    }
    fn set_lead_email(&self, email: &str) {
        self.push(ViewCall::LeadEmail(email.to_string()));
    }
    fn set_company_domain(&self, domain: &str) {
        self.push(ViewCall::CompanyDomain(domain.to_string()));
    }
    fn prefill_company_context(&self, context: &CompanyContext) {
        self.push(ViewCall::Prefill(context.clone()));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn test_config() -> FlowConfig {
    FlowConfig {
        api_base_url: "http://stub.invalid".to_string(),
        poll_interval: TEST_POLL_INTERVAL,
        ..Default::default()
    }
}

fn found_context() -> CompanyContext {
    CompanyContext {
        business_description: "We sell anvils".to_string(),
        icp: "Coyotes".to_string(),
        value_proposition: "Heavy and fast".to_string(),
    }
}

struct Harness {
    controller: FlowController,
    api: Arc<StubApi>,
    view: Arc<RecordingView>,
    jar: Arc<MemoryCookieJar>,
}

async fn start_flow(api: StubApi) -> Harness {
    let api = Arc::new(api);
    let view = Arc::new(RecordingView::default());
    let jar = Arc::new(MemoryCookieJar::new());
    let mut controller = FlowController::new(
        &test_config(),
        Arc::clone(&api) as Arc<dyn LeadsApi>,
        Arc::clone(&view) as Arc<dyn FlowView>,
        Arc::clone(&jar) as Arc<dyn CookieJar>,
    );
    controller.init().await;
    Harness {
        controller,
        api,
        view,
        jar,
    }
}

fn fill_valid_step1(controller: &mut FlowController) {
    controller.on_field_changed(FieldId::WorkEmail, "jane@acme.io");
    controller.on_field_blurred(FieldId::WorkEmail);
    controller.on_field_changed(FieldId::CompanyName, "Acme");
    controller.on_field_blurred(FieldId::CompanyName);
    controller.on_field_changed(FieldId::CompanyDomain, "acme.io");
    controller.on_field_blurred(FieldId::CompanyDomain);
}

async fn next_event(controller: &mut FlowController) -> FlowEvent {
    timeout(TEST_TIMEOUT, controller.process_next_event())
        .await
        .expect("timed out waiting for poll outcome")
        .expect("flow torn down")
}

// ── Properties ───────────────────────────────────────────────────────

#[tokio::test]
async fn context_ready_on_third_poll_prefills_and_shows_step2() {
    let mut harness = start_flow(StubApi::new(vec![
        StatusStep::InProgress,
        StatusStep::InProgress,
        StatusStep::WaitingWith(found_context()),
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();
    assert_eq!(harness.controller.phase(), FlowPhase::CompanyInput);

    let event = next_event(&mut harness.controller).await;
    assert_eq!(event, FlowEvent::ContextReady(found_context()));

    // Stopped after exactly the terminal response, not before or after.
    assert_eq!(harness.api.status_calls(), 3);
    tokio::time::sleep(TEST_POLL_INTERVAL * 4).await;
    assert_eq!(harness.api.status_calls(), 3);

    assert_eq!(harness.view.last_phase(), Some(FlowPhase::ContextEdit));
    assert!(harness.view.has(&ViewCall::Prefill(found_context())));
    assert_eq!(
        harness.controller.fields().business_description,
        "We sell anvils"
    );
    assert_eq!(harness.controller.fields().icp_description, "Coyotes");
    assert_eq!(
        harness.controller.fields().value_proposition,
        "Heavy and fast"
    );
}

#[tokio::test]
async fn completed_during_context_poll_skips_step2() {
    let mut harness = start_flow(StubApi::new(vec![
        StatusStep::InProgress,
        StatusStep::Completed,
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();

    assert_eq!(next_event(&mut harness.controller).await, FlowEvent::Completed);
    assert_eq!(harness.controller.phase(), FlowPhase::Done);
    assert_eq!(harness.view.last_phase(), Some(FlowPhase::Done));

    // Step 2 never appeared.
    assert!(!harness.view.has(&ViewCall::Phase(FlowPhase::ContextEdit)));
}

#[tokio::test]
async fn failing_put_still_starts_completion_polling() {
    let mut harness = start_flow(StubApi::with_failing_put(vec![
        StatusStep::WaitingWith(found_context()),
        StatusStep::Completed,
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();
    assert_eq!(
        next_event(&mut harness.controller).await,
        FlowEvent::ContextReady(found_context())
    );

    // The PUT will fail; the flow must not care.
    harness.controller.submit_context().await.unwrap();
    assert_eq!(harness.view.last_phase(), Some(FlowPhase::Loading));
    assert_eq!(harness.api.context_ids(), vec!["job-123"]);

    assert_eq!(next_event(&mut harness.controller).await, FlowEvent::Completed);
    assert_eq!(harness.controller.phase(), FlowPhase::Done);

    // The PUT failure produced no user-visible error.
    let error_shown = harness
        .view
        .calls()
        .iter()
        .any(|call| matches!(call, ViewCall::SubmissionError(_)));
    assert!(!error_shown);
}

#[tokio::test]
async fn back_to_step1_stops_the_active_poll() {
    let mut harness = start_flow(StubApi::new(vec![StatusStep::InProgress])).await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();

    // Let a few ticks land, then leave the flow.
    tokio::time::sleep(TEST_POLL_INTERVAL * 3).await;
    harness.controller.back_to_company_input();
    assert_eq!(harness.view.last_phase(), Some(FlowPhase::CompanyInput));
    assert!(harness.controller.job_id().is_none());

    let calls_at_stop = harness.api.status_calls();
    tokio::time::sleep(TEST_POLL_INTERVAL * 5).await;
    assert_eq!(
        harness.api.status_calls(),
        calls_at_stop,
        "no status checks after leaving the flow"
    );

    // A straggler outcome, were one delivered, changes nothing visible.
    let views_before = harness.view.calls().len();
    let _ = harness.controller.try_process_event();
    harness.controller.handle_event(FlowEvent::Completed);
    assert_eq!(harness.view.calls().len(), views_before);
    assert_eq!(harness.controller.phase(), FlowPhase::CompanyInput);
}

#[tokio::test]
async fn job_id_is_stable_across_the_whole_flow() {
    let mut harness = start_flow(StubApi::new(vec![
        StatusStep::Fail,
        StatusStep::InProgress,
        StatusStep::WaitingWith(found_context()),
        StatusStep::Completed,
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();
    assert_eq!(
        harness.controller.job_id().map(|id| id.to_string()),
        Some("job-123".to_string())
    );

    next_event(&mut harness.controller).await;
    harness.controller.submit_context().await.unwrap();
    next_event(&mut harness.controller).await;
    assert_eq!(harness.controller.phase(), FlowPhase::Done);

    assert!(
        harness
            .api
            .status_ids()
            .iter()
            .all(|id| id == "job-123"),
        "every status check used the submitted job id"
    );
    assert_eq!(harness.api.context_ids(), vec!["job-123"]);
}

#[tokio::test]
async fn transient_poll_errors_never_reach_the_view() {
    let mut harness = start_flow(StubApi::new(vec![
        StatusStep::Fail,
        StatusStep::Fail,
        StatusStep::Completed,
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();
    assert_eq!(next_event(&mut harness.controller).await, FlowEvent::Completed);

    let error_shown = harness
        .view
        .calls()
        .iter()
        .any(|call| matches!(call, ViewCall::SubmissionError(_)));
    assert!(!error_shown, "poll failures must stay invisible");
}

#[tokio::test]
async fn rejected_submission_shows_mapped_panel_and_resets() {
    let mut harness =
        start_flow(StubApi::rejecting(SubmissionErrorKind::EmailAlreadyExists)).await;

    fill_valid_step1(&mut harness.controller);
    let result = harness.controller.submit_company().await;
    assert!(result.is_err());

    assert!(
        harness
            .view
            .has(&ViewCall::SubmissionError(SubmissionErrorKind::EmailAlreadyExists))
    );
    assert!(harness.view.has(&ViewCall::Submitting(false)));
    assert_eq!(harness.controller.phase(), FlowPhase::CompanyInput);
    assert!(harness.controller.job_id().is_none());

    // A rejected submission never counts against the session.
    let limiter = UsageLimiter::new(
        Arc::clone(&harness.jar) as Arc<dyn CookieJar>,
        5,
    );
    assert_eq!(limiter.count(), 0);
}

#[tokio::test]
async fn successful_submission_counts_once() {
    let mut harness = start_flow(StubApi::new(vec![StatusStep::InProgress])).await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();

    let limiter = UsageLimiter::new(Arc::clone(&harness.jar) as Arc<dyn CookieJar>, 5);
    assert_eq!(limiter.count(), 1, "exactly one use per successful submission");
}

#[tokio::test]
async fn exhausted_session_gets_the_maxed_state_instead_of_a_form() {
    let jar = Arc::new(MemoryCookieJar::new());
    jar.set_session(USAGE_COOKIE, "5");

    let api = Arc::new(StubApi::new(vec![StatusStep::InProgress]));
    let view = Arc::new(RecordingView::default());
    let mut controller = FlowController::new(
        &test_config(),
        Arc::clone(&api) as Arc<dyn LeadsApi>,
        Arc::clone(&view) as Arc<dyn FlowView>,
        Arc::clone(&jar) as Arc<dyn CookieJar>,
    );
    controller.init().await;

    assert!(!controller.is_enabled());
    assert!(view.has(&ViewCall::UsageExhausted));
    assert_eq!(view.last_phase(), None, "no step is ever shown");

    // Every operation is inert now.
    fill_valid_step1(&mut controller);
    assert!(controller.submit_company().await.is_err());
    assert!(api.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_at_four_uses_is_still_allowed() {
    let jar = Arc::new(MemoryCookieJar::new());
    jar.set_session(USAGE_COOKIE, "4");

    let api = Arc::new(StubApi::new(vec![StatusStep::InProgress]));
    let view = Arc::new(RecordingView::default());
    let mut controller = FlowController::new(
        &test_config(),
        Arc::clone(&api) as Arc<dyn LeadsApi>,
        Arc::clone(&view) as Arc<dyn FlowView>,
        Arc::clone(&jar) as Arc<dyn CookieJar>,
    );
    controller.init().await;

    assert!(controller.is_enabled());
    assert_eq!(view.last_phase(), Some(FlowPhase::CompanyInput));
    assert!(!view.has(&ViewCall::UsageExhausted));
}

#[tokio::test]
async fn button_state_tracks_live_validity_but_errors_wait_for_blur() {
    let mut harness = start_flow(StubApi::new(vec![StatusStep::InProgress])).await;

    // Typing a denylisted address updates the button, shows no error.
    harness
        .controller
        .on_field_changed(FieldId::WorkEmail, "jane@gmail.com");
    assert!(
        harness
            .view
            .has(&ViewCall::ActionEnabled(FlowPhase::CompanyInput, false))
    );
    assert!(!harness.view.has(&ViewCall::FieldError(FieldId::WorkEmail, true)));

    // Blur surfaces it.
    harness.controller.on_field_blurred(FieldId::WorkEmail);
    assert!(harness.view.has(&ViewCall::FieldError(FieldId::WorkEmail, true)));

    // A fully valid form enables the button.
    fill_valid_step1(&mut harness.controller);
    assert_eq!(
        harness
            .view
            .calls()
            .iter()
            .rev()
            .find_map(|call| match call {
                ViewCall::ActionEnabled(FlowPhase::CompanyInput, enabled) => Some(*enabled),
                _ => None,
            }),
        Some(true)
    );

    // Invalidating one field disables it again.
    harness
        .controller
        .on_field_changed(FieldId::CompanyDomain, "not a domain");
    assert_eq!(
        harness
            .view
            .calls()
            .iter()
            .rev()
            .find_map(|call| match call {
                ViewCall::ActionEnabled(FlowPhase::CompanyInput, enabled) => Some(*enabled),
                _ => None,
            }),
        Some(false)
    );
}

#[tokio::test]
async fn invalid_step1_never_reaches_the_wire() {
    let mut harness = start_flow(StubApi::new(vec![StatusStep::InProgress])).await;

    harness
        .controller
        .on_field_changed(FieldId::WorkEmail, "jane@gmail.com");
    harness.controller.on_field_changed(FieldId::CompanyName, "Acme");
    harness
        .controller
        .on_field_changed(FieldId::CompanyDomain, "acme.io");

    assert!(harness.controller.submit_company().await.is_err());
    assert!(harness.api.submitted.lock().unwrap().is_empty());
    assert_eq!(harness.api.status_calls(), 0);
}

#[tokio::test]
async fn loading_screen_shows_the_captured_domain() {
    let mut harness = start_flow(StubApi::new(vec![
        StatusStep::WaitingWith(found_context()),
        StatusStep::Completed,
    ]))
    .await;

    fill_valid_step1(&mut harness.controller);
    harness.controller.submit_company().await.unwrap();
    assert!(harness.view.has(&ViewCall::CompanyName("Acme".to_string())));

    next_event(&mut harness.controller).await;
    harness.controller.submit_context().await.unwrap();

    assert!(harness.view.has(&ViewCall::CompanyDomain("acme.io".to_string())));
    assert!(harness.view.has(&ViewCall::LeadEmail("jane@acme.io".to_string())));
}
