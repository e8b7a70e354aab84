//! Timer-driven status polling.
//!
//! At most one poll runs per flow instance. Starting a poll evicts any
//! active one, so the "only one at a time" rule is held by the single
//! slot rather than by caller discipline. A tick that fails is retried on
//! the next tick, indefinitely: no cap, no backoff, no user-visible
//! error.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::{CompanyContext, JobId, JobStatus, LeadsApi};

/// Which terminal condition a poll is watching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// After the initial submission: waiting for the backend to ask for
    /// company context (or to finish outright).
    CompanyContext,
    /// After the context update: waiting for completion only.
    Completion,
}

/// Outcome of a poll, delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// The backend wants user input and provided a pre-fill payload.
    ContextReady(CompanyContext),
    /// The job finished.
    Completed,
}

struct ActivePoll {
    kind: PollKind,
    handle: JoinHandle<()>,
}

/// Single-slot poll state machine.
pub struct Poller {
    api: Arc<dyn LeadsApi>,
    interval: Duration,
    active: Option<ActivePoll>,
}

impl Poller {
    pub fn new(api: Arc<dyn LeadsApi>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            active: None,
        }
    }

    /// Start polling `job_id`, stopping any poll already running. Checks
    /// once immediately, then once per interval, until a terminal
    /// condition emits a [`FlowEvent`] and the task ends itself.
    pub fn start(&mut self, kind: PollKind, job_id: JobId, events: mpsc::Sender<FlowEvent>) {
        self.stop();

        let api = Arc::clone(&self.api);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let response = match api.check_status(&job_id).await {
                    Ok(response) => response,
                    Err(error) => {
                        tracing::debug!(job_id = %job_id, %error, "Poll tick failed; retrying next tick");
                        continue;
                    }
                };

                let event = match (kind, response.status) {
                    (PollKind::CompanyContext, JobStatus::WaitingForCompanyContextUserInput) => {
                        // A WAITING status without a payload is not yet
                        // actionable; keep polling until the pre-fill shows up.
                        response.company_context.map(FlowEvent::ContextReady)
                    }
                    (_, JobStatus::Completed) => Some(FlowEvent::Completed),
                    _ => None,
                };

                if let Some(event) = event {
                    if events.send(event).await.is_err() {
                        tracing::debug!(job_id = %job_id, "Flow gone before poll outcome was delivered");
                    }
                    break;
                }
            }
        });

        self.active = Some(ActivePoll { kind, handle });
    }

    /// Stop the active poll, if any, clearing its timer before anything
    /// else can transition.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
            tracing::debug!(kind = ?active.kind, "Stopped poll");
        }
    }

    /// The kind of the currently occupied slot, if any. A finished task
    /// still occupies the slot until `stop` clears it.
    pub fn active_kind(&self) -> Option<PollKind> {
        self.active.as_ref().map(|active| active.kind)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        // Flow teardown is the page-unload equivalent: nothing may keep
        // polling afterward.
        self.stop();
    }
}
