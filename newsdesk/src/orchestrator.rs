//! Dispatches user actions to background tasks and applies their results.
//!
//! Every dispatch gets the next request id and cancels whatever was still in
//! flight. Tasks report back over a channel; the single consumer applies an
//! event only if its id is the latest one dispatched, so an older, slower
//! action can never overwrite the result of a newer one.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::llm::summarizer::SummaryResult;
use crate::processing::Backend;

/// What a finished task produced
#[derive(Debug)]
pub enum TaskOutcome {
    Summarized(SummaryResult),
    Refined(String),
    Failed(AppError),
}

/// A task result tagged with the id it was dispatched under
#[derive(Debug)]
pub struct TaskEvent {
    pub id: u64,
    pub outcome: TaskOutcome,
}

/// The two output panes plus a one-line status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub summary: String,
    pub insights: String,
    pub status: Option<String>,
}

pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    events: mpsc::UnboundedSender<TaskEvent>,
    last_id: u64,
    in_flight: Option<CancellationToken>,
    display: DisplayState,
}

impl Orchestrator {
    /// Returns the orchestrator and the receiving end its tasks report to
    pub fn new(backend: Arc<dyn Backend>) -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            backend,
            events,
            last_id: 0,
            in_flight: None,
            display: DisplayState::default(),
        };
        (orchestrator, rx)
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.display.status = Some(status.into());
    }

    /// True while the latest dispatched action has not reported back
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn dispatch_summarize(&mut self, api_key: String, url: String) -> u64 {
        let backend = Arc::clone(&self.backend);
        self.set_status("요약 중...");
        self.spawn("summarize", async move {
            match backend.summarize(&api_key, &url).await {
                Ok(result) => TaskOutcome::Summarized(result),
                Err(e) => TaskOutcome::Failed(e),
            }
        })
    }

    /// Refines the summary currently on display
    pub fn dispatch_refine(&mut self, api_key: String, instruction: String) -> u64 {
        let backend = Arc::clone(&self.backend);
        let current = self.display.summary.clone();
        self.set_status("요약 다듬는 중...");
        self.spawn("refine", async move {
            match backend.refine(&api_key, &current, &instruction).await {
                Ok(summary) => TaskOutcome::Refined(summary),
                Err(e) => TaskOutcome::Failed(e),
            }
        })
    }

    /// Cancels the in-flight action, if any; it will not report back.
    ///
    /// The id is retired too, so a result that finished just before the
    /// cancel and is already queued is treated as stale.
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            info!(id = self.last_id, "cancelling in-flight task");
            token.cancel();
            self.last_id += 1;
            self.set_status("취소되었습니다");
        }
    }

    fn spawn<F>(&mut self, action: &'static str, work: F) -> u64
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        self.last_id += 1;
        let id = self.last_id;

        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.replace(token.clone()) {
            debug!(id = id - 1, "superseded by a newer action");
            previous.cancel();
        }

        let events = self.events.clone();
        info!(id, action, "dispatching task");
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(id, action, "task cancelled");
                }
                outcome = work => {
                    if events.send(TaskEvent { id, outcome }).is_err() {
                        debug!(id, action, "result dropped, consumer gone");
                    }
                }
            }
        });
        id
    }

    /// Applies a task result. Returns false for stale results, which are dropped.
    pub fn apply(&mut self, event: TaskEvent) -> bool {
        if event.id != self.last_id {
            debug!(id = event.id, latest = self.last_id, "discarding stale result");
            return false;
        }
        self.in_flight = None;

        match event.outcome {
            TaskOutcome::Summarized(result) => {
                info!(id = event.id, "summary ready");
                self.display.summary = result.summary;
                self.display.insights = result.insights;
                self.display.status = Some("요약 완료".to_string());
            }
            TaskOutcome::Refined(summary) => {
                info!(id = event.id, "refined summary ready");
                self.display.summary = summary;
                self.display.status = Some("요약 다듬기 완료".to_string());
            }
            TaskOutcome::Failed(e) => {
                error!(id = event.id, kind = e.kind(), error = %e, "task failed");
                self.display.status = Some(e.to_string());
            }
        }
        true
    }
}
