use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Checkpoint, PipelineFailure, Stage};

/// Events emitted by a [`super::Pipeline`] run, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    RunStarted { rows: usize },
    StageFinished { stage: Stage, rows: usize },
    Progress(Checkpoint),
    RunSucceeded { rows: usize, columns: usize },
    RunFailed(PipelineFailure),
}

/// Observer hook for pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards pipeline events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { rows } => info!(rows, "pipeline started"),
            PipelineEvent::StageFinished { stage, rows } => debug!(?stage, rows, "stage finished"),
            PipelineEvent::Progress(c) => debug!(percent = c.percent(), "progress"),
            PipelineEvent::RunSucceeded { rows, columns } => {
                info!(rows, columns, "pipeline succeeded");
            }
            PipelineEvent::RunFailed(failure) => {
                warn!(kind = ?failure.kind, message = %failure.message, "pipeline failed");
            }
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}
