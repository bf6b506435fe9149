//! Background execution of pipeline runs.
//!
//! [`PipelineExecutor`] owns a `rayon` thread pool and runs each submitted [`Pipeline`] on a
//! worker, so callers (a CLI, an interactive front end) stay responsive while a run is in
//! progress. Progress and the terminal outcome come back over a channel as
//! [`PipelineMessage`]s:
//!
//! - zero or more [`PipelineMessage::Progress`], in checkpoint order
//! - exactly one [`PipelineMessage::Finished`], after which the channel closes

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::ProcessingConfig;
use crate::error::ProcessingResult;
use crate::pipeline::{
    Checkpoint, CompositeObserver, Pipeline, PipelineEvent, PipelineFailure, PipelineObserver,
    PipelineOutcome, PipelineParams,
};
use crate::types::DataSet;

/// Configuration for the [`PipelineExecutor`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Message sent from a worker to its [`PipelineHandle`].
#[derive(Debug)]
pub enum PipelineMessage {
    Progress(Checkpoint),
    Finished(PipelineOutcome),
}

/// Runs pipelines on a dedicated worker pool.
pub struct PipelineExecutor {
    pool: ThreadPool,
    config: ProcessingConfig,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("threads", &self.pool.current_num_threads())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl PipelineExecutor {
    /// Build the worker pool.
    ///
    /// `num_threads == Some(0)` is treated as one thread.
    pub fn new(opts: ExecutionOptions, config: ProcessingConfig) -> ProcessingResult<Self> {
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("pipeline-worker-{i}"))
            .build()?;

        Ok(Self {
            pool,
            config,
            observer: None,
        })
    }

    /// Attach an observer that sees every event of every submitted run.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue a run over `dataset` and return immediately.
    ///
    /// The worker owns `dataset`; the caller's copy (if any) is never touched.
    pub fn submit(&self, dataset: DataSet, params: PipelineParams) -> PipelineHandle {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let forward: Arc<dyn PipelineObserver> = Arc::new(ChannelObserver { tx: tx.clone() });
        let observer: Arc<dyn PipelineObserver> = match &self.observer {
            Some(obs) => Arc::new(CompositeObserver::new(vec![Arc::clone(obs), forward])),
            None => forward,
        };
        let mut pipeline = Pipeline::new(self.config.clone())
            .with_observer(observer)
            .with_cancel_flag(Arc::clone(&cancel));

        debug!(rows = dataset.row_count(), ?params, "submitting pipeline run");
        self.pool.spawn(move || {
            let outcome = pipeline.run(&dataset, &params);
            // The handle may already be gone; nobody is left to tell.
            let _ = tx.send(PipelineMessage::Finished(outcome));
        });

        PipelineHandle { rx, cancel }
    }
}

/// Receiving side of a submitted run.
#[derive(Debug)]
pub struct PipelineHandle {
    rx: Receiver<PipelineMessage>,
    cancel: Arc<AtomicBool>,
}

impl PipelineHandle {
    /// Block until the next message. `None` once the worker has finished and the channel is
    /// drained.
    pub fn recv(&self) -> Option<PipelineMessage> {
        self.rx.recv().ok()
    }

    /// Non-blocking variant of [`PipelineHandle::recv`].
    pub fn try_recv(&self) -> Option<PipelineMessage> {
        self.rx.try_recv().ok()
    }

    /// Ask the worker to stop at the next stage boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Block until the run finishes, discarding progress.
    pub fn wait(self) -> PipelineOutcome {
        self.wait_with_progress(|_| {})
    }

    /// Block until the run finishes, calling `on_progress` for each checkpoint.
    pub fn wait_with_progress<F>(self, mut on_progress: F) -> PipelineOutcome
    where
        F: FnMut(Checkpoint),
    {
        for msg in self.rx.iter() {
            match msg {
                PipelineMessage::Progress(checkpoint) => on_progress(checkpoint),
                PipelineMessage::Finished(outcome) => return outcome,
            }
        }
        Err(PipelineFailure::fault("worker exited without reporting a result"))
    }
}

struct ChannelObserver {
    tx: Sender<PipelineMessage>,
}

impl PipelineObserver for ChannelObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let PipelineEvent::Progress(checkpoint) = event {
            let _ = self.tx.send(PipelineMessage::Progress(*checkpoint));
        }
    }
}
