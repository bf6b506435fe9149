//! Pipeline orchestration.
//!
//! A [`Pipeline`] runs the fixed stage sequence over a copy of the input table:
//!
//! 1. batch filter → [`Checkpoint::BatchFiltered`] (25%)
//! 2. index range filter → [`Checkpoint::RangeFiltered`] (50%)
//! 3. null-row elimination (if `remove_nulls`), then the empty-result check
//! 4. numeric coercion → [`Checkpoint::Coerced`] (75%)
//! 5. derived time-difference column (if `time_difference`)
//! 6. normalization (if `normalize`) → [`Checkpoint::Completed`] (100%)
//!
//! Every run ends in exactly one terminal outcome: the processed table, or a
//! [`PipelineFailure`] saying whether nothing matched the parameters
//! ([`FailureKind::NoData`]), a stage failed ([`FailureKind::Fault`]) or the run was
//! cancelled ([`FailureKind::Cancelled`]).

mod observer;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coercion::{convert_decimal_format, derive_numeric_column};
use crate::config::ProcessingConfig;
use crate::error::ProcessingError;
use crate::processing::filter::enabled;
use crate::processing::{drop_empty_rows, filter_by_batch, filter_by_index_range, normalize};
use crate::types::DataSet;

pub use observer::{CompositeObserver, PipelineEvent, PipelineObserver, TracingObserver};

/// Message reported when filtering leaves no rows.
pub const NO_DATA_MESSAGE: &str = "No data found with the specified parameters";

/// Parameters for one pipeline run. `0` disables the corresponding filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Keep only this batch (`Num_Lote`). `0` keeps every batch.
    pub lote_number: u64,
    /// Inclusive lower bound on the index column. `0` disables it.
    pub min_index: u64,
    /// Inclusive upper bound on the index column. `0` disables it.
    pub max_index: u64,
    /// Drop rows whose cells are all empty.
    pub remove_nulls: bool,
    /// Append min-max normalized columns.
    pub normalize: bool,
    /// Append the numeric time-difference column derived from the raw `t1_nS` readings.
    pub time_difference: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            lote_number: 0,
            min_index: 0,
            max_index: 0,
            remove_nulls: true,
            normalize: false,
            time_difference: false,
        }
    }
}

/// Coarse progress checkpoints, one per completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Checkpoint {
    BatchFiltered,
    RangeFiltered,
    Coerced,
    Completed,
}

impl Checkpoint {
    /// Progress percentage reported for this checkpoint.
    pub fn percent(self) -> u8 {
        match self {
            Self::BatchFiltered => 25,
            Self::RangeFiltered => 50,
            Self::Coerced => 75,
            Self::Completed => 100,
        }
    }
}

/// Individual processing stages, as reported in [`PipelineEvent::StageFinished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BatchFilter,
    RangeFilter,
    NullElimination,
    Coercion,
    TimeDifference,
    Normalization,
}

/// Lifecycle of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Why a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The parameters matched no rows. An expected outcome, not a fault.
    NoData,
    /// A stage failed unexpectedly.
    Fault,
    /// The run was cancelled before reaching a terminal state.
    Cancelled,
}

/// Terminal failure of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl PipelineFailure {
    pub fn no_data() -> Self {
        Self {
            kind: FailureKind::NoData,
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn fault(cause: impl fmt::Display) -> Self {
        Self {
            kind: FailureKind::Fault,
            message: format!("Error during processing: {cause}"),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: "processing cancelled".to_string(),
        }
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PipelineFailure {}

impl From<ProcessingError> for PipelineFailure {
    fn from(e: ProcessingError) -> Self {
        Self::fault(e)
    }
}

/// Terminal outcome of a run.
pub type PipelineOutcome = Result<DataSet, PipelineFailure>;

/// Sequences the processing stages for one parameter set at a time.
pub struct Pipeline {
    config: ProcessingConfig,
    observer: Option<Arc<dyn PipelineObserver>>,
    cancel: Option<Arc<AtomicBool>>,
    state: RunState,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl Pipeline {
    /// Create an idle pipeline.
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            config,
            observer: None,
            cancel: None,
            state: RunState::Idle,
        }
    }

    /// Attach an observer for progress and outcome events.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attach a cancellation flag, checked between stages.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Configuration used by this pipeline.
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// State of the most recent run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run all stages over a copy of `input`.
    ///
    /// `input` is never modified. Stage errors and panics are caught here and returned as
    /// [`FailureKind::Fault`]; no partial table is returned on failure.
    pub fn run(&mut self, input: &DataSet, params: &PipelineParams) -> PipelineOutcome {
        self.state = RunState::Running;
        self.emit(PipelineEvent::RunStarted {
            rows: input.row_count(),
        });

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.execute(input, params))) {
            Ok(result) => result,
            Err(payload) => Err(PipelineFailure::fault(panic_message(payload.as_ref()))),
        };

        match &outcome {
            Ok(ds) => {
                self.state = RunState::Succeeded;
                self.emit(PipelineEvent::RunSucceeded {
                    rows: ds.row_count(),
                    columns: ds.column_count(),
                });
            }
            Err(failure) => {
                self.state = RunState::Failed;
                self.emit(PipelineEvent::RunFailed(failure.clone()));
            }
        }
        outcome
    }

    fn execute(&self, input: &DataSet, params: &PipelineParams) -> PipelineOutcome {
        let cfg = &self.config;

        self.check_cancelled()?;
        let mut ds = match enabled(params.lote_number) {
            Some(id) => filter_by_batch(input, &cfg.identifier_column, id)?,
            None => input.clone(),
        };
        self.stage_finished(Stage::BatchFilter, &ds);
        self.emit(PipelineEvent::Progress(Checkpoint::BatchFiltered));

        self.check_cancelled()?;
        ds = filter_by_index_range(
            &ds,
            &cfg.index_column,
            enabled(params.min_index),
            enabled(params.max_index),
        )?;
        self.stage_finished(Stage::RangeFilter, &ds);
        self.emit(PipelineEvent::Progress(Checkpoint::RangeFiltered));

        if params.remove_nulls {
            ds = drop_empty_rows(&ds).0;
            self.stage_finished(Stage::NullElimination, &ds);
        }
        if ds.is_empty() {
            return Err(PipelineFailure::no_data());
        }

        self.check_cancelled()?;
        convert_decimal_format(&mut ds, &cfg.numeric_columns);
        self.stage_finished(Stage::Coercion, &ds);
        self.emit(PipelineEvent::Progress(Checkpoint::Coerced));

        if params.time_difference
            && derive_numeric_column(
                &mut ds,
                &cfg.time_difference_source,
                &cfg.time_difference_column,
            )
        {
            self.stage_finished(Stage::TimeDifference, &ds);
        }

        if params.normalize {
            self.check_cancelled()?;
            normalize(&mut ds, cfg.normalize_scope, &cfg.normalized_suffix);
            self.stage_finished(Stage::Normalization, &ds);
        }
        self.emit(PipelineEvent::Progress(Checkpoint::Completed));

        Ok(ds)
    }

    fn check_cancelled(&self) -> Result<(), PipelineFailure> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(PipelineFailure::cancelled()),
            _ => Ok(()),
        }
    }

    fn stage_finished(&self, stage: Stage, ds: &DataSet) {
        self.emit(PipelineEvent::StageFinished {
            stage,
            rows: ds.row_count(),
        });
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
