//! Batch orchestration for the apigate tool gateway.
//!
//! [`Orchestrator`] validates a batch, partitions it into dependency waves and
//! runs each wave through a [`TaskScheduler`] that caps the number of calls in
//! flight. Results always come back in request order, one per request.

#![warn(missing_docs, clippy::pedantic)]

mod history;
mod orchestrator;
mod plan;
mod scheduler;

pub use history::{ExecutionHistory, HistoryEntry, HistorySummary, ResultSink, TracingResultSink};
pub use orchestrator::{CancellationFlag, Orchestrator, ToolExecutor};
pub use plan::{BatchError, BatchPlan, BatchResult};
pub use scheduler::{
    DEFAULT_MAX_CONCURRENCY, SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler,
};
