//! Concurrent, order-preserving batch execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_dispatch::Dispatcher;
use gateway_primitives::{CallError, ErrorKind, ToolCallRequest, ToolCallResult};
use tracing::{debug, error, info, warn};

use crate::history::{ExecutionHistory, HistorySummary, ResultSink};
use crate::plan::{BatchPlan, BatchResult};
use crate::scheduler::{SchedulerConfig, SchedulerError, TaskScheduler};

/// Executes a single tool call. Implementations must not fail; every
/// problem is reported inside the returned result.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Runs the call.
    async fn execute(&self, request: ToolCallRequest) -> ToolCallResult;
}

#[async_trait]
impl ToolExecutor for Dispatcher {
    async fn execute(&self, request: ToolCallRequest) -> ToolCallResult {
        Dispatcher::execute(self, request).await
    }
}

/// Shared flag that stops a batch from scheduling further waves.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Calls already in flight run to completion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs batches of tool calls in dependency waves under a concurrency
/// ceiling, returning results in request order.
pub struct Orchestrator {
    executor: Arc<dyn ToolExecutor>,
    config: SchedulerConfig,
    history: Arc<ExecutionHistory>,
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("history", &self.history.len())
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with an empty history.
    #[must_use]
    pub fn new(executor: Arc<dyn ToolExecutor>, config: SchedulerConfig) -> Self {
        Self {
            executor,
            config,
            history: Arc::new(ExecutionHistory::new()),
            sinks: Vec::new(),
        }
    }

    /// Records into an existing history instead of a fresh one.
    #[must_use]
    pub fn with_history(mut self, history: Arc<ExecutionHistory>) -> Self {
        self.history = history;
        self
    }

    /// Adds an observer notified of every result.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Concurrency configuration applied to each batch.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Execution history shared by all batches.
    #[must_use]
    pub fn history(&self) -> &Arc<ExecutionHistory> {
        &self.history
    }

    /// Aggregated statistics over every call executed so far.
    #[must_use]
    pub fn summary(&self) -> HistorySummary {
        self.history.summary()
    }

    /// Executes `requests` and returns one result per request, in order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`](crate::BatchError) for duplicate request ids
    /// or dependencies on unknown ids, before anything is dispatched.
    pub async fn execute_batch(&self, requests: Vec<ToolCallRequest>) -> BatchResult<Vec<ToolCallResult>> {
        self.execute_batch_with_cancel(requests, &CancellationFlag::new()).await
    }

    /// Like [`Orchestrator::execute_batch`], but stops scheduling new waves
    /// once `cancel` is set. Requests never scheduled come back as
    /// [`ErrorKind::Cancelled`] failures.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::execute_batch`].
    pub async fn execute_batch_with_cancel(
        &self,
        requests: Vec<ToolCallRequest>,
        cancel: &CancellationFlag,
    ) -> BatchResult<Vec<ToolCallResult>> {
        let plan = BatchPlan::new(&requests)?;
        let started = Instant::now();
        let scheduler = TaskScheduler::new(self.config);

        let mut results: Vec<Option<ToolCallResult>> = requests.iter().map(|_| None).collect();
        let mut finished = vec![false; requests.len()];
        let mut pending: Vec<usize> = (0..requests.len()).collect();
        let mut wave_count = 0_usize;

        while !pending.is_empty() && !cancel.is_cancelled() {
            let ready = plan.ready(&pending, &finished);
            if ready.is_empty() {
                warn!(
                    remaining = pending.len(),
                    "dependencies cannot be satisfied, running the rest sequentially"
                );
                for index in std::mem::take(&mut pending) {
                    if cancel.is_cancelled() {
                        break;
                    }
                    self.run_wave(&scheduler, &requests, &[index], &mut results, &mut finished)
                        .await;
                }
                break;
            }

            wave_count += 1;
            debug!(
                wave = wave_count,
                size = ready.len(),
                in_flight = scheduler.in_flight(),
                "dispatching wave"
            );
            pending.retain(|index| !ready.contains(index));
            self.run_wave(&scheduler, &requests, &ready, &mut results, &mut finished)
                .await;
        }
        scheduler.close();

        let ordered: Vec<ToolCallResult> = results
            .into_iter()
            .zip(requests)
            .map(|(result, request)| result.unwrap_or_else(|| cancelled(request)))
            .collect();

        let failed = ordered.iter().filter(|result| !result.is_success()).count();
        info!(
            calls = ordered.len(),
            failed,
            waves = wave_count,
            elapsed_ms = started.elapsed().as_millis(),
            "batch completed"
        );
        Ok(ordered)
    }

    async fn run_wave(
        &self,
        scheduler: &TaskScheduler,
        requests: &[ToolCallRequest],
        wave: &[usize],
        results: &mut [Option<ToolCallResult>],
        finished: &mut [bool],
    ) {
        let mut handles = Vec::with_capacity(wave.len());
        for &index in wave {
            let executor = Arc::clone(&self.executor);
            let request = requests[index].clone();
            match scheduler.spawn(async move { executor.execute(request).await }) {
                Ok(handle) => handles.push((index, handle)),
                Err(err) => self.finish(index, scheduling_failure(&requests[index], err), results, finished),
            }
        }

        for (index, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => scheduling_failure(&requests[index], err),
                Err(join) => {
                    error!(tool = requests[index].tool(), %join, "tool call task failed");
                    ToolCallResult::failure(
                        requests[index].clone(),
                        CallError::internal(format!("tool call task failed: {join}")),
                        Duration::ZERO,
                    )
                }
            };
            self.finish(index, result, results, finished);
        }
    }

    fn finish(
        &self,
        index: usize,
        result: ToolCallResult,
        results: &mut [Option<ToolCallResult>],
        finished: &mut [bool],
    ) {
        self.history.record(&result);
        for sink in &self.sinks {
            sink.record(&result);
        }
        finished[index] = true;
        results[index] = Some(result);
    }
}

fn scheduling_failure(request: &ToolCallRequest, err: SchedulerError) -> ToolCallResult {
    ToolCallResult::failure(
        request.clone(),
        CallError::internal(format!("tool call could not be scheduled: {err}")),
        Duration::ZERO,
    )
}

fn cancelled(request: ToolCallRequest) -> ToolCallResult {
    ToolCallResult::failure(
        request,
        CallError::new(ErrorKind::Cancelled, "batch cancelled before the call was scheduled"),
        Duration::ZERO,
    )
}
