//! Append-only record of executed calls.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use gateway_primitives::{ErrorKind, RequestId, ToolCallResult};
use serde::Serialize;
use tracing::debug;

/// Observer notified of every finished call.
pub trait ResultSink: Send + Sync {
    /// Records one result.
    fn record(&self, result: &ToolCallResult);
}

/// Sink that logs each result through `tracing`.
#[derive(Debug, Default)]
pub struct TracingResultSink;

impl ResultSink for TracingResultSink {
    fn record(&self, result: &ToolCallResult) {
        debug!(
            id = %result.request().id(),
            tool = result.request().tool(),
            success = result.is_success(),
            status = ?result.status_code(),
            elapsed_ms = result.execution_time().as_millis(),
            "tool call finished"
        );
    }
}

/// One executed call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// Request identifier.
    pub request_id: RequestId,
    /// Tool that was called.
    pub tool: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Failure classification of an unsuccessful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// HTTP status, if a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Time spent on the call.
    pub execution_time: Duration,
    /// When the entry was appended.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn from_result(result: &ToolCallResult) -> Self {
        Self {
            request_id: result.request().id().clone(),
            tool: result.request().tool().to_owned(),
            success: result.is_success(),
            error_kind: result.error().map(|error| error.kind()),
            status_code: result.status_code(),
            execution_time: result.execution_time(),
            recorded_at: Utc::now(),
        }
    }
}

/// Aggregate statistics over the history.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Number of recorded calls.
    pub total: usize,
    /// Calls that succeeded.
    pub successful: usize,
    /// Calls that failed.
    pub failed: usize,
    /// `successful / total`, or zero when empty.
    pub success_rate: f64,
    /// Mean execution time.
    pub average_execution_time: Duration,
    /// Sum of execution times.
    pub total_execution_time: Duration,
}

/// Lock-protected, append-only call log.
#[derive(Debug, Default)]
pub struct ExecutionHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl ExecutionHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// The last `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.entries();
        entries[entries.len().saturating_sub(n)..].to_vec()
    }

    /// Aggregates the whole history.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> HistorySummary {
        let entries = self.entries();
        let total = entries.len();
        if total == 0 {
            return HistorySummary::default();
        }
        let successful = entries.iter().filter(|entry| entry.success).count();
        let total_execution_time: Duration = entries.iter().map(|entry| entry.execution_time).sum();
        let divisor = u32::try_from(total).unwrap_or(u32::MAX);
        HistorySummary {
            total,
            successful,
            failed: total - successful,
            success_rate: successful as f64 / total as f64,
            average_execution_time: total_execution_time / divisor,
            total_execution_time,
        }
    }
}

impl ResultSink for ExecutionHistory {
    fn record(&self, result: &ToolCallResult) {
        self.entries().push(HistoryEntry::from_result(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_primitives::{CallError, ToolCallRequest};
    use serde_json::json;

    fn ok(ms: u64) -> ToolCallResult {
        ToolCallResult::success(
            ToolCallRequest::new("svc_ok", json!({})),
            json!({}),
            200,
            Duration::from_millis(ms),
        )
    }

    fn failed(ms: u64) -> ToolCallResult {
        ToolCallResult::failure(
            ToolCallRequest::new("svc_fail", json!({})),
            CallError::api(500, "boom"),
            Duration::from_millis(ms),
        )
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(ExecutionHistory::new().summary(), HistorySummary::default());
    }

    #[test]
    fn summary_aggregates_counts_and_times() {
        let history = ExecutionHistory::new();
        for result in [ok(10), ok(30), failed(20), ok(40)] {
            history.record(&result);
        }

        let summary = history.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(summary.total_execution_time, Duration::from_millis(100));
        assert_eq!(summary.average_execution_time, Duration::from_millis(25));
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let history = ExecutionHistory::new();
        history.record(&ok(1));
        history.record(&failed(2));
        history.record(&ok(3));

        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].error_kind, Some(ErrorKind::ApiError));
        assert_eq!(recent[1].execution_time, Duration::from_millis(3));
        assert_eq!(history.recent(10).len(), 3);
    }
}
