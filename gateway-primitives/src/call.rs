//! Tool call requests and results exchanged with the planner.

use std::time::Duration;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::failure::CallError;
use crate::ids::RequestId;

/// A single invocation of a tool by name with a JSON argument map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    id: RequestId,
    #[serde(alias = "tool_name")]
    tool: String,
    #[serde(default = "empty_arguments")]
    arguments: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<RequestId>,
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

impl ToolCallRequest {
    /// Creates a request with a random identifier.
    #[must_use]
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: RequestId::random(),
            tool: tool.into(),
            arguments,
            depends_on: Vec::new(),
        }
    }

    /// Overrides the request identifier.
    #[must_use]
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Declares that this request must run after the request with `id`.
    #[must_use]
    pub fn with_dependency(mut self, id: RequestId) -> Self {
        self.depends_on.push(id);
        self
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the qualified tool name.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Returns the raw argument value (normally a JSON object).
    #[must_use]
    pub fn arguments(&self) -> &Value {
        &self.arguments
    }

    /// Returns the declared dependency hints.
    #[must_use]
    pub fn depends_on(&self) -> &[RequestId] {
        &self.depends_on
    }
}

/// Payload or failure of a finished call.
#[derive(Clone, Debug, PartialEq)]
pub enum CallOutcome {
    /// The backend answered with a success status.
    Success(Value),
    /// The call failed; the error describes why.
    Failure(CallError),
}

/// One list that was shortened by response bounding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedField {
    /// Top-level field name, or `None` when the whole payload was a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Number of elements before truncation.
    pub total_count: usize,
    /// Number of elements kept.
    pub returned_count: usize,
}

/// Summary of every truncation applied to a payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationReport {
    /// Truncated lists in payload order.
    pub fields: Vec<TruncatedField>,
}

impl TruncationReport {
    /// Returns `true` when nothing was truncated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Typed result of one tool call, always produced instead of an exception.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallResult {
    request: ToolCallRequest,
    outcome: CallOutcome,
    status_code: Option<u16>,
    execution_time: Duration,
    truncation: Option<TruncationReport>,
}

impl ToolCallResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(
        request: ToolCallRequest,
        data: Value,
        status_code: u16,
        execution_time: Duration,
    ) -> Self {
        Self {
            request,
            outcome: CallOutcome::Success(data),
            status_code: Some(status_code),
            execution_time,
            truncation: None,
        }
    }

    /// Creates a failed result; the status code is taken from the error.
    #[must_use]
    pub fn failure(request: ToolCallRequest, error: CallError, execution_time: Duration) -> Self {
        Self {
            request,
            status_code: error.status_code(),
            outcome: CallOutcome::Failure(error),
            execution_time,
            truncation: None,
        }
    }

    /// Attaches truncation metadata, ignoring empty reports.
    #[must_use]
    pub fn with_truncation(mut self, report: TruncationReport) -> Self {
        self.truncation = (!report.is_empty()).then_some(report);
        self
    }

    /// Returns the originating request.
    #[must_use]
    pub fn request(&self) -> &ToolCallRequest {
        &self.request
    }

    /// Returns `true` if the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, CallOutcome::Success(_))
    }

    /// Returns the outcome.
    #[must_use]
    pub fn outcome(&self) -> &CallOutcome {
        &self.outcome
    }

    /// Returns the payload of a successful call.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Success(data) => Some(data),
            CallOutcome::Failure(_) => None,
        }
    }

    /// Returns the failure of an unsuccessful call.
    #[must_use]
    pub fn error(&self) -> Option<&CallError> {
        match &self.outcome {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure(error) => Some(error),
        }
    }

    /// Returns the HTTP status code, if a response was received.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns the wall-clock time spent on the call.
    #[must_use]
    pub const fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Returns truncation metadata when the payload was bounded.
    #[must_use]
    pub fn truncation(&self) -> Option<&TruncationReport> {
        self.truncation.as_ref()
    }

    /// Renders the outbound response envelope.
    #[must_use]
    pub fn envelope(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    id: &'a RequestId,
    tool: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a CallError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncation: Option<&'a TruncationReport>,
}

impl Serialize for ToolCallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            id: self.request.id(),
            tool: self.request.tool(),
            success: self.is_success(),
            data: self.data(),
            error: self.error(),
            status_code: self.status_code,
            execution_time: self.execution_time.as_secs_f64(),
            truncation: self.truncation.as_ref(),
        }
        .serialize(serializer)
    }
}
