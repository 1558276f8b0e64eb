//! Load diagnostics.

use std::fmt;
use std::path::PathBuf;

use crate::error::SpecError;

/// A non-fatal degradation recorded while loading a spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadWarning {
    /// A reference could not be found and was replaced by a generic object.
    UnresolvedReference {
        /// Spec being loaded.
        spec: String,
        /// Reference as written.
        reference: String,
    },
    /// A reference cycle was cut with a placeholder schema.
    CircularReference {
        /// Spec being loaded.
        spec: String,
        /// Reference that closed the cycle.
        reference: String,
    },
    /// Reference expansion stopped at the nesting or size limit and the rest
    /// of the schema was replaced by a generic object.
    ExpansionLimit {
        /// Spec being loaded.
        spec: String,
        /// Reference that was not expanded.
        reference: String,
    },
    /// An operation could not be turned into a tool.
    SkippedOperation {
        /// Spec being loaded.
        spec: String,
        /// Path item key.
        path: String,
        /// Method key.
        method: String,
        /// Why it was skipped.
        reason: String,
    },
    /// A parameter was not exposed to callers.
    SkippedParameter {
        /// Spec being loaded.
        spec: String,
        /// Tool the parameter belonged to.
        tool: String,
        /// Parameter name, or the reference when unresolved.
        parameter: String,
        /// Why it was skipped.
        reason: String,
    },
    /// Two operations produced the same name; the later one was renamed.
    RenamedTool {
        /// Spec being loaded.
        spec: String,
        /// Name before disambiguation.
        original: String,
        /// Name after disambiguation.
        renamed: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference { spec, reference } => {
                write!(f, "{spec}: referenced schema not found: {reference}")
            }
            Self::CircularReference { spec, reference } => {
                write!(f, "{spec}: circular reference to {reference}")
            }
            Self::ExpansionLimit { spec, reference } => {
                write!(f, "{spec}: schema too deep or too large, {reference} left unexpanded")
            }
            Self::SkippedOperation {
                spec,
                path,
                method,
                reason,
            } => write!(f, "{spec}: skipped {method} {path}: {reason}"),
            Self::SkippedParameter {
                spec,
                tool,
                parameter,
                reason,
            } => write!(f, "{spec}: {tool}: skipped parameter {parameter}: {reason}"),
            Self::RenamedTool {
                spec,
                original,
                renamed,
            } => write!(f, "{spec}: duplicate tool name {original} renamed to {renamed}"),
        }
    }
}

/// Tool count of one loaded spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedSpecSummary {
    /// Spec name.
    pub name: String,
    /// Number of tools registered for it.
    pub tool_count: usize,
    /// File the spec was read from, if any.
    pub source: Option<PathBuf>,
}

/// Outcome of loading a set of spec documents.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Specs that loaded, in load order.
    pub loaded: Vec<LoadedSpecSummary>,
    /// Files that failed to load.
    pub failed: Vec<(PathBuf, SpecError)>,
    /// Non-fatal degradations.
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    /// Total number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.loaded.iter().map(|spec| spec.tool_count).sum()
    }
}
