//! Validation and wave partitioning of a batch.

use std::collections::HashMap;

use gateway_primitives::{RequestId, ToolCallRequest};
use thiserror::Error;

/// Result alias for batch validation.
pub type BatchResult<T> = Result<T, BatchError>;

/// A malformed batch, rejected before any call is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Two requests share an identifier.
    #[error("duplicate request id `{id}`")]
    DuplicateRequestId {
        /// Repeated identifier.
        id: RequestId,
    },

    /// A request depends on an identifier that is not in the batch.
    #[error("request `{request}` depends on unknown request `{dependency}`")]
    UnknownDependency {
        /// Request declaring the dependency.
        request: RequestId,
        /// Identifier that could not be found.
        dependency: RequestId,
    },
}

/// Dependency structure of a batch, expressed as request indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    dependencies: Vec<Vec<usize>>,
}

impl BatchPlan {
    /// Validates `requests` and resolves their dependency hints.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::DuplicateRequestId`] or
    /// [`BatchError::UnknownDependency`].
    pub fn new(requests: &[ToolCallRequest]) -> BatchResult<Self> {
        let mut index = HashMap::with_capacity(requests.len());
        for (position, request) in requests.iter().enumerate() {
            if index.insert(request.id(), position).is_some() {
                return Err(BatchError::DuplicateRequestId {
                    id: request.id().clone(),
                });
            }
        }

        let dependencies = requests
            .iter()
            .map(|request| {
                request
                    .depends_on()
                    .iter()
                    .map(|dependency| {
                        index.get(dependency).copied().ok_or_else(|| BatchError::UnknownDependency {
                            request: request.id().clone(),
                            dependency: dependency.clone(),
                        })
                    })
                    .collect::<BatchResult<Vec<_>>>()
            })
            .collect::<BatchResult<Vec<_>>>()?;

        Ok(Self { dependencies })
    }

    /// Number of requests in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns `true` for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Indices the request at `index` waits for.
    #[must_use]
    pub fn dependencies(&self, index: usize) -> &[usize] {
        self.dependencies.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Members of `pending` whose dependencies have all finished, in order.
    #[must_use]
    pub fn ready(&self, pending: &[usize], finished: &[bool]) -> Vec<usize> {
        pending
            .iter()
            .copied()
            .filter(|&index| {
                self.dependencies(index)
                    .iter()
                    .all(|&dependency| finished.get(dependency).copied().unwrap_or(false))
            })
            .collect()
    }

    /// Static preview of the schedule: the waves, and the indices that can
    /// never become ready because of a cycle.
    #[must_use]
    pub fn waves(&self) -> (Vec<Vec<usize>>, Vec<usize>) {
        let mut finished = vec![false; self.len()];
        let mut pending: Vec<usize> = (0..self.len()).collect();
        let mut waves = Vec::new();
        while !pending.is_empty() {
            let wave = self.ready(&pending, &finished);
            if wave.is_empty() {
                break;
            }
            for &index in &wave {
                finished[index] = true;
            }
            pending.retain(|index| !finished[*index]);
            waves.push(wave);
        }
        (waves, pending)
    }
}
