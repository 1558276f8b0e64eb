//! Permit-gated spawning of tool calls.
//!
//! A [`TaskScheduler`] holds a fixed pool of call permits. Every spawned call
//! waits for a permit before it starts and returns it when done, so no more
//! than [`SchedulerConfig::max_concurrency`] calls are ever in flight no matter
//! how large a wave is.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Default number of tool calls in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(4);

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Failure to run a call through the scheduler.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The permit pool was closed before the call obtained a permit.
    #[error("scheduler closed before the call could start")]
    Closed,
}

/// Concurrency ceiling for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    max_concurrency: NonZeroUsize,
}

impl SchedulerConfig {
    /// Creates a configuration with the given ceiling.
    #[must_use]
    pub const fn new(max_concurrency: NonZeroUsize) -> Self {
        Self { max_concurrency }
    }

    /// Creates a configuration from a plain count; zero is raised to one.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self::new(NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN))
    }

    /// Ceiling on simultaneously running calls.
    #[must_use]
    pub const fn max_concurrency(self) -> NonZeroUsize {
        self.max_concurrency
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Spawns calls onto the tokio runtime behind a shared permit pool.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    permits: Arc<Semaphore>,
    config: SchedulerConfig,
}

impl TaskScheduler {
    /// Creates a scheduler with a full permit pool.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrency().get())),
            config,
        }
    }

    /// Configuration the pool was sized from.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Calls currently holding a permit.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.config
            .max_concurrency()
            .get()
            .saturating_sub(self.permits.available_permits())
    }

    /// Returns `true` once [`TaskScheduler::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Closes the pool. Calls still queued for a permit resolve to
    /// [`SchedulerError::Closed`]; running calls are unaffected.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Spawns `call`; it starts once a permit is free.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the pool is already closed. The
    /// join handle yields the same error if the pool closes while the call
    /// is still queued.
    pub fn spawn<F, T>(&self, call: F) -> SchedulerResult<JoinHandle<SchedulerResult<T>>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(SchedulerError::Closed);
        }

        let permits = Arc::clone(&self.permits);
        Ok(tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| SchedulerError::Closed)?;
            Ok(call.await)
        }))
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
