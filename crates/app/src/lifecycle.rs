//! Adapter lifecycle: the `Created → Started → Stopped` state machine and
//! the supervised task set it owns.
//!
//! Background tasks are spawned into a [`JoinSet`] and are never detached:
//! [`TaskSupervisor::stop`] raises the shutdown signal and joins every task
//! before returning. Tasks observe the signal through [`ShutdownSignal`] at
//! their suspension points.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinSet;

use twinbridge_domain::error::LifecycleError;

/// Where an adapter is in its lifetime. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Started,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Started => f.write_str("started"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// The task was asked to stop while suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task cancelled")]
pub struct Cancelled;

/// Receiving side of the supervisor's shutdown signal.
///
/// A dropped supervisor counts as a shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown is requested.
    pub async fn triggered(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }

    /// Drive `fut` unless shutdown is requested first.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when shutdown was requested before or while
    /// `fut` was pending; `fut` is dropped in that case.
    pub async fn run_until<F: Future>(&mut self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_triggered() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.triggered() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, then re-check the flag on wake.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if shutdown is requested before, during or
    /// right at the end of the sleep.
    pub async fn sleep(&mut self, duration: Duration) -> Result<(), Cancelled> {
        self.run_until(tokio::time::sleep(duration)).await?;
        if self.is_triggered() {
            return Err(Cancelled);
        }
        Ok(())
    }
}

/// Owns the lifecycle state and the background tasks of one adapter.
pub struct TaskSupervisor {
    name: String,
    state: LifecycleState,
    shutdown_tx: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl TaskSupervisor {
    /// Create a supervisor in the [`LifecycleState::Created`] state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            name: name.into(),
            state: LifecycleState::Created,
            shutdown_tx,
            tasks: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// A new receiver for the shutdown signal.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.shutdown_tx.subscribe())
    }

    /// Move from `Created` to `Started`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyStarted`] when already running,
    /// [`LifecycleError::Terminated`] after [`stop`](Self::stop) and
    /// [`LifecycleError::NoRuntime`] when called outside a tokio runtime,
    /// where [`spawn`](Self::spawn) could not run.
    pub fn begin(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Created if Handle::try_current().is_err() => {
                Err(LifecycleError::NoRuntime)
            }
            LifecycleState::Created => {
                self.state = LifecycleState::Started;
                tracing::debug!(adapter = %self.name, "lifecycle started");
                Ok(())
            }
            LifecycleState::Started => Err(LifecycleError::AlreadyStarted),
            LifecycleState::Stopped => Err(LifecycleError::Terminated),
        }
    }

    /// Spawn a supervised task.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime; [`begin`](Self::begin) refuses to
    /// start there.
    pub fn spawn<F>(&mut self, task: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let adapter = self.name.clone();
        self.tasks.spawn(async move {
            tracing::debug!(%adapter, task, "task started");
            fut.await;
            tracing::debug!(%adapter, task, "task ended");
        });
    }

    /// Number of tasks not joined yet.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every task to finish on its own, without signalling shutdown.
    pub async fn wait_idle(&mut self) {
        self.join_all().await;
    }

    /// Signal shutdown and join every task.
    ///
    /// A no-op unless the state is `Started`.
    pub async fn stop(&mut self) {
        if self.state != LifecycleState::Started {
            tracing::debug!(adapter = %self.name, state = %self.state, "stop ignored");
            return;
        }
        self.shutdown_tx.send_replace(true);
        self.join_all().await;
        self.state = LifecycleState::Stopped;
        tracing::info!(adapter = %self.name, "lifecycle stopped");
    }

    async fn join_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result {
                tracing::error!(adapter = %self.name, %err, "supervised task failed");
            }
        }
    }
}

impl fmt::Debug for TaskSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSupervisor")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("pending_tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
