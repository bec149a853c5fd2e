//! Latest-value-wins debouncing for interactive input.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs an action with the most recent submitted value once input has been
/// quiet for a fixed window.
///
/// Each [`Debouncer::submit`] cancels the previously scheduled run and
/// schedules a new one. Dropping the debouncer cancels any pending run.
/// Must be used inside a Tokio runtime.
pub struct Debouncer<T> {
    window: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(window: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            window,
            action: Arc::new(action),
            pending: None,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn submit(&mut self, value: T) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }

        let action = Arc::clone(&self.action);
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action(value);
        }));
    }

    /// `true` while a scheduled run has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the pending run, if any, to fire.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the action.
    pub async fn settle(mut self) {
        let Some(task) = self.pending.take() else {
            return;
        };
        match task.await {
            Ok(()) => {}
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => tracing::debug!(error = %err, "debounced run was cancelled"),
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
