//! Cooperative cancellation for background tasks

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Receiving side of a stop request, passed into a task's loop
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// True once stop has been requested
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop has been requested (or the handle is gone)
    pub async fn stopped(&mut self) {
        // An Err means the sender was dropped, which also means stop
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Handle to a spawned background task
///
/// Dropping the handle requests a stop but does not wait for the task.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawns `task` with a fresh stop signal
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(StopSignal) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, rx) = watch::channel(false);
        let join = tokio::spawn(task(StopSignal { rx }));
        Self {
            name,
            stop_tx,
            join: Some(join),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Requests a stop without waiting
    pub fn request_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Requests a stop and waits for the task to exit
    pub async fn stop(mut self) {
        self.request_stop();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::error!(task = self.name, error = %e, "Background task panicked");
            }
        }
        tracing::debug!(task = self.name, "Background task stopped");
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}
