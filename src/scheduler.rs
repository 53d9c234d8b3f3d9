//! Fixed-interval background tasks.
//!
//! A [`PeriodicTask`] runs its action, sleeps for the interval, and repeats
//! until stopped. Executions never overlap: the next one starts an interval
//! after the previous one finished. A failing or panicking action is logged
//! and the loop carries on.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type Action = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identifies one run of a started task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Running {
    handle: TaskHandle,
    join: JoinHandle<()>,
}

pub struct PeriodicTask {
    name: String,
    interval: Duration,
    action: Action,
    running: Option<Running>,
}

impl PeriodicTask {
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            action: Arc::new(move || action().boxed()),
            running: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawns the loop on the current runtime. Starting a running task
    /// returns its existing handle.
    pub fn start(&mut self) -> TaskHandle {
        if let Some(running) = &self.running {
            return running.handle;
        }

        let handle = TaskHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        let join = tokio::spawn(run_loop(
            self.name.clone(),
            self.interval,
            Arc::clone(&self.action),
        ));
        info!(task = %self.name, interval_secs = self.interval.as_secs_f64(), "periodic task started");

        self.running = Some(Running { handle, join });
        handle
    }

    /// Cancels the loop and waits until it has ended. An execution in
    /// progress is cancelled at its next await point. Stopping a task that
    /// is not running does nothing.
    pub async fn stop(&mut self) {
        let Some(Running { join, .. }) = self.running.take() else {
            return;
        };

        join.abort();
        match join.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!(task = %self.name, error = %e, "periodic task ended abnormally"),
        }
        info!(task = %self.name, "periodic task stopped");
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.join.abort();
        }
    }
}

async fn run_loop(name: String, interval: Duration, action: Action) {
    loop {
        debug!(task = %name, "running periodic task");
        match AssertUnwindSafe(action()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(task = %name, error = ?e, "periodic task failed"),
            Err(panic) => error!(task = %name, panic = panic_message(&*panic), "periodic task panicked"),
        }
        tokio::time::sleep(interval).await;
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Owns the application's periodic tasks.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: PeriodicTask) {
        self.tasks.push(task);
    }

    pub fn start_all(&mut self) -> Vec<TaskHandle> {
        self.tasks.iter_mut().map(PeriodicTask::start).collect()
    }

    pub async fn stop_all(&mut self) {
        join_all(self.tasks.iter_mut().map(|task| task.stop())).await;
    }
}
