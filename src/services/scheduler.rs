use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

// ---------------------------------------------------------------------------
// TaskName
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskName {
    PricePoll,
    WhaleDetect,
}

impl TaskName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::PricePoll => "price_poll",
            TaskName::WhaleDetect => "whale_detect",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct TaskHandle {
    join: JoinHandle<()>,
    interval_tx: watch::Sender<Duration>,
    trigger_tx: mpsc::Sender<()>,
}

/// Owns the periodic tasks and their timers.
///
/// One task per name: spawning a name again aborts the previous task, so a
/// burst of re-registrations (visibility flapping, reconfiguration) can
/// never leave two timers racing for the same engine. Cycles run to
/// completion before the next wait starts — a task's cycles are strictly
/// serial, and a manual trigger rides the same loop instead of forking a
/// parallel execution.
#[derive(Clone, Default)]
pub struct Scheduler {
    tasks: Arc<Mutex<HashMap<TaskName, TaskHandle>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a named periodic task. The first cycle runs after
    /// `initial_delay` (or on an earlier trigger), later cycles after the
    /// current interval.
    pub async fn spawn<F, Fut>(
        &self,
        name: TaskName,
        initial_delay: Duration,
        every: Duration,
        cycle: F,
    ) where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (interval_tx, interval_rx) = watch::channel(every);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let join = tokio::spawn(run_task(name, initial_delay, interval_rx, trigger_rx, cycle));

        let mut tasks = self.tasks.lock().await;
        if let Some(old) = tasks.insert(
            name,
            TaskHandle {
                join,
                interval_tx,
                trigger_tx,
            },
        ) {
            old.join.abort();
            tracing::debug!(task = %name, "Replaced existing scheduled task");
        }
        tracing::info!(
            task = %name,
            initial_delay_ms = initial_delay.as_millis() as u64,
            every_ms = every.as_millis() as u64,
            "Scheduled task"
        );
    }

    /// Reprogram a task's period. Setting the period it already has is a
    /// no-op and does not disturb the pending tick.
    pub async fn set_interval(&self, name: TaskName, every: Duration) {
        let tasks = self.tasks.lock().await;
        let Some(task) = tasks.get(&name) else {
            tracing::debug!(task = %name, "Interval change for unknown task ignored");
            return;
        };
        let changed = task.interval_tx.send_if_modified(|current| {
            if *current == every {
                false
            } else {
                *current = every;
                true
            }
        });
        if changed {
            tracing::info!(task = %name, every_ms = every.as_millis() as u64, "Task interval changed");
        }
    }

    /// Request an immediate cycle. Coalesces: while one request is pending,
    /// further requests are dropped.
    pub async fn trigger(&self, name: TaskName) {
        let tasks = self.tasks.lock().await;
        if let Some(task) = tasks.get(&name) {
            let _ = task.trigger_tx.try_send(());
        }
    }

    /// Abort every task. Safe to call more than once.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        for (name, task) in tasks.drain() {
            task.join.abort();
            tracing::info!(task = %name, "Stopped scheduled task");
        }
    }
}

async fn run_task<F, Fut>(
    name: TaskName,
    initial_delay: Duration,
    mut interval_rx: watch::Receiver<Duration>,
    mut trigger_rx: mpsc::Receiver<()>,
    mut cycle: F,
) where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // First cycle: wait out the initial delay unless triggered earlier.
    tokio::select! {
        _ = tokio::time::sleep(initial_delay) => {}
        received = trigger_rx.recv() => {
            if received.is_none() {
                return;
            }
        }
    }

    loop {
        cycle().await;

        let deadline = Instant::now() + *interval_rx.borrow_and_update();
        let sleep = sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                received = trigger_rx.recv() => match received {
                    Some(()) => break,
                    // Control channels gone: the scheduler was dropped.
                    None => return,
                },
                changed = interval_rx.changed() => match changed {
                    Ok(()) => {
                        let next = Instant::now() + *interval_rx.borrow_and_update();
                        sleep.as_mut().reset(next);
                    }
                    Err(_) => return,
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
