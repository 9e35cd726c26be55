//! Dispatcher — FIFO lane with a minimum spacing between task starts.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use geolane_core::config::DEFAULT_MIN_INTERVAL_MS;
use geolane_core::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Queued work plus its completion handle, boxed for the lane.
type PendingTask = BoxFuture<'static, ()>;

/// Single-lane dispatcher.
///
/// At most one task runs at a time, tasks start in submission order, and the
/// start of each task is at least `min_interval` after the start of the one
/// before it. The queue is unbounded.
pub struct Dispatcher {
    min_interval: Duration,
    lane: Mutex<Option<mpsc::UnboundedSender<PendingTask>>>,
    state: Arc<LaneState>,
}

/// State that outlives any one lane worker.
struct LaneState {
    last_start: Mutex<Option<Instant>>,
    pending: AtomicUsize,
}

/// Decrements the pending count when the task starts or is dropped unrun.
struct PendingGuard(Arc<LaneState>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dispatcher {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            lane: Mutex::new(None),
            state: Arc::new(LaneState {
                last_start: Mutex::new(None),
                pending: AtomicUsize::new(0),
            }),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Tasks submitted but not yet started.
    pub fn pending(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    /// Enqueue `work` at the tail of the lane.
    ///
    /// The task is queued immediately, before the returned [`Ticket`] is
    /// polled. The ticket resolves with the work's output once it has run,
    /// or with [`Error::Dispatch`] if the work panicked or the lane could
    /// not run it. Must be called from within a tokio runtime for the work
    /// to run.
    pub fn submit<F, T>(&self, work: F) -> Ticket<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.state.pending.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard(self.state.clone());

        let task: PendingTask = Box::pin(async move {
            drop(guard);
            let outcome = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(value) => Ok(value),
                Err(_) => {
                    warn!("Dispatched task panicked");
                    Err(Error::Dispatch("task panicked".into()))
                }
            };
            // Receiver may have been dropped by an impatient caller
            let _ = tx.send(outcome);
        });

        self.enqueue(task);
        Ticket { rx }
    }

    fn enqueue(&self, task: PendingTask) {
        let mut lane = self.lane.lock();

        let task = match lane.as_ref() {
            Some(sender) => match sender.send(task) {
                Ok(()) => return,
                // Worker's runtime is gone; start a fresh lane below.
                Err(mpsc::error::SendError(task)) => task,
            },
            None => task,
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("Dispatcher used outside a tokio runtime; task dropped");
                *lane = None;
                return;
            }
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        if sender.send(task).is_err() {
            return;
        }
        handle.spawn(run_lane(receiver, self.min_interval, self.state.clone()));
        *lane = Some(sender);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MIN_INTERVAL_MS))
    }
}

/// Lane worker: runs queued tasks one by one, spacing their starts.
async fn run_lane(
    mut receiver: mpsc::UnboundedReceiver<PendingTask>,
    min_interval: Duration,
    state: Arc<LaneState>,
) {
    debug!("Dispatcher lane started (min interval {:?})", min_interval);

    while let Some(task) = receiver.recv().await {
        let last_start = *state.last_start.lock();
        if let Some(ready_at) = last_start.map(|last| last + min_interval) {
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *state.last_start.lock() = Some(Instant::now());
        task.await;
    }

    debug!("Dispatcher lane stopped");
}

/// Completion handle for a submitted task.
#[must_use = "tickets do nothing unless awaited"]
pub struct Ticket<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for Ticket<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(Error::Dispatch("task dropped before it ran".into())))
        })
    }
}
