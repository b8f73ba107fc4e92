// ── Generic resource poller ──
//
// Drives one `ResourceCell` from a fetch function, on demand and on a
// timer. Timer ticks spawn independent refreshes; overlapping refreshes
// are allowed and the cell's sequencing keeps the newest-issued result.
// Shutdown cancels and drains the timer's refreshes, then closes the cell.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::cell::{Completion, ResourceCell, ResourceState};
use crate::error::CoreError;
use crate::stream::ResourceStream;

type FetchFn<T> = dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync;
type AppliedHook<T> = dyn Fn(&ResourceState<T>) + Send + Sync;

/// Periodic fetcher for one resource. Cheaply cloneable.
pub struct Poller<T: Send + Sync + 'static> {
    inner: Arc<PollerInner<T>>,
}

impl<T: Send + Sync + 'static> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PollerInner<T: Send + Sync + 'static> {
    cell: ResourceCell<T>,
    fetch: Box<FetchFn<T>>,
    on_applied: Option<Box<AppliedHook<T>>>,
    timer: Mutex<Option<Timer>>,
}

struct Timer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    refreshes: TaskTracker,
}

impl<T: Send + Sync + 'static> Poller<T> {
    pub(crate) fn new<F>(name: &'static str, fetch: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync + 'static,
    {
        Self::build(name, fetch, None)
    }

    /// Like [`new`](Self::new), with a hook that runs after every
    /// successfully applied snapshot.
    pub(crate) fn with_hook<F, H>(name: &'static str, fetch: F, hook: H) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync + 'static,
        H: Fn(&ResourceState<T>) + Send + Sync + 'static,
    {
        Self::build(name, fetch, Some(Box::new(hook)))
    }

    fn build<F>(name: &'static str, fetch: F, on_applied: Option<Box<AppliedHook<T>>>) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(PollerInner {
                cell: ResourceCell::new(name),
                fetch: Box::new(fetch),
                on_applied,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.cell.name()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<ResourceState<T>> {
        self.inner.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ResourceState<T>>> {
        self.inner.cell.subscribe()
    }

    pub fn stream(&self) -> ResourceStream<T> {
        ResourceStream::new(self.subscribe())
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch once and fold the result into the cell.
    ///
    /// Errors are recorded in the resource state *and* returned. A result
    /// that lost the race to a newer refresh is dropped and reported as
    /// [`Completion::Stale`].
    pub async fn refresh(&self) -> Result<Completion, CoreError> {
        let ticket = self.inner.cell.begin();
        let seq = ticket.seq();

        match (self.inner.fetch)().await {
            Ok(value) => {
                let completion = self.inner.cell.complete(ticket, Ok(value));
                if completion == Completion::Applied {
                    debug!(resource = self.name(), seq, "snapshot applied");
                    self.run_hook();
                }
                Ok(completion)
            }
            Err(e) => {
                self.inner.cell.complete(ticket, Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Install a value without fetching (e.g. after a confirmed purge).
    pub(crate) fn replace(&self, value: T) {
        if self.inner.cell.replace(value) == Completion::Applied {
            self.run_hook();
        }
    }

    pub(crate) fn fail(&self, message: String) {
        self.inner.cell.fail(message);
    }

    fn run_hook(&self) {
        if let Some(hook) = &self.inner.on_applied {
            hook(&self.inner.cell.snapshot());
        }
    }

    // ── Timer lifecycle ──────────────────────────────────────────────

    /// Accept results again after a [`shutdown`](Self::shutdown) and start
    /// the periodic timer. A zero period leaves the resource in manual mode.
    /// Restarting replaces any running timer.
    ///
    /// The first tick is consumed immediately: callers are expected to
    /// perform the initial load themselves.
    pub async fn start(&self, period: Duration) {
        self.shutdown().await;
        self.inner.cell.reopen();
        if period.is_zero() {
            debug!(resource = self.name(), "polling disabled");
            return;
        }

        let cancel = CancellationToken::new();
        let refreshes = TaskTracker::new();
        let task = tokio::spawn(poll_task(
            self.clone(),
            period,
            cancel.clone(),
            refreshes.clone(),
        ));
        *self.inner.timer.lock().await = Some(Timer {
            cancel,
            task,
            refreshes,
        });
        debug!(resource = self.name(), ?period, "polling started");
    }

    /// Stop the timer, wait for its refreshes to wind down, and drop every
    /// result that arrives afterwards, on-demand ones included.
    pub async fn shutdown(&self) {
        let timer = self.inner.timer.lock().await.take();
        if let Some(timer) = timer {
            timer.cancel.cancel();
            let _ = timer.task.await;
            timer.refreshes.close();
            timer.refreshes.wait().await;
            debug!(resource = self.name(), "polling stopped");
        }
        self.inner.cell.close();
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.timer.lock().await.is_some()
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn poll_task<T: Send + Sync + 'static>(
    poller: Poller<T>,
    period: Duration,
    cancel: CancellationToken,
    refreshes: TaskTracker,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let poller = poller.clone();
                let cancel = cancel.clone();
                refreshes.spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {}
                        result = poller.refresh() => {
                            if let Err(e) = result {
                                warn!(resource = poller.name(), error = %e, "periodic refresh failed");
                            }
                        }
                    }
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::FutureExt;
    use tokio::sync::oneshot;

    use super::*;

    fn counting_poller(counter: Arc<AtomicUsize>) -> Poller<usize> {
        Poller::new("counter", move || {
            let counter = Arc::clone(&counter);
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }.boxed()
        })
    }

    #[tokio::test]
    async fn refresh_applies_value() {
        let poller = counting_poller(Arc::new(AtomicUsize::new(0)));
        assert_eq!(poller.refresh().await.unwrap(), Completion::Applied);
        assert_eq!(poller.snapshot().data.as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn failed_refresh_is_recorded_and_returned() {
        let poller: Poller<usize> = Poller::new("broken", || {
            async {
                Err(CoreError::Transport {
                    message: "Service Unavailable".into(),
                    status: Some(503),
                })
            }
            .boxed()
        });
        let err = poller.refresh().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        let state = poller.snapshot();
        assert_eq!(state.error.as_deref(), Some("Service Unavailable"));
        assert!(!state.loading);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn slower_older_refresh_loses() {
        // Each fetch waits on its own oneshot so the test controls
        // completion order.
        let gates: Arc<Mutex<Vec<oneshot::Receiver<&'static str>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        gates.lock().await.extend([second_rx, first_rx]);

        let poller: Poller<&'static str> = Poller::new("gated", {
            let gates = Arc::clone(&gates);
            move || {
                let gates = Arc::clone(&gates);
                async move {
                    let rx = gates.lock().await.pop().unwrap();
                    Ok(rx.await.unwrap())
                }
                .boxed()
            }
        });

        let first = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh().await }
        });
        tokio::task::yield_now().await;
        while gates.lock().await.len() != 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh().await }
        });
        while !gates.lock().await.is_empty() {
            tokio::task::yield_now().await;
        }

        second_tx.send("second").unwrap();
        assert_eq!(second.await.unwrap().unwrap(), Completion::Applied);
        first_tx.send("first").unwrap();
        assert_eq!(first.await.unwrap().unwrap(), Completion::Stale);

        assert_eq!(poller.snapshot().data.as_deref(), Some(&"second"));
    }

    #[tokio::test]
    async fn hook_runs_after_each_application() {
        let seen = Arc::new(AtomicUsize::new(0));
        let poller = Poller::with_hook(
            "hooked",
            || async { Ok(7_usize) }.boxed(),
            {
                let seen = Arc::clone(&seen);
                move |state: &ResourceState<usize>| {
                    seen.store(*state.data.as_deref().unwrap(), Ordering::SeqCst);
                }
            },
        );
        poller.refresh().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_refreshes_until_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let poller = counting_poller(Arc::clone(&counter));

        poller.start(Duration::from_secs(30)).await;
        assert!(poller.is_polling().await);

        tokio::time::sleep(Duration::from_secs(65)).await;
        // Let the spawned refresh tasks run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        poller.shutdown().await;
        assert!(!poller.is_polling().await);
        tokio::time::sleep(Duration::from_secs(120)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_applies_after_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let applied = Arc::new(AtomicUsize::new(0));
        let poller = Poller::with_hook(
            "slow",
            {
                let counter = Arc::clone(&counter);
                move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
                    }
                    .boxed()
                }
            },
            {
                let applied = Arc::clone(&applied);
                move |_: &ResourceState<usize>| {
                    applied.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        poller.start(Duration::from_secs(1)).await;
        // One timer refresh is now waiting on its slow fetch.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(poller.snapshot().loading);

        poller.shutdown().await;
        assert!(!poller.snapshot().loading);

        // Late on-demand refreshes are dropped too.
        assert_eq!(poller.refresh().await.unwrap(), Completion::Stale);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 0);
        assert_eq!(poller.snapshot().version, 0);

        poller.start(Duration::ZERO).await;
        assert_eq!(poller.refresh().await.unwrap(), Completion::Applied);
        assert_eq!(applied.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_period_means_manual() {
        let poller = counting_poller(Arc::new(AtomicUsize::new(0)));
        poller.start(Duration::ZERO).await;
        assert!(!poller.is_polling().await);
    }
}
