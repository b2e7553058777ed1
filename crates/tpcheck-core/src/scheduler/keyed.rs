//! Per-key debounced operation scheduling
//!
//! Converts bursty trigger events into at most one effective operation per
//! quiet period and key. A fresh trigger during the quiet period re-arms the
//! timer and replaces the payload; a trigger during a running operation
//! requests cooperative cancellation of the in-flight work and arms a
//! follow-up. Teardown removes the key's state entirely.
//!
//! Every armed timer and every in-flight cancellation handle has an explicit
//! disposal path on every transition; nothing is left to be collected later.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Operation invoked when a key's quiet period elapses (or immediately, for
/// `execute_now`). Receives the latest payload and a token that fires if the
/// run is superseded or torn down; results flow through the operation's own
/// consumer, the scheduler never sees them.
pub type DispatchFn<P> =
    Arc<dyn Fn(P, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<P> {
    payload: P,
    dispatch: DispatchFn<P>,
    timer: CancellationToken,
    generation: u64,
}

struct RunHandle {
    cancel: CancellationToken,
    generation: u64,
}

struct KeyEntry<P> {
    /// Armed quiet-period timer, if any.
    pending: Option<Pending<P>>,
    /// In-flight operation handle, if any.
    running: Option<RunHandle>,
}

impl<P> Default for KeyEntry<P> {
    fn default() -> Self {
        Self {
            pending: None,
            running: None,
        }
    }
}

struct SchedulerInner<K, P> {
    entries: Mutex<HashMap<K, KeyEntry<P>>>,
    quiet_period: Duration,
    /// Process-wide stamp source; a stale timer or run can never match a
    /// newer arm, even across teardown and re-creation of a key.
    generations: AtomicU64,
}

/// Per-key debounce + single-flight + supersede scheduler.
///
/// One instance serves any number of keys; per-key state lives only between
/// a trigger and the dispatch, cancellation, or teardown that consumes it.
/// Cloning is cheap and all clones share the same state.
pub struct KeyedScheduler<K, P>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    P: Send + 'static,
{
    inner: Arc<SchedulerInner<K, P>>,
}

impl<K, P> Clone for KeyedScheduler<K, P>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    P: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, P> KeyedScheduler<K, P>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    P: Send + 'static,
{
    /// Create a scheduler with the given quiet period.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                entries: Mutex::new(HashMap::new()),
                quiet_period,
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Number of keys with live state; zero once everything is idle or torn
    /// down.
    pub fn tracked_keys(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Trigger for a key: arm (or re-arm) the quiet-period timer with this
    /// payload and operation.
    ///
    /// Only the payload of the last trigger within a quiet window is ever
    /// dispatched. If an operation for the key is in flight, it is asked to
    /// cancel and the timer schedules its follow-up.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, key: K, payload: P, dispatch: DispatchFn<P>) {
        let timer = CancellationToken::new();
        let generation = self.inner.next_generation();

        {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(previous) = entry.pending.take() {
                trace!(generation = previous.generation, "debounce timer re-armed");
                previous.timer.cancel();
            }
            if let Some(running) = &entry.running {
                debug!(generation = running.generation, "superseding in-flight operation");
                running.cancel.cancel();
            }

            entry.pending = Some(Pending {
                payload,
                dispatch,
                timer: timer.clone(),
                generation,
            });
        }

        let inner = Arc::clone(&self.inner);
        let quiet = self.inner.quiet_period;
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(quiet) => inner.timer_fired(&key, generation),
            }
        });
    }

    /// Bypass the quiet period: cancel any armed timer and any in-flight run
    /// for the key, then dispatch immediately with this payload.
    pub fn execute_now(&self, key: K, payload: P, dispatch: DispatchFn<P>) {
        let run = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(pending) = entry.pending.take() {
                pending.timer.cancel();
            }
            if let Some(running) = entry.running.take() {
                running.cancel.cancel();
            }

            self.inner.begin_run(entry)
        };

        self.inner.spawn_run(key, payload, dispatch, run);
    }

    /// Remove a key's state entirely: disarm its timer, request cancellation
    /// of any in-flight run, and forget it. Repeated teardown is a no-op.
    pub fn teardown<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.remove(key) {
            if let Some(pending) = entry.pending {
                pending.timer.cancel();
            }
            if let Some(running) = entry.running {
                running.cancel.cancel();
            }
            debug!("scheduler key torn down");
        }
    }
}

impl<K, P> SchedulerInner<K, P>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    P: Send + 'static,
{
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed)
    }

    /// Install a fresh run handle on the entry; the caller spawns the
    /// operation outside the lock.
    fn begin_run(&self, entry: &mut KeyEntry<P>) -> RunHandle {
        let handle = RunHandle {
            cancel: CancellationToken::new(),
            generation: self.next_generation(),
        };
        entry.running = Some(RunHandle {
            cancel: handle.cancel.clone(),
            generation: handle.generation,
        });
        handle
    }

    fn spawn_run(self: &Arc<Self>, key: K, payload: P, dispatch: DispatchFn<P>, run: RunHandle) {
        let future = dispatch(payload, run.cancel);
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            future.await;
            inner.run_finished(&key, run.generation);
        });
    }

    fn timer_fired(self: &Arc<Self>, key: &K, generation: u64) {
        let job = {
            let mut entries = self.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            let armed = entry
                .pending
                .as_ref()
                .is_some_and(|pending| pending.generation == generation);
            if !armed {
                // superseded between the timer firing and this lock
                return;
            }
            let pending = entry.pending.take();
            pending.map(|pending| (pending.payload, pending.dispatch, self.begin_run(entry)))
        };

        if let Some((payload, dispatch, run)) = job {
            trace!("quiet period elapsed, dispatching");
            self.spawn_run(key.clone(), payload, dispatch, run);
        }
    }

    fn run_finished(&self, key: &K, generation: u64) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            // torn down while running
            return;
        };
        let current = entry
            .running
            .as_ref()
            .is_some_and(|running| running.generation == generation);
        if !current {
            // a newer run replaced this one while it unwound
            return;
        }
        entry.running = None;
        if entry.pending.is_none() {
            entries.remove(key);
        }
    }
}
