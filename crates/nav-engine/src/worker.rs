//! The background processing worker.
//!
//! # Threads and channels
//!
//! ```text
//! producers ──FixSender::submit──▶ FixQueue ──▶ [nav-route-processor thread]
//!                                                 RouteProcessor::process
//!                                                        │
//! consumer  ◀──DispatchReceiver◀── tokio mpsc (unbounded) ┘
//! ```
//!
//! Fixes are processed one at a time in arrival order; no tick starts before
//! the previous one has committed its snapshot.  The result channel is FIFO,
//! so bundles reach the consumer in the same order.
//!
//! # Teardown
//!
//! [`WorkerHandle::shutdown`] stops intake and joins the thread.  With
//! [`TeardownMode::Discard`] (also what `Drop` does) every queued fix and
//! every bundle not yet delivered is thrown away; with
//! [`TeardownMode::Drain`] queued fixes are processed and their bundles stay
//! deliverable.  Either way nothing is sent after `shutdown` returns.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use nav_core::LocationFix;
use nav_route::{Route, RouteMatcher};

use crate::queue::{Command, FixQueue, Pushed};
use crate::{DispatchBundle, EngineError, EngineResult, NavigationObserver, QueueConfig, RouteProcessor};

const THREAD_NAME: &str = "nav-route-processor";

// ── Teardown mode ─────────────────────────────────────────────────────────────

/// What happens to pending work when the worker is torn down.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TeardownMode {
    /// Process everything already queued; keep undelivered bundles.
    Drain,
    /// Drop queued fixes and undelivered bundles.
    #[default]
    Discard,
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Counter snapshot for one worker.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Ticks that produced a bundle.
    pub processed: u64,
    /// Ticks aborted by a matcher or progress failure (or a panic).
    pub dropped:   u64,
    /// Fixes evicted from a full queue before being processed.
    pub coalesced: u64,
}

#[derive(Default)]
struct StatsCounters {
    processed: AtomicU64,
    dropped:   AtomicU64,
    coalesced: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            processed: self.processed.load(Ordering::Relaxed),
            dropped:   self.dropped.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

// ── Producer side ─────────────────────────────────────────────────────────────

/// Cloneable, thread-safe submission handle.
///
/// `submit` never waits for processing; it only takes the queue lock.
#[derive(Clone)]
pub struct FixSender {
    queue: Arc<FixQueue>,
    stats: Arc<StatsCounters>,
}

impl FixSender {
    /// Queue `fix` for processing.
    ///
    /// # Errors
    ///
    /// [`EngineError::WorkerStopped`] after the worker has been shut down.
    pub fn submit(&self, fix: LocationFix) -> EngineResult<()> {
        match self.queue.push_fix(fix) {
            None => Err(EngineError::WorkerStopped),
            Some(Pushed::Queued) => Ok(()),
            Some(Pushed::Coalesced) => {
                self.stats.coalesced.fetch_add(1, Ordering::Relaxed);
                trace!("fix queue full; oldest fix evicted");
                Ok(())
            }
        }
    }
}

// ── Consumer side ─────────────────────────────────────────────────────────────

/// Receives bundles on the consumer's side of the worker.
///
/// Bundles still in transit when the worker is torn down with
/// [`TeardownMode::Discard`] are silently dropped here.
pub struct DispatchReceiver {
    rx:     UnboundedReceiver<DispatchBundle>,
    active: Arc<AtomicBool>,
}

impl DispatchReceiver {
    fn accept(&self, bundle: DispatchBundle) -> Option<DispatchBundle> {
        self.active.load(Ordering::Acquire).then_some(bundle)
    }

    /// Next bundle if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<DispatchBundle> {
        while let Ok(bundle) = self.rx.try_recv() {
            if let Some(b) = self.accept(bundle) {
                return Some(b);
            }
        }
        None
    }

    /// Wait for the next bundle.  `None` once the worker has stopped and
    /// everything sent has been received.
    ///
    /// Must not be called from inside an async runtime; use [`Self::recv`].
    pub fn recv_blocking(&mut self) -> Option<DispatchBundle> {
        while let Some(bundle) = self.rx.blocking_recv() {
            if let Some(b) = self.accept(bundle) {
                return Some(b);
            }
        }
        None
    }

    /// Async flavour of [`Self::recv_blocking`].
    pub async fn recv(&mut self) -> Option<DispatchBundle> {
        while let Some(bundle) = self.rx.recv().await {
            if let Some(b) = self.accept(bundle) {
                return Some(b);
            }
        }
        None
    }

    /// Deliver every bundle that is ready to `observer`.  Returns how many.
    pub fn try_deliver<O: NavigationObserver + ?Sized>(&mut self, observer: &mut O) -> usize {
        let mut delivered = 0;
        while let Some(bundle) = self.try_recv() {
            bundle.deliver(observer);
            delivered += 1;
        }
        delivered
    }

    /// Wait for one bundle and deliver it.  `false` once the stream has ended.
    pub fn deliver_blocking<O: NavigationObserver + ?Sized>(&mut self, observer: &mut O) -> bool {
        match self.recv_blocking() {
            Some(bundle) => {
                bundle.deliver(observer);
                true
            }
            None => false,
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// Spawns the processing thread.
pub struct ProcessingWorker;

impl ProcessingWorker {
    /// Move `processor` onto a dedicated thread and return the two ends.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for an unusable queue configuration,
    /// [`EngineError::Spawn`] if the OS refuses the thread.
    pub fn spawn<M: RouteMatcher>(
        processor: RouteProcessor<M>,
        queue:     QueueConfig,
    ) -> EngineResult<(WorkerHandle, DispatchReceiver)> {
        if queue.overflow == crate::OverflowPolicy::DropOldest && queue.capacity == 0 {
            return Err(EngineError::Config("queue.capacity must be at least 1 with drop_oldest".into()));
        }

        let fix_queue = Arc::new(FixQueue::new(queue));
        let stats = Arc::new(StatsCounters::default());
        let active = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::unbounded_channel();

        let session = processor.context().session;
        let thread = {
            let queue = Arc::clone(&fix_queue);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run_loop(processor, &queue, &tx, &stats))?
        };

        info!(%session, capacity = queue.capacity, overflow = ?queue.overflow, "processing worker started");

        let handle = WorkerHandle {
            sender: FixSender { queue: fix_queue, stats: Arc::clone(&stats) },
            thread: Some(thread),
            active: Arc::clone(&active),
            stats,
        };
        Ok((handle, DispatchReceiver { rx, active }))
    }
}

fn run_loop<M: RouteMatcher>(
    mut processor: RouteProcessor<M>,
    queue:         &FixQueue,
    tx:            &UnboundedSender<DispatchBundle>,
    stats:         &StatsCounters,
) {
    loop {
        match queue.pop_blocking() {
            Command::Shutdown => break,
            Command::ReplaceRoute(route) => processor.replace_route(route),
            Command::Fix(fix) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(&fix)));
                match outcome {
                    Ok(Ok(bundle)) => {
                        stats.processed.fetch_add(1, Ordering::Relaxed);
                        if tx.send(bundle).is_err() {
                            trace!("dispatch receiver gone; bundle discarded");
                        }
                    }
                    Ok(Err(e)) => {
                        stats.dropped.fetch_add(1, Ordering::Relaxed);
                        debug!(error = %e, at = %fix.timestamp, "tick dropped");
                    }
                    Err(_) => {
                        stats.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(at = %fix.timestamp, "tick panicked; dropped");
                    }
                }
            }
        }
    }
    debug!("processing worker loop exited");
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Owner's handle on a running worker.  Dropping it tears the worker down
/// with [`TeardownMode::Discard`].
pub struct WorkerHandle {
    sender: FixSender,
    thread: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
    stats:  Arc<StatsCounters>,
}

impl WorkerHandle {
    /// A producer handle for other threads.
    pub fn sender(&self) -> FixSender {
        self.sender.clone()
    }

    /// Shorthand for `self.sender().submit(fix)`.
    pub fn submit(&self, fix: LocationFix) -> EngineResult<()> {
        self.sender.submit(fix)
    }

    /// Switch to `route` once every fix queued so far has been processed.
    pub fn replace_route(&self, route: Arc<Route>) -> EngineResult<()> {
        if self.sender.queue.push_route(route) {
            Ok(())
        } else {
            Err(EngineError::WorkerStopped)
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.snapshot()
    }

    /// Fixes waiting to be processed.
    pub fn pending(&self) -> usize {
        self.sender.queue.pending_fixes()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop intake, handle pending work per `mode`, and join the thread.
    pub fn shutdown(mut self, mode: TeardownMode) -> WorkerStats {
        self.stop(mode);
        self.stats.snapshot()
    }

    fn stop(&mut self, mode: TeardownMode) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if mode == TeardownMode::Discard {
            self.active.store(false, Ordering::Release);
        }
        let discarded = self.sender.queue.close(mode);
        if let Err(e) = thread.join() {
            warn!("processing worker thread panicked: {:?}", e);
        }
        info!(?mode, discarded, stats = ?self.stats.snapshot(), "processing worker stopped");
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop(TeardownMode::Discard);
    }
}
