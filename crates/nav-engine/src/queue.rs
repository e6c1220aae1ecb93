//! Inbound command queue between producers and the processing worker.
//!
//! A `VecDeque` behind a `parking_lot` mutex, with a condvar to park the
//! worker while idle.  Producers never block on the worker: `push_fix`
//! returns immediately, evicting the oldest queued fix when the
//! `DropOldest` bound is reached.  Route replacements and shutdown
//! markers are never evicted.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use nav_core::LocationFix;
use nav_route::Route;

use crate::{OverflowPolicy, QueueConfig, TeardownMode};

/// A unit of work for the worker thread, processed strictly in FIFO order.
#[derive(Debug)]
pub(crate) enum Command {
    Fix(LocationFix),
    ReplaceRoute(Arc<Route>),
    Shutdown,
}

/// Outcome of a successful push.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pushed {
    Queued,
    /// Queued after evicting the oldest pending fix.
    Coalesced,
}

struct QueueInner {
    commands: VecDeque<Command>,
    /// Number of `Command::Fix` entries in `commands`.
    fixes:    usize,
    closed:   bool,
}

pub struct FixQueue {
    config: QueueConfig,
    inner:  Mutex<QueueInner>,
    ready:  Condvar,
}

impl FixQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(QueueInner { commands: VecDeque::new(), fixes: 0, closed: false }),
            ready: Condvar::new(),
        }
    }

    /// Number of fixes waiting (commands other than fixes are not counted).
    pub fn pending_fixes(&self) -> usize {
        self.inner.lock().fixes
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Enqueue a fix.  `None` once the queue is closed.
    pub(crate) fn push_fix(&self, fix: LocationFix) -> Option<Pushed> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return None;
        }

        let mut pushed = Pushed::Queued;
        if self.config.overflow == OverflowPolicy::DropOldest && inner.fixes >= self.config.capacity {
            if let Some(pos) = inner.commands.iter().position(|c| matches!(c, Command::Fix(_))) {
                inner.commands.remove(pos);
                inner.fixes -= 1;
                pushed = Pushed::Coalesced;
            }
        }

        inner.commands.push_back(Command::Fix(fix));
        inner.fixes += 1;
        drop(inner);
        self.ready.notify_one();
        Some(pushed)
    }

    /// Enqueue a route replacement behind every fix already queued.
    pub(crate) fn push_route(&self, route: Arc<Route>) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.commands.push_back(Command::ReplaceRoute(route));
        drop(inner);
        self.ready.notify_one();
        true
    }

    /// Refuse further pushes and queue the shutdown marker.
    ///
    /// `Drain` lets the worker finish what is queued; `Discard` drops
    /// everything pending.  Returns the number of discarded commands.
    pub(crate) fn close(&self, mode: TeardownMode) -> usize {
        let mut inner = self.inner.lock();
        if inner.closed {
            return 0;
        }
        inner.closed = true;

        let discarded = match mode {
            TeardownMode::Drain => 0,
            TeardownMode::Discard => {
                let n = inner.commands.len();
                inner.commands.clear();
                inner.fixes = 0;
                n
            }
        };
        inner.commands.push_back(Command::Shutdown);
        drop(inner);
        self.ready.notify_one();
        discarded
    }

    /// Block until a command is available and take it.
    pub(crate) fn pop_blocking(&self) -> Command {
        let mut inner = self.inner.lock();
        loop {
            if let Some(cmd) = inner.commands.pop_front() {
                if matches!(cmd, Command::Fix(_)) {
                    inner.fixes -= 1;
                }
                return cmd;
            }
            self.ready.wait(&mut inner);
        }
    }
}
