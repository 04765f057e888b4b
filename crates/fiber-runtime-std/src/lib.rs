//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fiber-core`. Embeddings construct a
//! [`StdRuntime`], build their [`Reconciler`] from it and drive the work
//! loop with [`IdleDeadline`] slices whenever a continuation is requested.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{
    Clock, CommitStats, Deadline, FiberError, Host, Reconciler, Runtime, RuntimeHandle,
    RuntimeScheduler, WorkStatus,
};
use log::{error, trace};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records continuation requests and optionally wakes the
/// embedding's event loop.
pub struct StdScheduler {
    continuation_requested: AtomicBool,
    waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            continuation_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether a continuation has been requested since the last call.
    pub fn take_continuation_request(&self) -> bool {
        self.continuation_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever the reconciler asks for another slice.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        match self.waker.write() {
            Ok(mut slot) => *slot = Some(Arc::new(waker)),
            Err(poisoned) => *poisoned.into_inner() = Some(Arc::new(waker)),
        }
    }

    pub fn clear_waker(&self) {
        match self.waker.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    fn wake(&self) {
        let waker = match self.waker.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "continuation_requested",
                &self.continuation_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn request_continuation(&self) {
        self.continuation_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }
}

/// Time budget for one cooperative slice, measured with a [`Clock`].
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline<C: Clock = StdClock> {
    clock: C,
    start: C::Instant,
    budget: Duration,
}

impl<C: Clock> IdleDeadline<C> {
    /// Starts a slice of `budget` at the clock's current instant.
    pub fn new(clock: C, budget: Duration) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl<C: Clock> Deadline for IdleDeadline<C> {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.clock.elapsed(self.start))
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
}

impl StdRuntime {
    /// Creates a new standard runtime instance.
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: Arc::new(StdClock),
            runtime,
        }
    }

    /// Builds a reconciler over `host` that reports continuations to this runtime.
    pub fn reconciler<H: Host>(&self, host: H) -> Reconciler<H> {
        Reconciler::with_runtime(host, self.runtime.clone())
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Starts a slice of `budget` measured with this runtime's clock.
    pub fn idle_deadline(&self, budget: Duration) -> IdleDeadline {
        IdleDeadline::new(*self.clock, budget)
    }

    /// Returns whether a continuation was requested since the last poll.
    pub fn take_continuation_request(&self) -> bool {
        self.scheduler.take_continuation_request()
    }

    /// Registers a waker to be called when the reconciler asks for another slice.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(waker);
    }

    /// Clears any previously registered waker.
    pub fn clear_waker(&self) {
        self.scheduler.clear_waker();
    }

    /// Runs one slice of `budget` if a continuation is pending.
    pub fn run_slice<H: Host>(
        &self,
        reconciler: &mut Reconciler<H>,
        budget: Duration,
    ) -> Result<WorkStatus, FiberError> {
        if !self.take_continuation_request() && !reconciler.has_pending_work() {
            return Ok(WorkStatus::Idle);
        }
        let status = reconciler.work_loop(&self.idle_deadline(budget));
        if let Err(err) = &status {
            error!("reconciler slice failed: {err}");
        }
        status
    }

    /// Pumps slices of `budget` until the reconciler is idle, returning the
    /// stats of every commit made along the way.
    pub fn run_until_idle<H: Host>(
        &self,
        reconciler: &mut Reconciler<H>,
        budget: Duration,
    ) -> Result<Vec<CommitStats>, FiberError> {
        let mut commits = Vec::new();
        let mut slices = 0usize;
        loop {
            match self.run_slice(reconciler, budget)? {
                WorkStatus::Idle => break,
                WorkStatus::Yielded => {}
                WorkStatus::Committed(stats) => commits.push(stats),
            }
            slices += 1;
        }
        trace!("reconciler idle after {slices} slices, {} commits", commits.len());
        Ok(commits)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
