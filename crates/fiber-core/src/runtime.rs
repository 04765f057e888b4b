use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    rerender_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            rerender_requested: Cell::new(false),
        }
    }

    fn request_rerender(&self) {
        self.rerender_requested.set(true);
        self.scheduler.request_continuation();
    }
}

/// Owner side of the runtime; held by the reconciler.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn rerender_requested(&self) -> bool {
        self.inner.rerender_requested.get()
    }

    pub(crate) fn take_rerender_request(&self) -> bool {
        self.inner.rerender_requested.replace(false)
    }

    pub(crate) fn request_continuation(&self) {
        self.inner.scheduler.request_continuation();
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn request_continuation(&self) {}
}

/// Weak handle captured by state setters.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Requests a full pass from the committed root. Returns `false` if the
    /// runtime is gone.
    pub fn request_rerender(&self) -> bool {
        match self.0.upgrade() {
            Some(inner) => {
                inner.request_rerender();
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct TestScheduler {
    requests: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub(crate) fn requests(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn request_continuation(&self) {
        self.requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
