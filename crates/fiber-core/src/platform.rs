//! Platform abstraction traits for reconciler runtime services.
//!
//! These traits let the embedding decide how cooperative slices are
//! obtained (idle callback, timer, dedicated thread with a queue) without
//! the core depending on any particular primitive.

use std::time::Duration;

/// Requests further work loop slices from the host.
///
/// Implementations must be safe to use from multiple threads.
pub trait RuntimeScheduler: Send + Sync {
    /// Ask the host to call the work loop again on a later slice.
    fn request_continuation(&self);
}

/// Provides timing information for deadline implementations.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the time elapsed since `since`.
    fn elapsed(&self, since: Self::Instant) -> Duration;
}

/// Remaining-time signal for the current cooperative slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

impl<F> Deadline for F
where
    F: Fn() -> Duration,
{
    fn time_remaining(&self) -> Duration {
        self()
    }
}
