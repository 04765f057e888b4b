use std::time::Duration;

/// Tuning knobs for a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// The work loop yields once less than this much time is left in a slice.
    pub yield_threshold: Duration,
}

impl ReconcilerConfig {
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
        }
    }
}
