use std::time::{Duration, Instant};

/// The default quiet period for search input.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Coalesces rapid updates: only the latest value is released, and only once
/// no new value has arrived for the quiet period.
///
/// The current time is always passed in, so callers decide when to poll.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}
impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Returns the pending value if the quiet period has elapsed since the last push.
    /// A value is only ever returned once.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let settled = self
            .pending
            .as_ref()
            .is_some_and(|(_, pushed_at)| now.saturating_duration_since(*pushed_at) >= self.quiet);
        if !settled {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending value, if any.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}
impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
