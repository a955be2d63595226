use tracing::trace;

/// Trailing-edge debounce over caller-supplied timestamps.
///
/// `push` records the latest value; `poll` releases it once no newer value has
/// arrived for `interval_ms`. Only the last value of a burst is released.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    interval_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debounce<T> {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now_ms: f64) {
        self.pending = Some((value, now_ms));
    }

    /// Returns the pending value if it has been quiet for the full interval.
    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        let (_, at) = self.pending.as_ref()?;
        if now_ms - *at < self.interval_ms {
            return None;
        }
        let (value, at) = self.pending.take()?;
        trace!(waited_ms = now_ms - at, "debounce released");
        Some(value)
    }

    /// Drops the pending value without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
