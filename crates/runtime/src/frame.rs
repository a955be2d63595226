/// One pass of input handling.
///
/// Every pointer or key event is handled inside a frame; side effects queued
/// during the frame are delivered when it commits. Time is supplied by the
/// caller in milliseconds so replays stay deterministic.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Caller clock at the start of the frame (milliseconds).
    pub time_ms: f64,
}

impl Frame {
    pub fn new(index: u64, time_ms: f64) -> Self {
        Self { index, time_ms }
    }

    /// The frame that follows this one, observed at `time_ms`.
    ///
    /// Clocks that run backwards are clamped so frame time never decreases.
    pub fn advance(self, time_ms: f64) -> Self {
        Self::new(self.index + 1, time_ms.max(self.time_ms))
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(0, 0.0)
    }
}
