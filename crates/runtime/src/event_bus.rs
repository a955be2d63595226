use crate::frame::Frame;

/// An event stamped with the frame that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub frame_index: u64,
    pub event: E,
}

/// Deferred event queue.
///
/// Handlers push while an input frame is being processed; the owner drains the
/// queue after the frame commits. Listeners therefore never observe a
/// half-applied interaction and never re-enter the state that emitted them.
#[derive(Debug)]
pub struct EventQueue<E> {
    events: Vec<Stamped<E>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, frame: Frame, event: E) {
        self.events.push(Stamped {
            frame_index: frame.index,
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Stamped<E>] {
        &self.events
    }

    /// Takes every queued event, in emission order.
    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut q = EventQueue::new();
        q.emit(Frame::new(2, 0.0), "hello");
        assert_eq!(q.len(), 1);
        assert_eq!(q.events()[0].frame_index, 2);
    }

    #[test]
    fn drain_clears_events() {
        let mut q = EventQueue::new();
        q.emit(Frame::default(), 1u32);
        let drained = q.drain();
        assert_eq!(drained.len(), 1);
        assert!(q.is_empty());
    }
}
