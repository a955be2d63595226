use foundation::PointId;

/// The labeling editor the active point hands off to.
///
/// Called only from committed `ActivePointChanged` events, never mid-frame.
pub trait EditorBridge {
    fn open(&mut self, id: PointId);
    fn close(&mut self);
}

/// Bridge for hosts without an editor attached.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopEditor;

impl EditorBridge for NoopEditor {
    fn open(&mut self, _id: PointId) {}
    fn close(&mut self) {}
}

impl<E: EditorBridge + ?Sized> EditorBridge for Box<E> {
    fn open(&mut self, id: PointId) {
        (**self).open(id)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
