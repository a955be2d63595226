//! Pointer-interaction state machine.
//!
//! The engine owns the manual selection, the single active point and the
//! rubber-band drag. It never renders and never talks to the editor: every
//! observable change is queued as a [`SelectionEvent`] and handed out when the
//! current input frame commits.
//!
//! Mouse bindings:
//! - plain click: make the point active, or clear it when it already is
//! - ctrl/cmd click: toggle selection membership
//! - shift click: add to the selection
//! - shift+alt click: remove from the selection
//! - shift drag: rectangle select (alt at release subtracts)

use foundation::PointId;
use foundation::math::Vec2;
use runtime::{EventQueue, Frame, Stamped};
use tracing::debug;

use crate::points::PointSet;
use crate::selection::{SelectionRectangle, SelectionSet};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    pub const fn shift() -> Self {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    pub const fn shift_alt() -> Self {
        Modifiers {
            shift: true,
            alt: true,
            ..Modifiers::NONE
        }
    }

    pub const fn ctrl() -> Self {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }

    pub const fn meta() -> Self {
        Modifiers {
            meta: true,
            ..Modifiers::NONE
        }
    }

    /// Shift wins over ctrl/cmd; alt only matters together with shift.
    pub fn click_mode(self) -> ClickMode {
        match (self.shift, self.alt, self.ctrl || self.meta) {
            (true, true, _) => ClickMode::Remove,
            (true, false, _) => ClickMode::Add,
            (false, _, true) => ClickMode::Toggle,
            (false, _, false) => ClickMode::Activate,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickMode {
    Activate,
    Toggle,
    Add,
    Remove,
}

/// Direction of a bulk (rectangle) selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BulkMode {
    Add,
    Remove,
}

impl BulkMode {
    fn from_modifiers(m: Modifiers) -> Self {
        if m.alt { BulkMode::Remove } else { BulkMode::Add }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerState {
    Idle,
    Dragging(SelectionRectangle),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    ActivePointChanged(Option<PointId>),
    SelectionChanged { version: u64 },
}

/// Explicit view-model contract handed to renderers and host UIs.
pub trait ScatterViewModel {
    fn is_selected(&self, id: PointId) -> bool;
    fn toggle_selected(&mut self, id: PointId);
    fn clear_selection(&mut self);
    fn active_point_id(&self) -> Option<PointId>;
    fn set_active_point_id(&mut self, id: Option<PointId>);
}

#[derive(Debug)]
pub struct SelectionEngine {
    selection: SelectionSet,
    active: Option<PointId>,
    version: u64,
    pointer: PointerState,
    frame: Frame,
    events: EventQueue<SelectionEvent>,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self {
            selection: SelectionSet::new(),
            active: None,
            version: 0,
            pointer: PointerState::Idle,
            frame: Frame::default(),
            events: EventQueue::new(),
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_version(&self) -> u64 {
        self.version
    }

    pub fn active(&self) -> Option<PointId> {
        self.active
    }

    /// Active id, treating a reference to a point outside `points` as none.
    pub fn active_in(&self, points: &PointSet) -> Option<PointId> {
        self.active.filter(|id| points.contains(*id))
    }

    /// Membership test that, like [`active_in`](Self::active_in), ignores ids
    /// outside `points`.
    pub fn is_selected_in(&self, points: &PointSet, id: PointId) -> bool {
        points.contains(id) && self.selection.contains(id)
    }

    pub fn pointer_state(&self) -> PointerState {
        self.pointer
    }

    pub fn selection_rect(&self) -> Option<SelectionRectangle> {
        match self.pointer {
            PointerState::Dragging(rect) => Some(rect),
            PointerState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.pointer, PointerState::Dragging(_))
    }

    /// Stamps subsequent events with `frame`.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn drain_events(&mut self) -> Vec<Stamped<SelectionEvent>> {
        self.events.drain()
    }

    /// Handles a click. `target` is the hit-tested point, `None` for empty space.
    ///
    /// Returns `true` if selection or active state changed.
    pub fn click(
        &mut self,
        points: &PointSet,
        target: Option<PointId>,
        modifiers: Modifiers,
    ) -> bool {
        let Some(id) = target else {
            return false;
        };
        if !points.contains(id) {
            debug!(%id, "click on stale point ignored");
            return false;
        }

        match modifiers.click_mode() {
            ClickMode::Activate => {
                let next = if self.active == Some(id) { None } else { Some(id) };
                self.set_active_unchecked(next)
            }
            ClickMode::Toggle => {
                self.selection.toggle(id);
                self.bump_version();
                true
            }
            ClickMode::Add => {
                let changed = self.selection.insert(id);
                if changed {
                    self.bump_version();
                }
                changed
            }
            ClickMode::Remove => {
                let changed = self.selection.remove(id);
                if changed {
                    self.bump_version();
                }
                changed
            }
        }
    }

    /// Starts a rectangle drag. Only enters `Dragging` while shift is held.
    pub fn drag_start(&mut self, world: Vec2, modifiers: Modifiers) -> bool {
        if !modifiers.shift || !world.is_finite() {
            return false;
        }
        self.pointer = PointerState::Dragging(SelectionRectangle::new(world));
        true
    }

    pub fn drag_move(&mut self, world: Vec2) -> bool {
        match &mut self.pointer {
            PointerState::Dragging(rect) if world.is_finite() => {
                rect.current = world;
                true
            }
            _ => false,
        }
    }

    /// Finishes a drag and applies the rectangle to the selection.
    ///
    /// `world` is `None` when the pointer was released outside the canvas; the
    /// drag is then cancelled without touching the selection. Returns the
    /// number of points whose membership changed.
    pub fn drag_end(
        &mut self,
        points: &PointSet,
        world: Option<Vec2>,
        modifiers: Modifiers,
    ) -> usize {
        let PointerState::Dragging(mut rect) =
            std::mem::replace(&mut self.pointer, PointerState::Idle)
        else {
            return 0;
        };
        let Some(world) = world.filter(|w| w.is_finite()) else {
            debug!("drag released outside canvas; cancelled");
            return 0;
        };
        rect.current = world;
        self.apply_rect(points, &rect, BulkMode::from_modifiers(modifiers))
    }

    pub fn cancel_drag(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.pointer = PointerState::Idle;
        was_dragging
    }

    /// Applies `mode` to every point inside `rect`.
    ///
    /// Points already in the target state are left alone, so repeating the
    /// same call is a no-op. A change of any size bumps the version once.
    pub fn apply_rect(
        &mut self,
        points: &PointSet,
        rect: &SelectionRectangle,
        mode: BulkMode,
    ) -> usize {
        let bounds = rect.bounds();
        let mut changed = 0usize;
        for p in points.iter() {
            if !bounds.contains(p.position()) {
                continue;
            }
            let did = match mode {
                BulkMode::Add => self.selection.insert(p.id),
                BulkMode::Remove => self.selection.remove(p.id),
            };
            if did {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, ?mode, "rectangle selection applied");
            self.bump_version();
        }
        changed
    }

    /// Escape: drops the selection, the active point and any drag in progress.
    pub fn clear(&mut self) -> bool {
        let dragged = self.cancel_drag();
        let had_selection = !self.selection.is_empty();
        if had_selection {
            self.selection.clear();
            self.bump_version();
        }
        let had_active = self.set_active_unchecked(None);
        dragged || had_selection || had_active
    }

    pub fn toggle(&mut self, points: &PointSet, id: PointId) -> bool {
        self.click(points, Some(id), Modifiers::ctrl())
    }

    /// Sets or clears the active point. Unknown ids are ignored.
    pub fn set_active(&mut self, points: &PointSet, id: Option<PointId>) -> bool {
        if id.is_some_and(|id| !points.contains(id)) {
            return false;
        }
        self.set_active_unchecked(id)
    }

    /// Drops selected ids and the active point when `points` no longer has them.
    ///
    /// Only call this with a complete dataset: while a load is still arriving,
    /// missing ids may simply not have been fetched yet, and readers already
    /// treat them as absent. Stale selections are removed as one version step.
    pub fn reconcile(&mut self, points: &PointSet) -> bool {
        let stale: Vec<PointId> = self
            .selection
            .iter()
            .filter(|id| !points.contains(*id))
            .collect();
        for id in &stale {
            self.selection.remove(*id);
        }
        if !stale.is_empty() {
            debug!(dropped = stale.len(), "stale selected ids dropped");
            self.bump_version();
        }
        let active_dropped = match self.active {
            Some(id) if !points.contains(id) => self.set_active_unchecked(None),
            _ => false,
        };
        !stale.is_empty() || active_dropped
    }

    fn set_active_unchecked(&mut self, id: Option<PointId>) -> bool {
        if self.active == id {
            return false;
        }
        self.active = id;
        self.events
            .emit(self.frame, SelectionEvent::ActivePointChanged(id));
        true
    }

    fn bump_version(&mut self) {
        self.version += 1;
        self.events.emit(
            self.frame,
            SelectionEvent::SelectionChanged {
                version: self.version,
            },
        );
    }
}
