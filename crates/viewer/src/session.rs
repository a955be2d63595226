//! One scatter view: the glue between loader output, the mapper, interaction,
//! the camera and the layer compositor.
//!
//! The session is synchronous and single-owner. Hosts feed it loader snapshots
//! and pointer input in screen pixels, call [`ScatterSession::commit`] once per
//! input frame, and draw whatever [`ScatterSession::layers`] returns.
//!
//! While a load is still arriving, selected and active ids that are not loaded
//! yet are only hidden from reads. They are dropped for good once the load
//! settles, see [`ScatterSession::reconcile`].

use std::collections::HashSet;
use std::sync::Arc;

use foundation::PointId;
use foundation::math::Vec2;
use layers::canvas::DrawCommand;
use layers::{
    LayerRenderer, Palette, Partition, RenderLayer, compose, map_points, partition, render,
};
use runtime::{Debounce, Frame};
use scene::picking::{DEFAULT_HIT_RADIUS_PX, hit_test};
use scene::{
    Modifiers, PointSet, Projection, ScatterSettings, ScatterViewModel, SelectionEngine,
    SelectionEvent, ViewState, ViewportController, ViewportSize,
};
use streaming::{Accumulated, PointLoader};
use tracing::{debug, info};

use crate::editor::EditorBridge;

pub const HOVER_DEBOUNCE_MS: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub viewport: ViewportSize,
    pub hit_radius_px: f64,
    pub hover_debounce_ms: f64,
    pub palette: Palette,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportSize::default(),
            hit_radius_px: DEFAULT_HIT_RADIUS_PX,
            hover_debounce_ms: HOVER_DEBOUNCE_MS,
            palette: Palette::default(),
        }
    }
}

pub struct ScatterSession<E: EditorBridge> {
    config: SessionConfig,
    settings: ScatterSettings,
    raw: Arc<Accumulated>,
    /// The current snapshot is final: no more pages will be appended to it.
    settled: bool,
    points: PointSet,
    engine: SelectionEngine,
    viewport: ViewportController,
    filtered: HashSet<PointId>,
    hovered: Option<PointId>,
    hover: Debounce<Option<PointId>>,
    frame: Frame,
    editor: E,
}

impl<E: EditorBridge> ScatterSession<E> {
    pub fn new(settings: ScatterSettings, config: SessionConfig, editor: E) -> Self {
        Self {
            viewport: ViewportController::new(config.viewport),
            hover: Debounce::new(config.hover_debounce_ms),
            config,
            settings,
            raw: Arc::new(Accumulated::default()),
            settled: false,
            points: PointSet::default(),
            engine: SelectionEngine::new(),
            filtered: HashSet::new(),
            hovered: None,
            frame: Frame::default(),
            editor,
        }
    }

    pub fn settings(&self) -> &ScatterSettings {
        &self.settings
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Number of loaded records, including ones without valid coordinates.
    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.viewport.view()
    }

    pub fn hovered(&self) -> Option<PointId> {
        self.hovered
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn palette(&self) -> &Palette {
        &self.config.palette
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Replaces the dataset with a loader snapshot. Returns `false` if it is the one already shown.
    ///
    /// When the snapshot extends the current one only the new pages are mapped.
    /// The snapshot may be partial, so nothing is reconciled here.
    pub fn ingest(&mut self, snapshot: Arc<Accumulated>) -> bool {
        if Arc::ptr_eq(&self.raw, &snapshot) {
            return false;
        }
        match snapshot.pages_since(&self.raw) {
            Some(fresh) => {
                let mapped = map_points(
                    fresh.iter().flat_map(|page| page.iter()),
                    &self.settings,
                    &self.config.palette,
                );
                debug!(pages = fresh.len(), points = mapped.len(), "appended pages mapped");
                self.points.extend(mapped);
            }
            None => {
                let mapped = map_points(snapshot.iter(), &self.settings, &self.config.palette);
                self.points = PointSet::new(mapped);
            }
        }
        self.raw = snapshot;
        self.settled = false;
        self.after_points_changed();
        true
    }

    /// Picks up the loader's latest snapshot, reconciling once the load has settled.
    pub fn sync(&mut self, loader: &PointLoader) -> bool {
        let (snapshot, loading) = loader.snapshot();
        let was_settled = self.settled;
        let changed = self.ingest(snapshot);
        if !loading && (changed || !was_settled) {
            self.settled = true;
            self.reconcile();
        }
        changed
    }

    /// Drops selected and active ids that the loaded dataset does not contain.
    ///
    /// [`sync`](Self::sync) calls this when the loader goes idle; hosts driving
    /// [`ingest`](Self::ingest) directly call it once their last snapshot is in.
    pub fn reconcile(&mut self) -> bool {
        self.settled = true;
        self.engine.begin_frame(self.frame);
        self.engine.reconcile(&self.points)
    }

    /// Switches settings and remaps the loaded records without any I/O.
    ///
    /// Returns `true` when the loaded records were fetched without a key the
    /// new settings read, so the host should reload to fill it in.
    pub fn update_settings(&mut self, settings: ScatterSettings) -> bool {
        if settings == self.settings {
            return false;
        }
        let needs_reload = !self.settings.covers(&settings);
        self.settings = settings;
        let mapped = map_points(self.raw.iter(), &self.settings, &self.config.palette);
        self.points = PointSet::new(mapped);
        self.after_points_changed();
        if self.settled {
            self.engine.begin_frame(self.frame);
            self.engine.reconcile(&self.points);
        }
        info!(class_field = %self.settings.class_field, needs_reload, "scatter settings changed");
        needs_reload
    }

    pub fn set_filtered_ids(&mut self, ids: impl IntoIterator<Item = PointId>) {
        self.filtered = ids.into_iter().collect();
    }

    pub fn is_filtered(&self, id: PointId) -> bool {
        self.filtered.contains(&id)
    }

    fn after_points_changed(&mut self) {
        if self.viewport.observe(self.points.as_slice()) {
            debug!(points = self.points.len(), "initial view fitted");
        }
        if self.hovered.is_some_and(|id| !self.points.contains(id)) {
            self.hovered = None;
        }
    }

    /// Current projection; before the first fit this is the default view.
    pub fn projection(&self) -> Projection {
        self.viewport
            .projection()
            .unwrap_or_else(|| Projection::new(&ViewState::default(), self.viewport.size()))
    }

    pub fn pick(&self, screen: Vec2) -> Option<PointId> {
        hit_test(screen, self.points.as_slice(), &self.projection(), self.config.hit_radius_px)
    }

    /// Pointer moved to `screen`, or left the canvas when `None`.
    ///
    /// Hover is debounced and only settles on [`commit`](Self::commit); a live
    /// drag follows the pointer immediately.
    pub fn pointer_move(&mut self, screen: Option<Vec2>, now_ms: f64) -> bool {
        let hit = screen.and_then(|s| self.pick(s));
        self.hover.push(hit, now_ms);
        match screen {
            Some(s) if self.engine.is_dragging() => {
                let world = self.projection().screen_to_world(s);
                self.engine.drag_move(world)
            }
            _ => false,
        }
    }

    pub fn click(&mut self, screen: Vec2, modifiers: Modifiers) -> bool {
        self.engine.begin_frame(self.frame);
        let hit = self.pick(screen);
        self.engine.click(&self.points, hit, modifiers)
    }

    /// Starts a rectangle drag. A hover still waiting out its debounce is dropped.
    pub fn drag_start(&mut self, screen: Vec2, modifiers: Modifiers) -> bool {
        let world = self.projection().screen_to_world(screen);
        let started = self.engine.drag_start(world, modifiers);
        if started {
            self.hover.cancel();
        }
        started
    }

    /// `screen` is `None` when released outside the canvas, which cancels the drag.
    pub fn drag_end(&mut self, screen: Option<Vec2>, modifiers: Modifiers) -> usize {
        self.engine.begin_frame(self.frame);
        let proj = self.projection();
        let world = screen.map(|s| proj.screen_to_world(s));
        self.engine.drag_end(&self.points, world, modifiers)
    }

    pub fn escape(&mut self) -> bool {
        self.engine.begin_frame(self.frame);
        self.engine.clear()
    }

    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> bool {
        self.viewport.pan_by_pixels(dx, dy)
    }

    pub fn zoom_at(&mut self, anchor: Vec2, delta: f64) -> bool {
        self.viewport.zoom_at(anchor, delta)
    }

    pub fn set_view_state(&mut self, view: ViewState) -> bool {
        self.viewport.set_view_state(view)
    }

    pub fn resize(&mut self, size: ViewportSize) {
        self.viewport.resize(size);
    }

    /// Ends the current input frame.
    ///
    /// Settles a quiet hover, hands committed active-point changes to the
    /// editor in order, and returns every event the frame produced.
    pub fn commit(&mut self, now_ms: f64) -> Vec<SelectionEvent> {
        if let Some(hit) = self.hover.poll(now_ms) {
            self.hovered = hit.filter(|id| self.points.contains(*id));
        }

        let events: Vec<SelectionEvent> = self
            .engine
            .drain_events()
            .into_iter()
            .map(|s| s.event)
            .collect();
        for event in &events {
            match *event {
                SelectionEvent::ActivePointChanged(Some(id)) => self.editor.open(id),
                SelectionEvent::ActivePointChanged(None) => self.editor.close(),
                SelectionEvent::SelectionChanged { .. } => {}
            }
        }

        self.frame = self.frame.advance(now_ms);
        self.engine.begin_frame(self.frame);
        events
    }

    pub fn partition(&self) -> Partition {
        partition(
            self.points.as_slice(),
            self.engine.selection(),
            &self.filtered,
            self.engine.active_in(&self.points),
            self.hovered,
        )
    }

    pub fn layers(&self) -> Vec<RenderLayer> {
        compose(&self.partition(), self.engine.selection_rect().as_ref())
    }

    pub fn render(&self, renderer: &mut dyn LayerRenderer) {
        render(
            renderer,
            &self.layers(),
            self.points.as_slice(),
            &self.config.palette,
            &self.projection(),
        );
    }

    /// Convenience for hosts drawing on a 2-D canvas.
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let mut canvas = layers::canvas::RecordingCanvas::new();
        self.render(&mut canvas);
        canvas.take_commands()
    }
}

impl<E: EditorBridge> ScatterViewModel for ScatterSession<E> {
    fn is_selected(&self, id: PointId) -> bool {
        self.engine.is_selected_in(&self.points, id)
    }

    fn toggle_selected(&mut self, id: PointId) {
        self.engine.begin_frame(self.frame);
        self.engine.toggle(&self.points, id);
    }

    fn clear_selection(&mut self) {
        self.escape();
    }

    fn active_point_id(&self) -> Option<PointId> {
        self.engine.active_in(&self.points)
    }

    fn set_active_point_id(&mut self, id: Option<PointId>) {
        self.engine.begin_frame(self.frame);
        self.engine.set_active(&self.points, id);
    }
}
