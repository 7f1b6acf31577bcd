//! The map editing session.
//!
//! `MapEditor` owns at most one loaded map (its pixel grid, layer stack,
//! history, viewport, and annotations) and routes input to the tool, the
//! viewport, and the shortcut map. The host calls [`MapEditor::tick`] once
//! per frame; it returns a freshly composited surface when a redraw is due
//! and performs debounced persistence writes.
//!
//! Failure policy:
//! - a load that fails to decode leaves the current map untouched;
//! - a load that fails to allocate surfaces ends with no map loaded;
//! - storage and planning failures are logged and never end the session.

use crate::history::HistoryLog;
use crate::input::{InputEvent, Modifiers};
use crate::planner::{LinearPlanner, PathPlanner};
use crate::scheduler::{Debouncer, RenderScheduler, Throttle};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::store::{DrawingSnapshot, MapRecord, MemoryStore, SESSION_KEY, StateStore};
use crate::tools::{AnnotationTool, StrokeStyle, ToolEffect, ToolEffects, ToolKind};
use kurbo::{Point, Size, Vec2};
use std::time::{Duration, Instant};
use wm_core::codec::decode_limited;
use wm_core::viewport::clamp_zoom_within;
use wm_core::{
    ContainerRect, EditorConfig, LayerId, LoadError, PixelGrid, PlanningError, SurfaceError, ViewportState,
    ViewportTransform, Waypoint,
};
use wm_render::paint::{self, CanvasTheme};
use wm_render::{LayerError, LayerStack, RasterSurface};

/// Layers created for every map, bottom to top.
pub const LAYER_ORDER: [(&str, i32); 5] = [
    (LayerId::BASE, 0),
    (LayerId::GRID, 10),
    (LayerId::DRAWING, 20),
    (LayerId::WAYPOINTS, 30),
    (LayerId::PATH, 40),
];

/// The sample under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelReadout {
    pub x: u32,
    pub y: u32,
    pub value: u8,
}

/// File identity carried into the persisted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSource {
    pub file: Vec<u8>,
    pub file_name: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

/// Everything that exists only while a map is loaded.
struct LoadedMap {
    source: MapSource,
    grid: PixelGrid,
    stack: LayerStack,
    history: HistoryLog,
    viewport: ViewportState,
    waypoints: Vec<Waypoint>,
    preview: Option<Waypoint>,
    path: Vec<Point>,
}

impl LoadedMap {
    /// Allocate and paint every layer. Nothing is kept on failure.
    fn build(
        source: MapSource,
        grid: PixelGrid,
        viewport: ViewportState,
        config: &EditorConfig,
        theme: &CanvasTheme,
    ) -> Result<Self, SurfaceError> {
        let (width, height) = (grid.width(), grid.height());
        let mut stack = LayerStack::new(width, height, theme.bg)?;
        for (name, z) in LAYER_ORDER {
            match stack.create_layer(LayerId::intern(name), z) {
                Ok(_) => {}
                Err(LayerError::Surface(err)) => return Err(err),
                // fresh stack with distinct names: nothing else can fail
                Err(err) => log::error!("layer {name} not created: {err}"),
            }
        }
        let mut map = Self {
            source,
            grid,
            stack,
            history: HistoryLog::new(LayerId::drawing(), config.history_capacity),
            viewport,
            waypoints: Vec::new(),
            preview: None,
            path: Vec::new(),
        };
        if let Ok(base) = map.stack.surface_mut(LayerId::base()) {
            paint::paint_base(base, &map.grid);
        }
        map.repaint_grid(config, theme);
        // the grid starts hidden
        if let Err(err) = map.stack.set_visibility(LayerId::grid(), false) {
            log::warn!("grid layer: {err}");
        }
        Ok(map)
    }

    fn repaint_grid(&mut self, config: &EditorConfig, theme: &CanvasTheme) {
        let scale = self.viewport.scale;
        if let Ok(surface) = self.stack.surface_mut(LayerId::grid()) {
            paint::paint_grid(surface, config.grid_spacing, scale, theme.grid);
        }
    }

    fn repaint_waypoints(&mut self, config: &EditorConfig, theme: &CanvasTheme) {
        if let Ok(surface) = self.stack.surface_mut(LayerId::waypoints()) {
            paint::paint_waypoints(surface, &self.waypoints, self.preview, config.arrow_length, theme);
        }
    }

    fn repaint_path(&mut self, theme: &CanvasTheme) {
        if let Ok(surface) = self.stack.surface_mut(LayerId::path()) {
            paint::paint_path(surface, &self.path, theme);
        }
    }

    fn record(&self) -> MapRecord {
        let drawing = self.stack.layer(LayerId::drawing()).map(|layer| {
            let surface = layer.surface();
            DrawingSnapshot {
                width: surface.width(),
                height: surface.height(),
                rgba: surface.to_rgba_bytes(),
            }
        });
        MapRecord {
            file: self.source.file.clone(),
            file_name: self.source.file_name.clone(),
            last_modified: self.source.last_modified,
            viewer_state: self.viewport,
            drawing,
            waypoints: self.waypoints.clone(),
        }
    }

    fn image_size(&self) -> Size {
        Size::new(self.grid.width() as f64, self.grid.height() as f64)
    }
}

/// One editing session over at most one map.
pub struct MapEditor<S = MemoryStore, P = LinearPlanner> {
    config: EditorConfig,
    theme: CanvasTheme,
    store: S,
    planner: P,
    container: ContainerRect,
    map: Option<LoadedMap>,
    tool: AnnotationTool,
    planning: bool,
    scheduler: RenderScheduler,
    /// Pointer moves thinned to one per frame; the latest held move is
    /// applied on the next `tick` or before the next pointer button event.
    pointer_throttle: Throttle<InputEvent>,
    persist: Debouncer,
    /// Latest time seen from the host.
    now: Instant,
}

impl Default for MapEditor {
    fn default() -> Self {
        let config = EditorConfig::default();
        let planner = LinearPlanner::new(config.planner_steps);
        Self::new(config, MemoryStore::new(), planner)
    }
}

impl<S: StateStore, P: PathPlanner> MapEditor<S, P> {
    pub fn new(config: EditorConfig, store: S, planner: P) -> Self {
        let frame = Duration::from_millis(config.frame_interval_ms);
        Self {
            tool: AnnotationTool::new(config.default_pen_size),
            scheduler: RenderScheduler::new(frame),
            pointer_throttle: Throttle::new(frame),
            persist: Debouncer::new(Duration::from_millis(config.persist_debounce_ms)),
            config,
            theme: CanvasTheme::default(),
            store,
            planner,
            container: ContainerRect::default(),
            map: None,
            planning: false,
            now: Instant::now(),
        }
    }

    pub fn with_theme(mut self, theme: CanvasTheme) -> Self {
        self.theme = theme;
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.map.is_some()
    }

    pub fn grid(&self) -> Option<&PixelGrid> {
        self.map.as_ref().map(|m| &m.grid)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.map.as_ref().map(|m| m.source.file_name.as_str())
    }

    pub fn stack(&self) -> Option<&LayerStack> {
        self.map.as_ref().map(|m| &m.stack)
    }

    pub fn history(&self) -> Option<&HistoryLog> {
        self.map.as_ref().map(|m| &m.history)
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        self.map.as_ref().map(|m| m.viewport)
    }

    pub fn transform(&self) -> Option<ViewportTransform> {
        self.map
            .as_ref()
            .map(|m| ViewportTransform::new(self.container, m.viewport))
    }

    pub fn container(&self) -> ContainerRect {
        self.container
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.map.as_ref().map_or(&[], |m| &m.waypoints)
    }

    /// Heading preview of a waypoint being placed.
    pub fn waypoint_preview(&self) -> Option<Waypoint> {
        self.map.as_ref().and_then(|m| m.preview)
    }

    pub fn path(&self) -> &[Point] {
        self.map.as_ref().map_or(&[], |m| &m.path)
    }

    pub fn tool(&self) -> &AnnotationTool {
        &self.tool
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        self.tool.style()
    }

    pub fn is_planning(&self) -> bool {
        self.planning
    }

    pub fn redraw_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn persist_pending(&self) -> bool {
        self.persist.is_armed()
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    /// Decode and show a new map, replacing the current one.
    ///
    /// A file that fails to decode leaves the current map untouched.
    pub fn load(&mut self, source: MapSource, now: Instant) -> Result<(), LoadError> {
        self.now = now;
        let grid = decode_limited(&source.file, self.config.max_file_bytes)?;
        let viewport = match self.stored_viewport_for(&source.file_name) {
            Some(mut stored) => {
                stored.scale = clamp_zoom_within(stored.scale, self.config.min_zoom, self.config.max_zoom);
                stored
            }
            None => self.fit_state(&grid),
        };

        // old surfaces go before the new ones are allocated
        self.unload();
        let map = match LoadedMap::build(source, grid, viewport, &self.config, &self.theme) {
            Ok(map) => map,
            Err(err) => {
                log::warn!("could not allocate layers: {err}");
                return Err(err.into());
            }
        };
        log::debug!(
            "loaded {} ({}x{}, maxval {})",
            map.source.file_name,
            map.grid.width(),
            map.grid.height(),
            map.grid.max_val()
        );
        self.map = Some(map);
        self.persist_now();
        self.request_redraw();
        Ok(())
    }

    /// Bring back the persisted session. `false` leaves no map loaded.
    pub fn restore_session(&mut self, now: Instant) -> bool {
        self.now = now;
        let stored = self
            .store
            .get(SESSION_KEY)
            .and_then(|bytes| bytes.map(|b| MapRecord::decode(&b)).transpose());
        let record = match stored {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("session restore failed: {err}");
                return false;
            }
        };
        let grid = match decode_limited(&record.file, self.config.max_file_bytes) {
            Ok(grid) => grid,
            Err(err) => {
                log::warn!("stored map {} is unreadable: {err}", record.file_name);
                return false;
            }
        };
        let source = MapSource {
            file: record.file,
            file_name: record.file_name,
            last_modified: record.last_modified,
        };
        let mut viewport = record.viewer_state;
        viewport.scale = clamp_zoom_within(viewport.scale, self.config.min_zoom, self.config.max_zoom);

        self.unload();
        let mut map = match LoadedMap::build(source, grid, viewport, &self.config, &self.theme) {
            Ok(map) => map,
            Err(err) => {
                log::warn!("could not allocate layers: {err}");
                return false;
            }
        };

        if let Some(drawing) = record.drawing {
            let restored = RasterSurface::from_rgba_bytes(drawing.width, drawing.height, &drawing.rgba)
                .map(|s| s.snapshot())
                .filter(|snap| snap.dimensions() == map.stack.dimensions());
            match restored {
                Some(snapshot) => {
                    if map.stack.restore(LayerId::drawing(), &snapshot).is_ok() {
                        map.history.set_baseline(snapshot);
                    }
                }
                None => log::warn!("stored drawing does not match the map; discarded"),
            }
        }
        map.waypoints = record.waypoints;
        map.repaint_waypoints(&self.config, &self.theme);

        log::debug!("restored session for {}", map.source.file_name);
        self.map = Some(map);
        self.request_redraw();
        true
    }

    /// Drop the current map and every surface it owns.
    pub fn unload(&mut self) {
        self.scheduler.cancel();
        self.persist.cancel();
        self.tool.interrupt();
        self.pointer_throttle.reset();
        self.planning = false;
        if let Some(mut map) = self.map.take() {
            map.stack.cleanup();
            log::debug!("unloaded {}", map.source.file_name);
        }
    }

    /// Shell-requested reset: no waypoints, empty drawing, empty history,
    /// and the persisted record deleted.
    pub fn clear_session(&mut self) {
        self.tool.interrupt();
        self.pointer_throttle.reset();
        self.persist.cancel();
        self.planning = false;
        if let Some(map) = self.map.as_mut() {
            map.waypoints.clear();
            map.preview = None;
            map.path.clear();
            if let Err(err) = map.stack.clear_layer(LayerId::drawing()) {
                log::warn!("could not clear drawing: {err}");
            }
            map.history.reset();
            map.repaint_waypoints(&self.config, &self.theme);
            map.repaint_path(&self.theme);
        }
        if let Err(err) = self.store.delete(SESSION_KEY) {
            log::warn!("could not delete stored session: {err}");
        }
        self.request_redraw();
    }

    fn stored_viewport_for(&self, file_name: &str) -> Option<ViewportState> {
        let bytes = self.store.get(SESSION_KEY).ok().flatten()?;
        let record = MapRecord::decode(&bytes).ok()?;
        (record.file_name == file_name).then_some(record.viewer_state)
    }

    fn fit_state(&self, grid: &PixelGrid) -> ViewportState {
        let image = Size::new(grid.width() as f64, grid.height() as f64);
        let view = ViewportTransform::new(self.container, ViewportState::default());
        ViewportState {
            scale: clamp_zoom_within(
                view.fit_scale(image, self.config.fit_padding),
                self.config.min_zoom,
                self.config.max_zoom,
            ),
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }

    // ─── Frame loop ──────────────────────────────────────────────────────

    fn request_redraw(&mut self) {
        if self.map.is_some() {
            self.scheduler.request(self.now);
        }
    }

    fn schedule_persist(&mut self) {
        if self.map.is_some() {
            self.persist.touch(self.now);
        }
    }

    /// Write the record now. Failures are logged and swallowed.
    pub fn persist_now(&mut self) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let result = map
            .record()
            .encode()
            .and_then(|bytes| self.store.put(SESSION_KEY, bytes));
        match result {
            Ok(()) => log::debug!("session saved"),
            Err(err) => log::warn!("session not saved: {err}"),
        }
    }

    /// Run due work: a debounced save, then a redraw if one is due.
    pub fn tick(&mut self, now: Instant) -> Option<&RasterSurface> {
        self.now = now;
        if let Some(event) = self.pointer_throttle.poll(now) {
            self.route_to_tool(&event);
        }
        if self.persist.poll(now) {
            self.persist_now();
        }
        if !self.scheduler.poll(now) {
            return None;
        }
        let map = self.map.as_mut()?;
        match map.stack.composite() {
            Ok(surface) => Some(surface),
            Err(err) => {
                log::warn!("composite failed: {err}");
                None
            }
        }
    }

    /// Composite immediately, bypassing the scheduler.
    pub fn composite_now(&mut self) -> Option<&RasterSurface> {
        self.scheduler.cancel();
        self.map.as_mut()?.stack.composite().ok()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) {
        self.now = now;
        match event {
            InputEvent::PointerMove { .. } => {
                if let Some(event) = self.pointer_throttle.offer(now, event.clone()) {
                    self.route_to_tool(&event);
                }
            }
            InputEvent::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => self.wheel(Point::new(*x, *y), Vec2::new(*dx, *dy), *modifiers),
            InputEvent::Key { key, modifiers } => {
                self.handle_key(key, *modifiers);
            }
            _ => {
                self.flush_pointer();
                self.route_to_tool(event);
            }
        }
    }

    fn route_to_tool(&mut self, event: &InputEvent) {
        let Some(view) = self.transform() else {
            return;
        };
        let effects = self.tool.handle(event, &view);
        self.apply(effects);
    }

    /// Apply a held pointer move now.
    fn flush_pointer(&mut self) {
        if let Some(event) = self.pointer_throttle.flush() {
            self.route_to_tool(&event);
        }
    }

    fn apply(&mut self, effects: ToolEffects) {
        for effect in effects {
            self.apply_one(effect);
        }
    }

    fn apply_one(&mut self, effect: ToolEffect) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        match effect {
            ToolEffect::Scroll(scroll) => {
                map.viewport.scroll_left = scroll.x;
                map.viewport.scroll_top = scroll.y;
                self.schedule_persist();
            }
            ToolEffect::Stroke { from, to, width, erase } => {
                let color = if erase { self.theme.eraser } else { self.theme.pen };
                match map.stack.surface_mut(LayerId::drawing()) {
                    Ok(surface) => surface.stroke_segment(from, to, width, color),
                    Err(err) => log::warn!("stroke dropped: {err}"),
                }
                self.request_redraw();
            }
            ToolEffect::CommitStroke => {
                if let Err(err) = map.history.commit(&map.stack) {
                    log::warn!("stroke not recorded: {err}");
                }
                self.schedule_persist();
            }
            ToolEffect::PreviewWaypoint(wp) => {
                map.preview = Some(wp);
                map.repaint_waypoints(&self.config, &self.theme);
                self.request_redraw();
            }
            ToolEffect::PlaceWaypoint(wp) => {
                map.preview = None;
                map.waypoints.push(wp);
                log::debug!("waypoint #{} at ({:.1}, {:.1}) θ={:.3}", map.waypoints.len(), wp.x, wp.y, wp.theta);
                self.waypoints_changed();
            }
            ToolEffect::CancelPreview => {
                map.preview = None;
                map.repaint_waypoints(&self.config, &self.theme);
                self.request_redraw();
            }
        }
    }

    /// Shift+wheel zooms about the pointer; a plain wheel scrolls.
    pub fn wheel(&mut self, at: Point, delta: Vec2, modifiers: Modifiers) {
        let Some(view) = self.transform() else {
            return;
        };
        if modifiers.shift {
            // browsers report shifted vertical wheels as horizontal
            let amount = if delta.y != 0.0 { delta.y } else { delta.x };
            let target = view.scale() - amount * self.config.wheel_zoom_speed;
            self.zoom_to(target, at);
        } else if let Some(map) = self.map.as_mut() {
            map.viewport.scroll_left = (map.viewport.scroll_left + delta.x).max(0.0);
            map.viewport.scroll_top = (map.viewport.scroll_top + delta.y).max(0.0);
            self.schedule_persist();
        }
    }

    /// Apply a keyboard shortcut. Returns the action taken, if any.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        match action {
            ShortcutAction::Tool(kind) => self.set_tool(kind),
            ShortcutAction::CycleTool => self.set_tool(self.tool.kind().next()),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::ZoomIn => self.zoom_by(self.config.zoom_step),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / self.config.zoom_step),
            ShortcutAction::ZoomToFit => self.fit_to_container(),
            ShortcutAction::ToggleGrid => {
                self.toggle_layer(LayerId::grid());
            }
        }
        Some(action)
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Zoom to `scale` (clamped), keeping the image point under `anchor` fixed.
    pub fn zoom_to(&mut self, scale: f64, anchor: Point) {
        let Some(view) = self.transform() else {
            return;
        };
        let state = view.zoom_at(scale, anchor, self.config.min_zoom, self.config.max_zoom);
        self.set_viewport(state);
    }

    /// Multiply the zoom by `factor` about the container centre.
    pub fn zoom_by(&mut self, factor: f64) {
        if let Some(view) = self.transform() {
            self.zoom_to(view.scale() * factor, self.container.center());
        }
    }

    pub fn fit_to_container(&mut self) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let view = ViewportTransform::new(self.container, map.viewport);
        let scale = clamp_zoom_within(
            view.fit_scale(map.image_size(), self.config.fit_padding),
            self.config.min_zoom,
            self.config.max_zoom,
        );
        self.set_viewport(ViewportState {
            scale,
            scroll_left: 0.0,
            scroll_top: 0.0,
        });
    }

    fn set_viewport(&mut self, state: ViewportState) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let rescaled = map.viewport.scale != state.scale;
        map.viewport = state;
        if rescaled {
            log::debug!("zoom {:.3}", state.scale);
            map.repaint_grid(&self.config, &self.theme);
            self.request_redraw();
        }
        self.schedule_persist();
    }

    pub fn set_container(&mut self, container: ContainerRect) {
        self.container = container;
        self.request_redraw();
    }

    pub fn pixel_at(&self, screen: Point) -> Option<PixelReadout> {
        let view = self.transform()?;
        let image = view.screen_to_image(screen);
        let (x, y, value) = self.map.as_ref()?.grid.sample_at(image.x, image.y)?;
        Some(PixelReadout { x, y, value })
    }

    // ─── Tools and layers ────────────────────────────────────────────────

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.flush_pointer();
        let effects = self.tool.set_kind(kind);
        self.apply(effects);
    }

    pub fn set_pen_size(&mut self, size: u32) {
        self.tool.set_pen_size(self.config.clamp_pen_size(size));
    }

    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Result<(), LayerError> {
        let map = self.map.as_mut().ok_or(LayerError::UnknownLayer(id))?;
        map.stack.set_visibility(id, visible)?;
        self.request_redraw();
        Ok(())
    }

    /// Flip a layer's visibility; returns the new state.
    pub fn toggle_layer(&mut self, id: LayerId) -> bool {
        let visible = !self.stack().is_some_and(|s| s.is_visible(id));
        match self.set_layer_visible(id, visible) {
            Ok(()) => visible,
            Err(err) => {
                log::warn!("cannot toggle {id}: {err}");
                !visible
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(HistoryLog::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(HistoryLog::redo)
    }

    fn step_history(&mut self, step: fn(&mut HistoryLog, &mut LayerStack) -> Result<bool, LayerError>) -> bool {
        // a stroke in progress becomes its own entry first
        self.flush_pointer();
        let effects = self.tool.interrupt();
        self.apply(effects);
        let Some(map) = self.map.as_mut() else {
            return false;
        };
        match step(&mut map.history, &mut map.stack) {
            Ok(true) => {
                self.request_redraw();
                self.schedule_persist();
                true
            }
            Ok(false) => false,
            Err(err) => {
                log::warn!("history step failed: {err}");
                false
            }
        }
    }

    // ─── Waypoints and planning ──────────────────────────────────────────

    /// Append a waypoint without going through the pointer tool.
    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        if let Some(map) = self.map.as_mut() {
            map.waypoints.push(waypoint);
            self.waypoints_changed();
        }
    }

    pub fn remove_waypoint(&mut self, index: usize) -> Option<Waypoint> {
        let map = self.map.as_mut()?;
        if index >= map.waypoints.len() {
            return None;
        }
        let removed = map.waypoints.remove(index);
        self.waypoints_changed();
        Some(removed)
    }

    pub fn clear_waypoints(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.waypoints.clear();
            self.waypoints_changed();
        }
    }

    /// Repaint markers and drop the now-stale planned path.
    fn waypoints_changed(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.path.clear();
            map.repaint_waypoints(&self.config, &self.theme);
            map.repaint_path(&self.theme);
        }
        self.request_redraw();
        self.schedule_persist();
    }

    /// Start a planning request: returns the waypoints to hand to a
    /// planner and marks the session as planning. `None` with no map loaded
    /// or while a request is already out.
    pub fn begin_planning(&mut self) -> Option<Vec<Waypoint>> {
        if self.planning {
            return None;
        }
        let map = self.map.as_ref()?;
        self.planning = true;
        log::debug!("planning through {} waypoints", map.waypoints.len());
        Some(map.waypoints.clone())
    }

    /// Deliver the outcome of the request opened by `begin_planning`.
    /// A path is stored and painted; an error leaves everything but the
    /// planning flag as it was. Returns the number of path points.
    pub fn finish_planning(&mut self, outcome: Result<Vec<Point>, PlanningError>) -> Result<usize, PlanningError> {
        if !std::mem::take(&mut self.planning) {
            log::debug!("plan result arrived with no request open; dropped");
            return outcome.map(|_| 0);
        }
        let path = match outcome {
            Ok(path) => path,
            Err(err) => {
                log::warn!("{err}");
                return Err(err);
            }
        };
        let Some(map) = self.map.as_mut() else {
            return Ok(0);
        };
        map.path = path;
        map.repaint_path(&self.theme);
        let n = map.path.len();
        self.request_redraw();
        Ok(n)
    }

    /// Plan with the session's own planner, start to finish.
    pub fn plan_path(&mut self) -> Result<usize, PlanningError> {
        let Some(waypoints) = self.begin_planning() else {
            return Ok(0);
        };
        let outcome = self.planner.plan(&waypoints);
        self.finish_planning(outcome)
    }
}
