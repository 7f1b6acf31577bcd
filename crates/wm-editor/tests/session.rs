//! Session behaviour: loading, persistence, restore, planning, scheduling.

use pretty_assertions::assert_eq;
use std::f64::consts::FRAC_PI_2;
use std::time::{Duration, Instant};
use wm_core::{Color, EditorConfig, FormatError, LayerId, LoadError, PlanningError, StorageError, Waypoint};
use wm_editor::{
    InputEvent, LinearPlanner, MapEditor, MapRecord, MapSource, MemoryStore, Modifiers, PathPlanner, SESSION_KEY,
    StateStore, ToolKind,
};

fn map(name: &str, w: u32, h: u32, fill: u8) -> MapSource {
    let mut file = format!("P5\n# test map\n{w} {h}\n255\n").into_bytes();
    file.extend(std::iter::repeat_n(fill, (w * h) as usize));
    MapSource {
        file,
        file_name: name.into(),
        last_modified: 1_700_000_000_000,
    }
}

fn editor() -> MapEditor {
    MapEditor::default()
}

/// Monotonic fake clock, one frame per step by default.
struct Clock(Instant);

impl Clock {
    fn new() -> Self {
        Self(Instant::now())
    }

    fn now(&self) -> Instant {
        self.0
    }

    fn advance(&mut self, ms: u64) -> Instant {
        self.0 += Duration::from_millis(ms);
        self.0
    }
}

fn stored_record(editor: &MapEditor) -> MapRecord {
    let bytes = editor.store().get(SESSION_KEY).unwrap().unwrap();
    MapRecord::decode(&bytes).unwrap()
}

struct OfflineStore;

impl StateStore for OfflineStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Backend("offline".into()))
    }

    fn put(&mut self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
        Err(StorageError::Backend("offline".into()))
    }

    fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("offline".into()))
    }
}

struct NoRoute;

impl PathPlanner for NoRoute {
    fn plan(&mut self, _waypoints: &[Waypoint]) -> Result<Vec<kurbo::Point>, PlanningError> {
        Err(PlanningError("no route".into()))
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────

#[test]
fn bad_file_leaves_current_map_intact() {
    let clock = Clock::new();
    let mut ed = editor();
    ed.load(map("first.pgm", 6, 6, 90), clock.now()).unwrap();
    ed.set_tool(ToolKind::Waypoint);
    ed.handle_event(&InputEvent::pointer_down(2.0, 2.0), clock.now());
    ed.handle_event(&InputEvent::pointer_up(4.0, 2.0), clock.now());

    let bad = MapSource {
        file: b"P6 6 6 255\n".to_vec(),
        file_name: "second.ppm".into(),
        last_modified: 0,
    };
    let err = ed.load(bad, clock.now()).unwrap_err();
    assert!(matches!(err, LoadError::Format(FormatError::BadMagic { .. })));

    assert_eq!(ed.file_name(), Some("first.pgm"));
    assert_eq!(ed.waypoints().len(), 1);
    assert_eq!(ed.grid().unwrap().sample(0, 0), Some(90));
    assert!(!ed.stack().unwrap().is_released());
}

#[test]
fn oversize_file_rejected_before_decoding() {
    let config = EditorConfig {
        max_file_bytes: 64,
        ..EditorConfig::default()
    };
    let mut ed = MapEditor::new(config, MemoryStore::new(), LinearPlanner::default());
    let err = ed.load(map("big.pgm", 10, 10, 0), Instant::now()).unwrap_err();
    assert!(matches!(err, LoadError::Oversize(_)));
    assert!(!ed.is_loaded());
}

#[test]
fn loading_a_new_map_resets_annotations() {
    let clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 6, 6, 0), clock.now()).unwrap();
    ed.set_tool(ToolKind::Waypoint);
    ed.handle_event(&InputEvent::pointer_down(1.0, 1.0), clock.now());
    ed.handle_event(&InputEvent::pointer_up(3.0, 1.0), clock.now());

    ed.load(map("b.pgm", 3, 3, 0), clock.now()).unwrap();
    assert!(ed.waypoints().is_empty());
    assert_eq!(ed.history().unwrap().len(), 0);
    assert_eq!(ed.stack().unwrap().dimensions(), (3, 3));
}

// ─── Persistence ─────────────────────────────────────────────────────────

#[test]
fn load_writes_the_record_immediately() {
    let mut ed = editor();
    ed.load(map("office.pgm", 4, 4, 7), Instant::now()).unwrap();
    let record = stored_record(&ed);
    assert_eq!(record.file_name, "office.pgm");
    assert_eq!(record.last_modified, 1_700_000_000_000);
    assert!(record.waypoints.is_empty());
}

#[test]
fn same_file_reuses_stored_viewer_state() {
    let clock = Clock::new();
    let mut ed = editor();
    ed.load(map("office.pgm", 40, 40, 7), clock.now()).unwrap();
    ed.zoom_to(3.0, kurbo::Point::ZERO);
    ed.persist_now();

    ed.load(map("office.pgm", 40, 40, 7), clock.now()).unwrap();
    assert_eq!(ed.viewport().unwrap().scale, 3.0);

    ed.load(map("other.pgm", 40, 40, 7), clock.now()).unwrap();
    assert_eq!(ed.viewport().unwrap().scale, 1.0);
}

#[test]
fn stored_zoom_is_clamped_to_the_configured_range() {
    let now = Instant::now();
    let mut wide = editor();
    wide.load(map("office.pgm", 40, 40, 7), now).unwrap();
    wide.zoom_to(4.0, kurbo::Point::ZERO);
    wide.persist_now();

    let config = EditorConfig {
        max_zoom: 2.0,
        ..EditorConfig::default()
    };
    let mut narrow = MapEditor::new(config, wide.store().clone(), LinearPlanner::default());
    narrow.load(map("office.pgm", 40, 40, 7), now).unwrap();
    assert_eq!(narrow.viewport().unwrap().scale, 2.0);
}

#[test]
fn stroke_persists_after_quiet_period() {
    let mut clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 8, 8, 255), clock.now()).unwrap();
    ed.set_tool(ToolKind::Pen);
    ed.handle_event(&InputEvent::pointer_down(1.0, 1.0), clock.now());
    ed.handle_event(&InputEvent::pointer_move(6.0, 6.0), clock.advance(20));
    ed.handle_event(&InputEvent::pointer_up(6.0, 6.0), clock.advance(20));
    assert!(ed.persist_pending());

    ed.tick(clock.advance(100));
    let drawing = stored_record(&ed).drawing.unwrap();
    assert!(drawing.rgba.iter().all(|&b| b == 0), "written before the quiet period");

    ed.tick(clock.advance(500));
    let drawing = stored_record(&ed).drawing.unwrap();
    assert!(drawing.rgba.iter().any(|&b| b != 0));
    assert!(!ed.persist_pending());
}

#[test]
fn storage_failures_never_interrupt_editing() {
    let clock = Clock::new();
    let mut ed = MapEditor::new(EditorConfig::default(), OfflineStore, LinearPlanner::default());
    ed.load(map("a.pgm", 8, 8, 255), clock.now()).unwrap();
    ed.set_tool(ToolKind::Pen);
    ed.handle_event(&InputEvent::pointer_down(1.0, 1.0), clock.now());
    ed.handle_event(&InputEvent::pointer_up(1.0, 1.0), clock.now());
    ed.persist_now();
    ed.clear_session();
    assert!(ed.is_loaded());
    assert!(!ed.restore_session(clock.now()));
}

#[test]
fn session_round_trips_through_the_store() {
    let mut clock = Clock::new();
    let mut first = editor();
    first.load(map("lab.pgm", 30, 20, 128), clock.now()).unwrap();
    first.zoom_to(2.0, kurbo::Point::new(10.0, 10.0));

    first.set_tool(ToolKind::Pen);
    first.handle_event(&InputEvent::pointer_down(4.0, 4.0), clock.advance(20));
    first.handle_event(&InputEvent::pointer_move(20.0, 8.0), clock.advance(20));
    first.handle_event(&InputEvent::pointer_up(20.0, 8.0), clock.advance(20));

    first.set_tool(ToolKind::Waypoint);
    first.handle_event(&InputEvent::pointer_down(30.0, 30.0), clock.advance(20));
    first.handle_event(&InputEvent::pointer_up(30.0, 40.0), clock.advance(20));
    first.persist_now();

    let mut second = MapEditor::new(EditorConfig::default(), first.store().clone(), LinearPlanner::default());
    assert!(second.restore_session(clock.now()));

    assert_eq!(second.file_name(), Some("lab.pgm"));
    assert_eq!(second.viewport(), first.viewport());
    assert_eq!(second.waypoints(), first.waypoints());
    assert_eq!(
        second.stack().unwrap().snapshot(LayerId::drawing()).unwrap(),
        first.stack().unwrap().snapshot(LayerId::drawing()).unwrap()
    );
    // restored pixels are the baseline, not an undoable step
    assert!(!second.undo());
}

#[test]
fn nothing_to_restore() {
    let mut ed = editor();
    assert!(!ed.restore_session(Instant::now()));
    assert!(!ed.is_loaded());
}

#[test]
fn clear_session_wipes_annotations_and_record() {
    let clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 8, 8, 255), clock.now()).unwrap();
    ed.set_tool(ToolKind::Pen);
    ed.handle_event(&InputEvent::pointer_down(2.0, 2.0), clock.now());
    ed.handle_event(&InputEvent::pointer_up(2.0, 2.0), clock.now());
    ed.set_tool(ToolKind::Waypoint);
    ed.handle_event(&InputEvent::pointer_down(1.0, 1.0), clock.now());
    ed.handle_event(&InputEvent::pointer_up(5.0, 1.0), clock.now());

    ed.clear_session();

    assert!(ed.waypoints().is_empty());
    assert_eq!(ed.history().unwrap().len(), 0);
    let stack = ed.stack().unwrap();
    assert!(stack.layer(LayerId::drawing()).unwrap().surface().is_blank());
    assert!(stack.layer(LayerId::waypoints()).unwrap().surface().is_blank());
    assert_eq!(ed.store().get(SESSION_KEY).unwrap(), None);
    assert!(!ed.persist_pending());
}

// ─── Planning ────────────────────────────────────────────────────────────

fn with_two_waypoints<P: PathPlanner>(ed: &mut MapEditor<MemoryStore, P>) {
    let now = Instant::now();
    ed.load(map("a.pgm", 64, 64, 255), now).unwrap();
    ed.set_tool(ToolKind::Waypoint);
    ed.handle_event(&InputEvent::pointer_down(10.0, 10.0), now);
    ed.handle_event(&InputEvent::pointer_up(20.0, 10.0), now);
    ed.handle_event(&InputEvent::pointer_down(50.0, 40.0), now);
    ed.handle_event(&InputEvent::pointer_up(50.0, 60.0), now);
}

#[test]
fn plan_paints_the_path_layer() {
    let mut ed = editor();
    with_two_waypoints(&mut ed);

    assert_eq!(ed.plan_path().unwrap(), 21);
    assert_eq!(ed.path().first(), Some(&kurbo::Point::new(10.0, 10.0)));
    assert_eq!(ed.path().last(), Some(&kurbo::Point::new(50.0, 40.0)));
    assert!(!ed.stack().unwrap().layer(LayerId::path()).unwrap().surface().is_blank());

    // editing waypoints makes the path stale
    assert_eq!(ed.remove_waypoint(0), Some(Waypoint::new(10.0, 10.0, 0.0)));
    assert!(ed.path().is_empty());
    assert!(ed.stack().unwrap().layer(LayerId::path()).unwrap().surface().is_blank());
}

#[test]
fn planning_failure_keeps_waypoints() {
    let mut ed = MapEditor::new(EditorConfig::default(), MemoryStore::new(), NoRoute);
    with_two_waypoints(&mut ed);
    let before = ed.waypoints().to_vec();

    assert_eq!(ed.plan_path().unwrap_err(), PlanningError("no route".into()));
    assert!(!ed.is_planning());
    assert_eq!(ed.waypoints(), before.as_slice());
    assert!(ed.path().is_empty());
}

#[test]
fn planning_state_spans_the_request() {
    let mut ed = editor();
    with_two_waypoints(&mut ed);

    let request = ed.begin_planning().unwrap();
    assert_eq!(request.len(), 2);
    assert!(ed.is_planning());
    // one request at a time
    assert_eq!(ed.begin_planning(), None);

    let path = LinearPlanner::new(4).plan(&request).unwrap();
    assert_eq!(ed.finish_planning(Ok(path)).unwrap(), 5);
    assert!(!ed.is_planning());
    assert_eq!(ed.path().len(), 5);
    assert!(!ed.stack().unwrap().layer(LayerId::path()).unwrap().surface().is_blank());
}

#[test]
fn failed_request_resets_planning_state() {
    let mut ed = editor();
    with_two_waypoints(&mut ed);
    let before = ed.waypoints().to_vec();

    ed.begin_planning().unwrap();
    let err = ed.finish_planning(Err(PlanningError("timeout".into()))).unwrap_err();
    assert_eq!(err, PlanningError("timeout".into()));
    assert!(!ed.is_planning());
    assert_eq!(ed.waypoints(), before.as_slice());
    assert!(ed.path().is_empty());
    // a new request may start
    assert!(ed.begin_planning().is_some());
}

#[test]
fn unloading_abandons_the_request() {
    let mut ed = editor();
    with_two_waypoints(&mut ed);
    ed.begin_planning().unwrap();
    ed.unload();
    assert!(!ed.is_planning());
    assert_eq!(ed.finish_planning(Ok(vec![kurbo::Point::ZERO])), Ok(0));
}

#[test]
fn clear_waypoints_empties_the_layer() {
    let mut ed = editor();
    with_two_waypoints(&mut ed);
    ed.clear_waypoints();
    assert!(ed.waypoints().is_empty());
    assert!(ed.stack().unwrap().layer(LayerId::waypoints()).unwrap().surface().is_blank());
    assert_eq!(ed.remove_waypoint(0), None);
}

// ─── Scheduling and view ─────────────────────────────────────────────────

#[test]
fn redraws_are_coalesced_per_frame() {
    let mut clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 8, 8, 255), clock.now()).unwrap();
    assert!(ed.tick(clock.now()).is_some());

    ed.set_tool(ToolKind::Pen);
    ed.handle_event(&InputEvent::pointer_down(1.0, 1.0), clock.advance(2));
    ed.handle_event(&InputEvent::pointer_move(5.0, 5.0), clock.advance(2));
    // still inside the frame that just rendered
    assert!(ed.tick(clock.advance(2)).is_none());
    assert!(ed.tick(clock.advance(10)).is_some());
    assert!(ed.tick(clock.advance(1)).is_none());
}

#[test]
fn unloading_cancels_pending_redraw() {
    let mut ed = editor();
    let now = Instant::now();
    ed.load(map("a.pgm", 8, 8, 255), now).unwrap();
    assert!(ed.redraw_pending());
    ed.unload();
    assert!(!ed.redraw_pending());
    assert!(ed.tick(now + Duration::from_secs(1)).is_none());
}

#[test]
fn held_pointer_move_lands_on_the_next_frame() {
    let mut clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 40, 10, 255), clock.now()).unwrap();
    ed.set_pen_size(2);
    ed.set_tool(ToolKind::Pen);

    ed.handle_event(&InputEvent::pointer_down(2.0, 5.0), clock.now());
    ed.handle_event(&InputEvent::pointer_move(10.0, 5.0), clock.advance(20));
    // 5 ms later: inside the frame, held rather than applied
    ed.handle_event(&InputEvent::pointer_move(35.0, 5.0), clock.advance(5));
    let drawing = |ed: &MapEditor, x| {
        ed.stack()
            .unwrap()
            .layer(LayerId::drawing())
            .unwrap()
            .surface()
            .pixel(x, 5)
    };
    assert_eq!(drawing(&ed, 30), Some(Color::TRANSPARENT));

    for _ in 0..3 {
        ed.tick(clock.advance(16));
    }
    assert_eq!(drawing(&ed, 9), Some(Color::BLACK));
    assert_eq!(drawing(&ed, 30), Some(Color::BLACK));

    ed.handle_event(&InputEvent::pointer_up(35.0, 5.0), clock.advance(300));
    assert_eq!(ed.history().unwrap().len(), 1);
}

#[test]
fn release_applies_the_held_move_first() {
    let mut clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 40, 10, 255), clock.now()).unwrap();
    ed.set_pen_size(2);
    ed.set_tool(ToolKind::Pen);

    ed.handle_event(&InputEvent::pointer_down(2.0, 5.0), clock.now());
    ed.handle_event(&InputEvent::pointer_move(10.0, 5.0), clock.advance(1));
    ed.handle_event(&InputEvent::pointer_move(35.0, 5.0), clock.advance(4));
    ed.handle_event(&InputEvent::pointer_up(35.0, 5.0), clock.advance(1));

    let surface = ed.stack().unwrap().layer(LayerId::drawing()).unwrap().surface();
    assert_eq!(surface.pixel(30, 5), Some(Color::BLACK));
    assert!(ed.tool().is_idle());
}

#[test]
fn held_move_updates_the_waypoint_preview() {
    let mut clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 40, 40, 255), clock.now()).unwrap();
    ed.set_tool(ToolKind::Waypoint);
    ed.handle_event(&InputEvent::pointer_down(10.0, 10.0), clock.now());
    ed.handle_event(&InputEvent::pointer_move(20.0, 10.0), clock.advance(1));
    ed.handle_event(&InputEvent::pointer_move(10.0, 20.0), clock.advance(5));
    assert_eq!(ed.waypoint_preview().map(|w| w.theta), Some(0.0));

    ed.tick(clock.advance(16));
    let theta = ed.waypoint_preview().unwrap().theta;
    assert!((theta - FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn shift_wheel_zooms_about_the_pointer() {
    let mut ed = editor();
    ed.load(map("a.pgm", 100, 100, 255), Instant::now()).unwrap();
    let anchor = kurbo::Point::new(40.0, 30.0);
    let before = ed.transform().unwrap().screen_to_image(anchor);

    ed.handle_event(
        &InputEvent::Wheel {
            x: anchor.x,
            y: anchor.y,
            dx: 0.0,
            dy: -500.0,
            modifiers: Modifiers::SHIFT,
        },
        Instant::now(),
    );
    let view = ed.transform().unwrap();
    assert!((view.scale() - 1.5).abs() < 1e-12);
    assert!((view.screen_to_image(anchor) - before).hypot() < 1e-9);
}

#[test]
fn plain_wheel_scrolls_and_clamps() {
    let mut ed = editor();
    ed.load(map("a.pgm", 100, 100, 255), Instant::now()).unwrap();
    ed.handle_event(
        &InputEvent::Wheel {
            x: 0.0,
            y: 0.0,
            dx: -30.0,
            dy: 45.0,
            modifiers: Modifiers::NONE,
        },
        Instant::now(),
    );
    let v = ed.viewport().unwrap();
    assert_eq!((v.scroll_left, v.scroll_top), (0.0, 45.0));
}

#[test]
fn keyboard_zoom_and_fit() {
    let mut ed = editor();
    ed.load(map("a.pgm", 100, 100, 255), Instant::now()).unwrap();
    ed.handle_key("=", Modifiers::CTRL);
    assert!((ed.viewport().unwrap().scale - 1.25).abs() < 1e-12);
    ed.handle_key("0", Modifiers::CTRL);
    assert_eq!(ed.viewport().unwrap().scale, 1.0);
    for _ in 0..20 {
        ed.handle_key("=", Modifiers::CTRL);
    }
    assert_eq!(ed.viewport().unwrap().scale, 5.0);
}

#[test]
fn undo_shortcut_mid_stroke_commits_first() {
    let clock = Clock::new();
    let mut ed = editor();
    ed.load(map("a.pgm", 8, 8, 255), clock.now()).unwrap();
    ed.set_tool(ToolKind::Pen);
    ed.handle_event(&InputEvent::pointer_down(2.0, 2.0), clock.now());
    ed.handle_event(&InputEvent::key("z", Modifiers::CTRL), clock.now());

    // the interrupted stroke was recorded, then undone
    assert_eq!(ed.history().unwrap().len(), 1);
    assert_eq!(ed.history().unwrap().cursor(), None);
    assert!(ed.stack().unwrap().layer(LayerId::drawing()).unwrap().surface().is_blank());
}
