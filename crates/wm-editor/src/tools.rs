//! Pointer state machine for annotating a map.
//!
//! The tool never touches rasters itself. It translates input events,
//! through the viewport transform, into a short list of `ToolEffect`s that
//! the session applies to the layer stack, history, and waypoint list.
//!
//! ## States
//!
//! | State | Entered by | Left by |
//! |-------|------------|---------|
//! | `Idle` | — | pointer down |
//! | `Panning` | down with no tool | up, leave |
//! | `Drawing` | down with pen/eraser | up, leave |
//! | `PlacingWaypoint` | down with waypoint tool | up, leave (dropped) |

use crate::input::InputEvent;
use kurbo::{Point, Vec2};
use smallvec::{SmallVec, smallvec};
use wm_core::{ViewportTransform, Waypoint, heading};

/// The active tool determines how pointer input is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolKind {
    /// Dragging pans the view.
    #[default]
    None,
    Pen,
    Eraser,
    Waypoint,
}

impl ToolKind {
    /// Cycle order: none → pen → eraser → waypoint → none.
    pub fn next(self) -> Self {
        match self {
            ToolKind::None => ToolKind::Pen,
            ToolKind::Pen => ToolKind::Eraser,
            ToolKind::Eraser => ToolKind::Waypoint,
            ToolKind::Waypoint => ToolKind::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolKind::None => "none",
            ToolKind::Pen => "pen",
            ToolKind::Eraser => "eraser",
            ToolKind::Waypoint => "waypoint",
        }
    }
}

/// Current tool and pen size. Session state only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeStyle {
    pub tool: ToolKind,
    /// On-screen stroke width in pixels.
    pub pen_size: u32,
}

/// Where the pointer state machine is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolState {
    Idle,
    Panning { down: Point, anchor_scroll: Vec2 },
    /// `last` is the previous stroke point in image space.
    Drawing { last: Point },
    /// `anchor` is in image space; `theta` is the live preview heading.
    PlacingWaypoint { anchor: Point, theta: f64 },
}

/// What the session must do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEffect {
    /// Set the scroll offsets.
    Scroll(Vec2),
    /// Paint a round-capped segment on the drawing layer (image space).
    Stroke {
        from: Point,
        to: Point,
        width: f64,
        erase: bool,
    },
    /// A stroke is complete: one history entry, one persistence request.
    CommitStroke,
    PreviewWaypoint(Waypoint),
    PlaceWaypoint(Waypoint),
    /// Drop the provisional waypoint without placing it.
    CancelPreview,
}

pub type ToolEffects = SmallVec<[ToolEffect; 2]>;

/// The pen / eraser / waypoint / pan state machine.
#[derive(Debug, Clone)]
pub struct AnnotationTool {
    style: StrokeStyle,
    state: ToolState,
}

impl AnnotationTool {
    pub fn new(pen_size: u32) -> Self {
        Self {
            style: StrokeStyle {
                tool: ToolKind::None,
                pen_size,
            },
            state: ToolState::Idle,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.style.tool
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ToolState::Idle)
    }

    /// Caller clamps `size` to the configured range.
    pub fn set_pen_size(&mut self, size: u32) {
        self.style.pen_size = size;
    }

    /// Switch tools. An interaction in progress is ended first: a stroke is
    /// committed as-is, a pan or waypoint placement is dropped.
    pub fn set_kind(&mut self, kind: ToolKind) -> ToolEffects {
        let effects = self.interrupt();
        if self.style.tool != kind {
            log::debug!("tool {} -> {}", self.style.tool.label(), kind.label());
        }
        self.style.tool = kind;
        effects
    }

    /// Return to `Idle`, reporting what an interrupted interaction leaves behind.
    pub fn interrupt(&mut self) -> ToolEffects {
        let effects = match self.state {
            ToolState::Drawing { .. } => smallvec![ToolEffect::CommitStroke],
            ToolState::PlacingWaypoint { .. } => smallvec![ToolEffect::CancelPreview],
            ToolState::Idle | ToolState::Panning { .. } => SmallVec::new(),
        };
        self.state = ToolState::Idle;
        effects
    }

    /// Handle a pointer event. Wheel and key events are ignored here.
    pub fn handle(&mut self, event: &InputEvent, view: &ViewportTransform) -> ToolEffects {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y), view),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y), view),
            InputEvent::PointerUp { x, y } => self.pointer_up(Some(Point::new(*x, *y)), view),
            InputEvent::PointerLeave => self.pointer_up(None, view),
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => SmallVec::new(),
        }
    }

    fn stroke_width(&self, view: &ViewportTransform) -> f64 {
        self.style.pen_size as f64 / view.scale()
    }

    fn pointer_down(&mut self, screen: Point, view: &ViewportTransform) -> ToolEffects {
        if !self.is_idle() {
            return SmallVec::new();
        }
        let image = view.screen_to_image(screen);
        match self.style.tool {
            ToolKind::None => {
                self.state = ToolState::Panning {
                    down: screen,
                    anchor_scroll: Vec2::new(view.state.scroll_left, view.state.scroll_top),
                };
                SmallVec::new()
            }
            ToolKind::Pen | ToolKind::Eraser => {
                self.state = ToolState::Drawing { last: image };
                // a click without motion still leaves a dot
                smallvec![ToolEffect::Stroke {
                    from: image,
                    to: image,
                    width: self.stroke_width(view),
                    erase: self.style.tool == ToolKind::Eraser,
                }]
            }
            ToolKind::Waypoint => {
                self.state = ToolState::PlacingWaypoint {
                    anchor: image,
                    theta: 0.0,
                };
                smallvec![ToolEffect::PreviewWaypoint(Waypoint::new(image.x, image.y, 0.0))]
            }
        }
    }

    fn pointer_move(&mut self, screen: Point, view: &ViewportTransform) -> ToolEffects {
        match self.state {
            ToolState::Idle => SmallVec::new(),
            ToolState::Panning { down, anchor_scroll } => {
                smallvec![ToolEffect::Scroll(ViewportTransform::pan(anchor_scroll, down, screen))]
            }
            ToolState::Drawing { last } => {
                let image = view.screen_to_image(screen);
                self.state = ToolState::Drawing { last: image };
                smallvec![ToolEffect::Stroke {
                    from: last,
                    to: image,
                    width: self.stroke_width(view),
                    erase: self.style.tool == ToolKind::Eraser,
                }]
            }
            ToolState::PlacingWaypoint { anchor, .. } => {
                let preview = Waypoint::aimed(anchor, view.screen_to_image(screen));
                self.state = ToolState::PlacingWaypoint {
                    anchor,
                    theta: preview.theta,
                };
                smallvec![ToolEffect::PreviewWaypoint(preview)]
            }
        }
    }

    /// `screen` is `None` for pointer-leave.
    fn pointer_up(&mut self, screen: Option<Point>, view: &ViewportTransform) -> ToolEffects {
        let state = std::mem::replace(&mut self.state, ToolState::Idle);
        match (state, screen) {
            (ToolState::Idle | ToolState::Panning { .. }, _) => SmallVec::new(),
            (ToolState::Drawing { .. }, _) => smallvec![ToolEffect::CommitStroke],
            (ToolState::PlacingWaypoint { anchor, .. }, Some(screen)) => {
                let theta = heading(anchor, view.screen_to_image(screen));
                smallvec![ToolEffect::PlaceWaypoint(Waypoint::new(anchor.x, anchor.y, theta))]
            }
            (ToolState::PlacingWaypoint { .. }, None) => smallvec![ToolEffect::CancelPreview],
        }
    }
}
