pub mod history;
pub mod input;
pub mod planner;
pub mod scheduler;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod tools;

pub use history::HistoryLog;
pub use input::{InputEvent, Modifiers};
pub use planner::{LinearPlanner, PathPlanner};
pub use scheduler::{Debouncer, RenderScheduler, Throttle};
pub use session::{MapEditor, MapSource, PixelReadout};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{MapRecord, MemoryStore, SESSION_KEY, StateStore};
pub use tools::{AnnotationTool, StrokeStyle, ToolEffect, ToolKind, ToolState};
