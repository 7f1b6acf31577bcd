//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. On macOS `meta`
//! is ⌘; elsewhere `ctrl` plays the same role.

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),
    /// none → pen → eraser → waypoint → none.
    CycleTool,

    // ── Edit ──
    Undo,
    Redo,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ToggleGrid,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Escape"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                // shifted "=" on US layouts
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if modifiers.command() {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        if modifiers.alt {
            return None;
        }

        // ── Single keys ──
        match key {
            "p" | "P" => Some(ShortcutAction::Tool(ToolKind::Pen)),
            "e" | "E" => Some(ShortcutAction::Tool(ToolKind::Eraser)),
            "w" | "W" => Some(ShortcutAction::Tool(ToolKind::Waypoint)),
            "Escape" => Some(ShortcutAction::Tool(ToolKind::None)),
            "Tab" => Some(ShortcutAction::CycleTool),
            "g" | "G" => Some(ShortcutAction::ToggleGrid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMD: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };
    const CMD_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("p", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Pen))
        );
        assert_eq!(
            ShortcutMap::resolve("E", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Eraser))
        );
        assert_eq!(
            ShortcutMap::resolve("w", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::Waypoint))
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::Tool(ToolKind::None))
        );
        assert_eq!(ShortcutMap::resolve("Tab", Modifiers::NONE), Some(ShortcutAction::CycleTool));
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", CMD), Some(ShortcutAction::Undo));
        // Ctrl+Z → Undo
        assert_eq!(ShortcutMap::resolve("z", Modifiers::CTRL), Some(ShortcutAction::Undo));
        // Cmd+Shift+Z → Redo
        assert_eq!(ShortcutMap::resolve("Z", CMD_SHIFT), Some(ShortcutAction::Redo));
        // Cmd+Y → Redo
        assert_eq!(ShortcutMap::resolve("y", CMD), Some(ShortcutAction::Redo));
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(ShortcutMap::resolve("=", CMD), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("+", CMD_SHIFT), Some(ShortcutAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", Modifiers::CTRL), Some(ShortcutAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", CMD), Some(ShortcutAction::ZoomToFit));
    }

    #[test]
    fn bare_letters_need_no_modifier() {
        assert_eq!(ShortcutMap::resolve("g", Modifiers::NONE), Some(ShortcutAction::ToggleGrid));
        assert_eq!(ShortcutMap::resolve("p", CMD), None);
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
    }
}
