//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so it's shared across WASM and native.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,

    // ── Text ──
    ToggleBold,
    ToggleItalic,
    IncreaseFontSize,

    // ── Z-order ──
    BringToFront,
    SendToBack,

    // ── View ──
    ZoomIn,
    ZoomOut,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                // Shift turns the brackets into braces on most layouts.
                "]" | "}" => Some(ShortcutAction::BringToFront),
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "+" => Some(ShortcutAction::IncreaseFontSize),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "b" | "B" => Some(ShortcutAction::ToggleBold),
                "i" | "I" => Some(ShortcutAction::ToggleItalic),
                "]" => Some(ShortcutAction::BringToFront),
                "[" => Some(ShortcutAction::SendToBack),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", false, true, false, true),
            Some(ShortcutAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn resolve_text_styles() {
        assert_eq!(
            ShortcutMap::resolve("b", true, false, false, false),
            Some(ShortcutAction::ToggleBold)
        );
        assert_eq!(
            ShortcutMap::resolve("i", false, false, false, true),
            Some(ShortcutAction::ToggleItalic)
        );
        assert_eq!(
            ShortcutMap::resolve("+", true, true, false, false),
            Some(ShortcutAction::IncreaseFontSize)
        );
    }

    #[test]
    fn resolve_z_order() {
        assert_eq!(
            ShortcutMap::resolve("]", false, false, false, true),
            Some(ShortcutAction::BringToFront)
        );
        assert_eq!(
            ShortcutMap::resolve("[", true, false, false, false),
            Some(ShortcutAction::SendToBack)
        );
        assert_eq!(
            ShortcutMap::resolve("}", false, true, false, true),
            Some(ShortcutAction::BringToFront)
        );
    }

    #[test]
    fn resolve_duplicate_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("d", false, false, false, true),
            Some(ShortcutAction::Duplicate)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ShortcutMap::resolve("=", false, false, false, true),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", false, false, false, true),
            Some(ShortcutAction::ZoomOut)
        );
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("7", false, false, false, false), None);
    }

    #[test]
    fn resolve_modifier_precedence() {
        assert_eq!(ShortcutMap::resolve("z", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("b", false, false, false, false), None);
        // Shift alone does not delete differently.
        assert_eq!(
            ShortcutMap::resolve("Delete", false, true, false, false),
            Some(ShortcutAction::Delete)
        );
    }
}
