//! Session configuration and the stage view.

use serde::{Deserialize, Serialize};
use tc_core::Color;

/// Options for a new `EditorSession`. Every field has a default, so a host
/// may pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Stage width in CSS pixels.
    pub width: f32,
    /// Stage height in CSS pixels.
    pub height: f32,
    /// Maximum number of snapshots kept in the history.
    pub history_limit: usize,
    /// Set by the host after probing the rendering engine's filter support.
    pub filters_available: bool,
    /// Offset applied to both axes of a duplicated node.
    pub duplicate_offset: f32,
    pub stage_background: Color,
    /// Fraction of the stage an inserted image may occupy on each axis.
    pub image_fit: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 550.0,
            history_limit: 50,
            filters_available: true,
            duplicate_offset: 20.0,
            stage_background: Color::from_rgba8(0x33, 0x33, 0x33, 0xFF),
            image_fit: 0.8,
        }
    }
}

pub const MAX_ZOOM: f32 = 2.0;
pub const MIN_ZOOM: f32 = 0.5;

/// Stage size, zoom and background. Not part of the history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
    pub background: Color,
}

impl StageView {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            zoom: 1.0,
            background: config.stage_background,
        }
    }

    /// Scale by 1.1 while below the maximum zoom.
    pub fn zoom_in(&mut self) -> bool {
        if self.zoom < MAX_ZOOM {
            self.zoom *= 1.1;
            true
        } else {
            false
        }
    }

    /// Scale by 0.9 while above the minimum zoom.
    pub fn zoom_out(&mut self) -> bool {
        if self.zoom > MIN_ZOOM {
            self.zoom *= 0.9;
            true
        } else {
            false
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("ignoring stage resize to {width}x{height}");
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_uses_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"historyLimit": 10, "filtersAvailable": false}"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert!(!config.filters_available);
        assert_eq!(config.width, 300.0);
        assert_eq!(config.stage_background.to_hex(), "#333333");
    }

    #[test]
    fn zoom_is_bounded() {
        let mut view = StageView::new(&EditorConfig::default());
        let mut steps = 0;
        while view.zoom_in() {
            steps += 1;
        }
        assert_eq!(steps, 8);
        assert!(view.zoom >= MAX_ZOOM);

        while view.zoom_out() {}
        assert!(view.zoom <= MIN_ZOOM);
        assert!(view.zoom > MIN_ZOOM * 0.9 - 1e-6);
    }

    #[test]
    fn resize_rejects_nonsense() {
        let mut view = StageView::new(&EditorConfig::default());
        assert!(view.resize(1080.0, 1920.0));
        assert!(!view.resize(0.0, 10.0));
        assert!(!view.resize(f32::NAN, 10.0));
        assert_eq!((view.width, view.height), (1080.0, 1920.0));
    }
}
