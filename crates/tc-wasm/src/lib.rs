//! WASM bridge for Twin Clouds: exposes the editor session to the page.
//!
//! Compiled via `wasm-pack build --target web`. Every call that can fail
//! answers with a small JSON string so the page never sees a thrown
//! exception from a bad input.

mod render2d;

use render2d::{BitmapCache, Overlay};
use std::collections::HashMap;
use tc_core::*;
use tc_editor::*;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The page-facing editor.
///
/// Owns one editor session plus the scratch canvases its images are drawn
/// from. All interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct DesignCanvas {
    session: EditorSession,
    bitmaps: BitmapCache,
}

#[wasm_bindgen]
impl DesignCanvas {
    /// Create an editor with the welcome text. `filters_available` reports
    /// whether the page can afford per-pixel filtering.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, filters_available: bool) -> Result<DesignCanvas, JsValue> {
        setup_console();
        let config = EditorConfig {
            width,
            height,
            filters_available,
            ..Default::default()
        };
        let session = EditorSession::new(config).map_err(to_js)?;
        Ok(Self {
            session,
            bitmaps: BitmapCache::default(),
        })
    }

    /// Render the stage to a Canvas2D context at `time_ms` (page clock).
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d, time_ms: f64) {
        self.refresh_bitmaps();
        let overrides: HashMap<NodeId, Presentation> = self
            .session
            .animation_frame(time_ms / 1000.0)
            .into_iter()
            .collect();
        let view = *self.session.view();
        let overlay = Overlay {
            zoom: view.zoom as f64,
            background: view.background,
            overrides: &overrides,
            bitmaps: &self.bitmaps,
        };
        render2d::render_scene(
            ctx,
            self.session.graph(),
            view.width as f64,
            view.height as f64,
            &overlay,
        );
    }

    // ─── Templates and documents ─────────────────────────────────────────

    /// Template ids and labels: `[{"id":"carousel_template","label":"..."}]`.
    pub fn template_list(&self) -> String {
        let list: Vec<serde_json::Value> = TemplateId::ALL
            .iter()
            .map(|t| serde_json::json!({ "id": t.as_str(), "label": t.label() }))
            .collect();
        serde_json::Value::Array(list).to_string()
    }

    pub fn load_template(&mut self, name: &str) -> String {
        status(self.session.load_template_named(name))
    }

    /// Replace the design with a layer document.
    pub fn import_json(&mut self, json: &str) -> String {
        status(self.session.import_json(json))
    }

    /// The design as a pretty-printed layer document.
    pub fn export_json(&self) -> String {
        self.session
            .export_json()
            .unwrap_or_else(|e| error_json(&e.to_string()))
    }

    // ─── Adding content ──────────────────────────────────────────────────

    /// Returns the new node id, or an empty string on bad input.
    pub fn add_text(&mut self, content: &str, font_size: f32, fill: &str, x: f32, y: f32) -> String {
        let result = parse_color(fill)
            .map_err(EditorError::from)
            .and_then(|fill| self.session.add_text(content, font_size, fill, x, y));
        id_or_empty(result)
    }

    /// `"heading"` or `"body"`.
    pub fn add_text_preset(&mut self, kind: &str) -> String {
        let preset = match kind {
            "heading" => TextPreset::Heading,
            "body" => TextPreset::Body,
            _ => return String::new(),
        };
        id_or_empty(self.session.add_text_preset(preset))
    }

    pub fn add_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32, fill: &str) -> String {
        let result = parse_color(fill)
            .map_err(EditorError::from)
            .and_then(|fill| self.session.add_rectangle(x, y, width, height, fill));
        id_or_empty(result)
    }

    /// Reserve a ticket for an image the page is about to decode.
    pub fn begin_image_load(&mut self) -> f64 {
        self.session.begin_image_load().0 as f64
    }

    /// Reserve a ticket for an image dropped at a stage position.
    pub fn begin_image_drop(&mut self, x: f32, y: f32) -> f64 {
        self.session.begin_image_drop(x, y).0 as f64
    }

    /// Hand over decoded RGBA pixels for a ticket. Returns
    /// `{"ok":true,"id":"...","placement":"inserted"|"placeholder"}`.
    pub fn complete_image_load(
        &mut self,
        ticket: f64,
        source: &str,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> String {
        let result = Raster::new(width, height, pixels)
            .map_err(EditorError::from)
            .and_then(|raster| {
                self.session
                    .complete_image_load(LoadTicket(ticket as u64), source, raster)
            });
        match result {
            Ok(placement) => {
                let kind = match placement {
                    ImagePlacement::Inserted(_) => "inserted",
                    ImagePlacement::FilledPlaceholder(_) => "placeholder",
                };
                serde_json::json!({ "ok": true, "id": placement.id(), "placement": kind }).to_string()
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Click at a stage position. Returns the selected id or an empty string.
    pub fn handle_click(&mut self, x: f32, y: f32) -> String {
        self.session
            .click_at(x, y)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Double-click at a stage position. Returns the text-edit overlay as
    /// JSON, or `null` when nothing editable is under the pointer.
    pub fn handle_double_click(&mut self, x: f32, y: f32) -> String {
        match self.session.double_click_at(x, y) {
            Ok(Some(edit)) => serde_json::to_string(&edit).unwrap_or_else(|_| "null".to_string()),
            Ok(None) => "null".to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn commit_text_edit(&mut self, content: &str) -> String {
        status(self.session.commit_text_edit(content))
    }

    pub fn drag_to(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.session
            .drag_to(NodeId::intern(id), x, y)
            .unwrap_or(false)
    }

    pub fn drag_end(&mut self, id: &str) -> bool {
        self.session.drag_end(NodeId::intern(id)).unwrap_or(false)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn transform_to(
        &mut self,
        id: &str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        scale_x: f32,
        scale_y: f32,
        rotation: f32,
    ) -> bool {
        let frame = Frame {
            x,
            y,
            width,
            height,
            scale_x,
            scale_y,
            rotation,
        };
        self.session.transform_to(NodeId::intern(id), frame).is_ok()
    }

    pub fn transform_end(&mut self, id: &str) -> bool {
        self.session
            .transform_end(NodeId::intern(id))
            .unwrap_or(false)
    }

    pub fn get_selected_id(&self) -> String {
        self.session
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Property panel ──────────────────────────────────────────────────

    /// Apply `{"attr":"fill","value":"#FF0000"}` to the selection and push.
    pub fn set_style(&mut self, change: &str) -> String {
        match serde_json::from_str::<StyleChange>(change) {
            Ok(change) => status(self.session.restyle(change)),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Like `set_style`, without a history entry (slider still moving).
    pub fn preview_style(&mut self, change: &str) -> String {
        match serde_json::from_str::<StyleChange>(change) {
            Ok(change) => status(self.session.preview_style(change)),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn commit_preview(&mut self) -> bool {
        self.session.commit_preview().unwrap_or(false)
    }

    pub fn apply_filter(&mut self, preset: &str) -> String {
        let preset = preset.parse::<FilterPreset>().unwrap_or_default();
        status(self.session.apply_filter_preset(preset))
    }

    pub fn apply_animation(&mut self, kind: &str, time_ms: f64) -> String {
        let kind = kind.parse::<AnimationKind>().unwrap_or_default();
        status(self.session.apply_animation(kind, time_ms / 1000.0))
    }

    /// Pending panel notifications, oldest first, as a JSON array.
    pub fn take_sidebar_updates(&mut self) -> String {
        let updates = self.session.drain_sidebar_updates();
        serde_json::to_string(&updates).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn document_properties(&self) -> String {
        serde_json::to_string(&self.session.document_properties())
            .unwrap_or_else(|_| "{}".to_string())
    }

    // ─── Selection commands ──────────────────────────────────────────────

    pub fn delete_selected(&mut self) -> bool {
        self.session.delete_selection().is_ok()
    }

    pub fn duplicate_selected(&mut self) -> String {
        id_or_empty(self.session.duplicate_selection())
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.session.bring_to_front().is_ok()
    }

    pub fn send_to_back(&mut self) -> bool {
        self.session.send_to_back().is_ok()
    }

    pub fn deselect(&mut self) {
        self.session.deselect();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.session.undo().unwrap_or(false)
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo().unwrap_or(false)
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    // ─── Keyboard and stage ──────────────────────────────────────────────

    /// Handle a keyboard event. Returns `{"changed":bool,"action":"<name>"}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        match self.session.handle_key(key, ctrl, shift, alt, meta) {
            Ok(Some(action)) => {
                serde_json::json!({ "changed": true, "action": action_to_name(action) }).to_string()
            }
            Ok(None) => r#"{"changed":false,"action":"none"}"#.to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn zoom_in(&mut self) -> bool {
        self.session.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.session.zoom_out()
    }

    pub fn resize_stage(&mut self, width: f32, height: f32) -> bool {
        self.session.resize_stage(width, height)
    }

    pub fn set_background(&mut self, color: &str) -> bool {
        match parse_color(color) {
            Ok(color) => {
                self.session.set_background(color);
                true
            }
            Err(_) => false,
        }
    }
}

impl DesignCanvas {
    /// Upload filtered and raw pixels that changed since the last frame.
    fn refresh_bitmaps(&mut self) {
        let mut live = Vec::new();
        let mut images = Vec::new();
        for node in self.session.graph().nodes() {
            match &node.kind {
                NodeKind::Image(_) => images.push(node.id),
                NodeKind::Rect(RectProps {
                    fill_image: Some(source),
                    ..
                }) => {
                    let key = render2d::source_key(source);
                    if let Some(pixels) = self.session.assets().get(source) {
                        self.bitmaps.canvas(&key, pixels);
                    }
                    live.push(key);
                }
                _ => {}
            }
        }
        for id in images {
            let key = render2d::node_key(id);
            if let Ok(Some(pixels)) = self.session.filtered_image(id) {
                self.bitmaps.canvas(&key, &pixels);
            }
            live.push(key);
        }
        self.bitmaps.retain(|key| live.iter().any(|k| k == key));
    }
}

fn to_js(err: EditorError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "ok": false, "error": message }).to_string()
}

fn status(result: EditorResult<()>) -> String {
    match result {
        Ok(()) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

fn id_or_empty(result: EditorResult<NodeId>) -> String {
    match result {
        Ok(id) => id.as_str().to_string(),
        Err(e) => {
            log::warn!("{e}");
            String::new()
        }
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::Duplicate => "duplicate",
        ShortcutAction::ToggleBold => "toggleBold",
        ShortcutAction::ToggleItalic => "toggleItalic",
        ShortcutAction::IncreaseFontSize => "increaseFontSize",
        ShortcutAction::BringToFront => "bringToFront",
        ShortcutAction::SendToBack => "sendToBack",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::Deselect => "deselect",
    }
}

// ─── Console logging and panic hook ──────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn setup_console() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Twin Clouds WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}
