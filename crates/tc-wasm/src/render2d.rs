//! Canvas2D renderer for the design stage.
//!
//! Walks the content nodes back to front and draws them to an HTML
//! `<canvas>` via `CanvasRenderingContext2d`. Running animations override
//! the stored position, opacity and scale. Image pixels come from scratch
//! canvases kept in a [`BitmapCache`].

use std::collections::HashMap;
use std::sync::Arc;
use tc_core::*;
use tc_editor::Presentation;
use tc_render::node_bounds;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Accent used for the transform handle.
const HANDLE_COLOR: &str = "#05EAFA";
const ANCHOR_SIZE: f64 = 8.0;

/// Scratch canvases holding decoded or filtered pixels, keyed by whatever
/// the caller uses to look them up (node id or image source).
#[derive(Default)]
pub struct BitmapCache {
    canvases: HashMap<String, (usize, HtmlCanvasElement)>,
}

impl BitmapCache {
    /// The canvas for `key`, re-uploaded only when `pixels` is a different
    /// allocation from the one last seen.
    pub fn canvas(&mut self, key: &str, pixels: &Arc<Raster>) -> Option<&HtmlCanvasElement> {
        let stamp = Arc::as_ptr(pixels) as usize;
        let stale = self
            .canvases
            .get(key)
            .is_none_or(|(seen, _)| *seen != stamp);
        if stale {
            let canvas = upload(pixels)?;
            self.canvases.insert(key.to_string(), (stamp, canvas));
        }
        self.canvases.get(key).map(|(_, canvas)| canvas)
    }

    pub fn get(&self, key: &str) -> Option<&HtmlCanvasElement> {
        self.canvases.get(key).map(|(_, canvas)| canvas)
    }

    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.canvases.retain(|key, _| keep(key));
    }
}

fn upload(pixels: &Raster) -> Option<HtmlCanvasElement> {
    let document = web_sys::window()?.document()?;
    let canvas: HtmlCanvasElement = document.create_element("canvas").ok()?.dyn_into().ok()?;
    canvas.set_width(pixels.width());
    canvas.set_height(pixels.height());
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
    let data = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(pixels.pixels()),
        pixels.width(),
        pixels.height(),
    )
    .ok()?;
    ctx.put_image_data(&data, 0.0, 0.0).ok()?;
    Some(canvas)
}

/// Cache key for an image node's filtered pixels.
pub fn node_key(id: NodeId) -> String {
    format!("node:{id}")
}

/// Cache key for the raw pixels behind a source reference.
pub fn source_key(source: &str) -> String {
    format!("src:{source}")
}

/// What to draw besides the nodes themselves.
pub struct Overlay<'a> {
    pub zoom: f64,
    pub background: Color,
    pub overrides: &'a HashMap<NodeId, Presentation>,
    pub bitmaps: &'a BitmapCache,
}

/// Render the whole stage.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    graph: &SceneGraph,
    width: f64,
    height: f64,
    overlay: &Overlay<'_>,
) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, width * overlay.zoom, height * overlay.zoom);
    let _ = ctx.scale(overlay.zoom, overlay.zoom);

    ctx.set_fill_style_str(&overlay.background.to_hex());
    ctx.fill_rect(0.0, 0.0, width, height);

    for node in graph.nodes().filter(|n| n.visible) {
        let presentation = overlay
            .overrides
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| Presentation::of(node));
        render_node(ctx, node, presentation, overlay.bitmaps);
    }

    if let Some(target) = graph.handle_target().and_then(|id| graph.get_by_id(id))
        && target.visible
    {
        draw_handle(ctx, target);
    }
}

fn render_node(
    ctx: &CanvasRenderingContext2d,
    node: &SceneNode,
    p: Presentation,
    bitmaps: &BitmapCache,
) {
    ctx.save();
    let _ = ctx.translate(p.x as f64, p.y as f64);
    let _ = ctx.rotate((node.frame.rotation as f64).to_radians());
    let _ = ctx.scale(p.scale_x as f64, p.scale_y as f64);
    ctx.set_global_alpha(p.opacity as f64);
    apply_shadow(ctx, &node.shadow);

    let (w, h) = node.extent();
    let (w, h) = (w as f64, h as f64);
    match &node.kind {
        NodeKind::Rect(rect) => draw_rect(ctx, rect, w, h, bitmaps),
        NodeKind::Text(text) => draw_text(ctx, text, node.frame.width as f64),
        NodeKind::Image(_) => {
            if let Some(canvas) = bitmaps.get(&node_key(node.id)) {
                let _ = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(canvas, 0.0, 0.0, w, h);
            }
        }
        NodeKind::Layer | NodeKind::TransformHandle { .. } => {}
    }
    ctx.restore();
}

// ─── Drawing primitives ─────────────────────────────────────────────────

fn draw_rect(
    ctx: &CanvasRenderingContext2d,
    rect: &RectProps,
    w: f64,
    h: f64,
    bitmaps: &BitmapCache,
) {
    let radius = (rect.corner_radius as f64).min(w / 2.0).min(h / 2.0).max(0.0);
    rounded_rect_path(ctx, 0.0, 0.0, w, h, radius);
    if let Some(fill) = rect.fill {
        ctx.set_fill_style_str(&fill.to_hex());
        ctx.fill();
    }
    clear_shadow(ctx);

    if let Some(canvas) = rect.fill_image.as_deref().and_then(|src| bitmaps.get(&source_key(src))) {
        ctx.save();
        ctx.clip();
        // Cover the rectangle, cropping the longer side.
        let (iw, ih) = (canvas.width() as f64, canvas.height() as f64);
        if iw > 0.0 && ih > 0.0 {
            let scale = (w / iw).max(h / ih);
            let (dw, dh) = (iw * scale, ih * scale);
            let _ = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
                canvas,
                (w - dw) / 2.0,
                (h - dh) / 2.0,
                dw,
                dh,
            );
        }
        ctx.restore();
    }

    if let Some(stroke) = rect.stroke
        && rect.stroke_width > 0.0
    {
        ctx.set_stroke_style_str(&stroke.to_hex());
        ctx.set_line_width(rect.stroke_width as f64);
        rounded_rect_path(ctx, 0.0, 0.0, w, h, radius);
        ctx.stroke();
    }
}

fn draw_text(ctx: &CanvasRenderingContext2d, text: &TextProps, width: f64) {
    let size = text.font_size as f64;
    ctx.set_font(&format!(
        "{} {}px {}",
        text.font_style.as_str(),
        text.font_size,
        text.font_family
    ));
    ctx.set_text_baseline("top");
    ctx.set_fill_style_str(&text.fill.unwrap_or(Color::BLACK).to_hex());

    let (align, x) = match text.align {
        TextAlign::Center if width > 0.0 => ("center", width / 2.0),
        TextAlign::Right if width > 0.0 => ("right", width),
        _ => ("left", 0.0),
    };
    ctx.set_text_align(align);

    let step = size * text.line_height as f64;
    for (i, line) in wrap_lines(ctx, &text.content, width).iter().enumerate() {
        let _ = ctx.fill_text(line, x, i as f64 * step);
    }
}

/// Break text into lines no wider than `width` (0 means no wrapping).
fn wrap_lines(ctx: &CanvasRenderingContext2d, content: &str, width: f64) -> Vec<String> {
    let measure = |s: &str| ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0);
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        if width <= 0.0 {
            lines.push(paragraph.to_string());
            continue;
        }
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if !line.is_empty() && measure(&candidate) > width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Bounding box plus corner and edge anchors around the selected node.
fn draw_handle(ctx: &CanvasRenderingContext2d, target: &SceneNode) {
    let b = node_bounds(target);
    let (x, y, w, h) = (b.x0, b.y0, b.width(), b.height());
    ctx.save();
    ctx.set_stroke_style_str(HANDLE_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(x, y, w, h);

    ctx.set_fill_style_str("#FFFFFF");
    let half = ANCHOR_SIZE / 2.0;
    for (ax, ay) in [
        (x, y),
        (x + w / 2.0, y),
        (x + w, y),
        (x, y + h / 2.0),
        (x + w, y + h / 2.0),
        (x, y + h),
        (x + w / 2.0, y + h),
        (x + w, y + h),
    ] {
        ctx.fill_rect(ax - half, ay - half, ANCHOR_SIZE, ANCHOR_SIZE);
        ctx.stroke_rect(ax - half, ay - half, ANCHOR_SIZE, ANCHOR_SIZE);
    }
    ctx.restore();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    ctx.begin_path();
    if r <= 0.0 {
        ctx.rect(x, y, w, h);
        return;
    }
    ctx.move_to(x + r, y);
    let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
    let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
    let _ = ctx.arc_to(x, y + h, x, y, r);
    let _ = ctx.arc_to(x, y, x + w, y, r);
    ctx.close_path();
}

fn apply_shadow(ctx: &CanvasRenderingContext2d, shadow: &Shadow) {
    let Some(color) = shadow.color.filter(|_| shadow.enabled) else {
        return;
    };
    let [r, g, b, a] = color.to_rgba8();
    let alpha = (a as f32 / 255.0) * shadow.opacity;
    ctx.set_shadow_color(&format!("rgba({r}, {g}, {b}, {alpha})"));
    ctx.set_shadow_blur(shadow.blur as f64);
    ctx.set_shadow_offset_x(shadow.offset_x as f64);
    ctx.set_shadow_offset_y(shadow.offset_y as f64);
}

fn clear_shadow(ctx: &CanvasRenderingContext2d) {
    ctx.set_shadow_color("transparent");
    ctx.set_shadow_blur(0.0);
    ctx.set_shadow_offset_x(0.0);
    ctx.set_shadow_offset_y(0.0);
}
