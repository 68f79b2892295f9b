//! Attribute edits from the property panel and the floating toolbar.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use tc_core::Color;
use tc_core::model::*;

/// Step used by the "increase font size" button.
pub const FONT_SIZE_STEP: f32 = 2.0;

/// One attribute write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attr", content = "value", rename_all = "camelCase")]
pub enum StyleChange {
    /// Text or rectangle fill.
    Fill(Color),
    Stroke(Option<Color>),
    StrokeWidth(f32),
    CornerRadius(f32),
    Opacity(f32),
    /// Toggle the standard drop shadow on or off.
    Shadow(bool),
    ShadowColor(Color),
    ShadowBlur(f32),
    ShadowOffsetX(f32),
    ShadowOffsetY(f32),
    FontFamily(String),
    FontSize(f32),
    IncreaseFontSize,
    ToggleBold,
    ToggleItalic,
    Align(TextAlign),
    LineHeight(f32),
}

impl StyleChange {
    pub fn name(&self) -> &'static str {
        match self {
            StyleChange::Fill(_) => "fill",
            StyleChange::Stroke(_) => "stroke",
            StyleChange::StrokeWidth(_) => "strokeWidth",
            StyleChange::CornerRadius(_) => "cornerRadius",
            StyleChange::Opacity(_) => "opacity",
            StyleChange::Shadow(_) => "shadow",
            StyleChange::ShadowColor(_) => "shadowColor",
            StyleChange::ShadowBlur(_) => "shadowBlur",
            StyleChange::ShadowOffsetX(_) => "shadowOffsetX",
            StyleChange::ShadowOffsetY(_) => "shadowOffsetY",
            StyleChange::FontFamily(_) => "fontFamily",
            StyleChange::FontSize(_) => "fontSize",
            StyleChange::IncreaseFontSize => "increaseFontSize",
            StyleChange::ToggleBold => "toggleBold",
            StyleChange::ToggleItalic => "toggleItalic",
            StyleChange::Align(_) => "align",
            StyleChange::LineHeight(_) => "lineHeight",
        }
    }
}

fn finite(attr: &'static str, v: f32) -> EditorResult<f32> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EditorError::InvalidValue(attr))
    }
}

fn non_negative(attr: &'static str, v: f32) -> EditorResult<f32> {
    if finite(attr, v)? < 0.0 {
        return Err(EditorError::InvalidValue(attr));
    }
    Ok(v)
}

fn text_of<'a>(node: &'a mut SceneNode) -> EditorResult<&'a mut TextProps> {
    let found = node.class_name();
    node.as_text_mut()
        .ok_or(EditorError::wrong_variant("Text", found))
}

fn rect_of<'a>(node: &'a mut SceneNode) -> EditorResult<&'a mut RectProps> {
    let found = node.class_name();
    node.as_rect_mut()
        .ok_or(EditorError::wrong_variant("Rect", found))
}

/// Write one attribute. Nothing is changed when an error is returned.
pub fn apply(node: &mut SceneNode, change: &StyleChange) -> EditorResult<()> {
    match change {
        StyleChange::Fill(color) => match &mut node.kind {
            NodeKind::Text(t) => t.fill = Some(*color),
            NodeKind::Rect(r) => r.fill = Some(*color),
            other => return Err(EditorError::wrong_variant("Text or Rect", other.class_name())),
        },
        StyleChange::Stroke(color) => rect_of(node)?.stroke = *color,
        StyleChange::StrokeWidth(w) => {
            let w = non_negative("strokeWidth", *w)?;
            rect_of(node)?.stroke_width = w;
        }
        StyleChange::CornerRadius(r) => {
            let r = non_negative("cornerRadius", *r)?;
            rect_of(node)?.corner_radius = r;
        }
        StyleChange::Opacity(o) => node.opacity = finite("opacity", *o)?.clamp(0.0, 1.0),
        StyleChange::Shadow(on) => {
            node.shadow = if *on { Shadow::standard() } else { Shadow::none() };
        }
        StyleChange::ShadowColor(color) => node.shadow.color = Some(*color),
        StyleChange::ShadowBlur(b) => node.shadow.blur = non_negative("shadowBlur", *b)?,
        StyleChange::ShadowOffsetX(x) => node.shadow.offset_x = finite("shadowOffsetX", *x)?,
        StyleChange::ShadowOffsetY(y) => node.shadow.offset_y = finite("shadowOffsetY", *y)?,
        StyleChange::FontFamily(family) => text_of(node)?.font_family = family.clone(),
        StyleChange::FontSize(size) => {
            let size = finite("fontSize", *size)?;
            if size <= 0.0 {
                return Err(EditorError::InvalidValue("fontSize"));
            }
            text_of(node)?.font_size = size;
        }
        StyleChange::IncreaseFontSize => text_of(node)?.font_size += FONT_SIZE_STEP,
        StyleChange::ToggleBold => {
            let style = &mut text_of(node)?.font_style;
            style.bold = !style.bold;
        }
        StyleChange::ToggleItalic => {
            let style = &mut text_of(node)?.font_style;
            style.italic = !style.italic;
        }
        StyleChange::Align(align) => text_of(node)?.align = *align,
        StyleChange::LineHeight(h) => {
            let h = finite("lineHeight", *h)?;
            if h <= 0.0 {
                return Err(EditorError::InvalidValue("lineHeight"));
            }
            text_of(node)?.line_height = h;
        }
    }
    Ok(())
}
