//! Snapshot codec: SceneGraph ↔ self-describing layer documents.
//!
//! A document is a layer tag plus its children, each tagged with its
//! variant (`{"className":"Layer","children":[{"className":"Text",...}]}`).
//! Only serializable attributes are written: the transform handle, listener
//! bindings and filter caches never appear in a document.
//!
//! Snapshots kept in history hold the document as self-describing
//! MessagePack (named fields), which is several times smaller than the JSON
//! form used for templates and export.

use crate::color::Color;
use crate::error::{CoreError, CoreResult};
use crate::filter::{FilterCache, FilterParams, FilterPipeline, FilterPreset};
use crate::id::NodeId;
use crate::model::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Tag of the top-level container.
pub const LAYER_CLASS: &str = "Layer";

// ─── Document schema ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

impl LayerDocument {
    pub fn new(children: Vec<NodeDocument>) -> Self {
        Self {
            class_name: LAYER_CLASS.to_string(),
            children,
        }
    }
}

/// One serialized node, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "className")]
pub enum NodeDocument {
    Rect(RectDocument),
    Text(TextDocument),
    Image(ImageDocument),
}

impl NodeDocument {
    pub fn common(&self) -> &CommonAttrs {
        match self {
            NodeDocument::Rect(d) => &d.common,
            NodeDocument::Text(d) => &d.common,
            NodeDocument::Image(d) => &d.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut CommonAttrs {
        match self {
            NodeDocument::Rect(d) => &mut d.common,
            NodeDocument::Text(d) => &mut d.common,
            NodeDocument::Image(d) => &mut d.common,
        }
    }
}

/// Attributes shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAttrs {
    pub id: NodeId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub opacity: f32,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_x: f32,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scale_y: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default = "yes", skip_serializing_if = "is_true")]
    pub listening: bool,
    #[serde(default = "yes", skip_serializing_if = "is_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<Color>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shadow_blur: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shadow_offset_x: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shadow_offset_y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "is_no_animation")]
    pub current_animation: AnimationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectDocument {
    #[serde(flatten)]
    pub common: CommonAttrs,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stroke_width: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub corner_radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    #[serde(flatten)]
    pub common: CommonAttrs,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub line_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDocument {
    #[serde(flatten)]
    pub common: CommonAttrs,
    pub source: String,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub preset_filter: FilterPreset,
    #[serde(default, skip_serializing_if = "FilterPipeline::is_empty")]
    pub filters: FilterPipeline,
    #[serde(flatten)]
    pub params: FilterParams,
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

fn is_one(v: &f32) -> bool {
    *v == 1.0
}

fn is_zero(v: &f32) -> bool {
    *v == 0.0
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_no_animation(v: &AnimationKind) -> bool {
    *v == AnimationKind::None
}

fn default_font_size() -> f32 {
    12.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// An immutable, self-contained capture of the content of a scene graph.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Arc<[u8]>,
}

impl Snapshot {
    pub fn from_document(doc: &LayerDocument) -> CoreResult<Self> {
        let bytes = rmp_serde::to_vec_named(doc)?;
        Ok(Self {
            bytes: bytes.into(),
        })
    }

    /// Parse and validate a JSON layer document (templates, imports).
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let doc: LayerDocument = serde_json::from_str(json)?;
        nodes_from_document(doc.clone())?;
        Self::from_document(&doc)
    }

    /// Wrap raw encoded bytes. Validation happens on `restore`.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn document(&self) -> CoreResult<LayerDocument> {
        Ok(rmp_serde::from_slice(&self.bytes)?)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(&self.document()?).map_err(|e| CoreError::encode(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(&self.document()?)
            .map_err(|e| CoreError::encode(e.to_string()))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({} bytes)", self.bytes.len())
    }
}

// ─── Capture ─────────────────────────────────────────────────────────────

/// Serialize every content node of `graph`. Has no side effects.
pub fn capture(graph: &SceneGraph) -> CoreResult<Snapshot> {
    Snapshot::from_document(&document_of(graph))
}

/// Build the layer document for `graph`, skipping the transform handle.
pub fn document_of(graph: &SceneGraph) -> LayerDocument {
    LayerDocument::new(graph.nodes().filter_map(encode_node).collect())
}

/// Serialize a single node. `None` for the layer and the transform handle.
pub fn encode_node(node: &SceneNode) -> Option<NodeDocument> {
    let common = encode_common(node);
    let frame = node.frame;
    let doc = match &node.kind {
        NodeKind::Rect(r) => NodeDocument::Rect(RectDocument {
            common,
            width: frame.width,
            height: frame.height,
            fill: r.fill,
            stroke: r.stroke,
            stroke_width: r.stroke_width,
            corner_radius: r.corner_radius,
            fill_image: r.fill_image.clone(),
        }),
        NodeKind::Text(t) => NodeDocument::Text(TextDocument {
            common,
            text: t.content.clone(),
            width: (frame.width > 0.0).then_some(frame.width),
            height: (frame.height > 0.0).then_some(frame.height),
            font_size: t.font_size,
            font_family: t.font_family.clone(),
            font_style: t.font_style,
            fill: t.fill,
            align: t.align,
            line_height: t.line_height,
        }),
        NodeKind::Image(i) => NodeDocument::Image(ImageDocument {
            common,
            source: i.source.clone(),
            width: frame.width,
            height: frame.height,
            preset_filter: i.preset,
            filters: i.pipeline.clone(),
            params: i.params,
        }),
        NodeKind::Layer | NodeKind::TransformHandle { .. } => return None,
    };
    Some(doc)
}

fn encode_common(node: &SceneNode) -> CommonAttrs {
    let shadow = &node.shadow;
    let has_shadow = *shadow != Shadow::none();
    CommonAttrs {
        id: node.id,
        x: node.frame.x,
        y: node.frame.y,
        opacity: node.opacity,
        scale_x: node.frame.scale_x,
        scale_y: node.frame.scale_y,
        rotation: node.frame.rotation,
        name: node.editable.then(|| EDITABLE_TAG.to_string()),
        draggable: node.draggable,
        listening: node.listening,
        visible: node.visible,
        shadow_enabled: has_shadow.then_some(shadow.enabled),
        shadow_color: shadow.color,
        shadow_blur: shadow.blur,
        shadow_offset_x: shadow.offset_x,
        shadow_offset_y: shadow.offset_y,
        shadow_opacity: has_shadow.then_some(shadow.opacity),
        current_animation: node.animation,
    }
}

// ─── Restore ─────────────────────────────────────────────────────────────

/// Decode a snapshot into fresh, unattached nodes (no listeners, no
/// caches). On error nothing has been touched.
pub fn restore(snapshot: &Snapshot) -> CoreResult<Vec<SceneNode>> {
    nodes_from_document(snapshot.document()?)
}

/// Validate a document and turn it into nodes.
pub fn nodes_from_document(doc: LayerDocument) -> CoreResult<Vec<SceneNode>> {
    if doc.class_name != LAYER_CLASS {
        return Err(CoreError::malformed(format!(
            "expected a {LAYER_CLASS} document, found {:?}",
            doc.class_name
        )));
    }

    let mut seen = HashSet::with_capacity(doc.children.len());
    let mut nodes = Vec::with_capacity(doc.children.len());
    for child in doc.children {
        let id = child.common().id;
        if id.as_str() == TRANSFORM_HANDLE_ID {
            return Err(CoreError::malformed(format!("reserved node id {id}")));
        }
        if !seen.insert(id) {
            return Err(CoreError::malformed(format!("duplicate node id {id}")));
        }
        nodes.push(decode_node(child)?);
    }
    Ok(nodes)
}

/// Deserialize a single node document.
pub fn decode_node(doc: NodeDocument) -> CoreResult<SceneNode> {
    let (common, kind, width, height) = match doc {
        NodeDocument::Rect(d) => (
            d.common,
            NodeKind::Rect(RectProps {
                fill: d.fill,
                stroke: d.stroke,
                stroke_width: d.stroke_width,
                corner_radius: d.corner_radius,
                fill_image: d.fill_image,
            }),
            d.width,
            d.height,
        ),
        NodeDocument::Text(d) => (
            d.common,
            NodeKind::Text(TextProps {
                content: d.text,
                font_family: d.font_family,
                font_size: d.font_size,
                font_style: d.font_style,
                fill: d.fill,
                align: d.align,
                line_height: d.line_height,
            }),
            d.width.unwrap_or(0.0),
            d.height.unwrap_or(0.0),
        ),
        NodeDocument::Image(d) => {
            if !d.params.is_finite() {
                return Err(CoreError::malformed(format!(
                    "non-finite filter parameter on {}",
                    d.common.id
                )));
            }
            (
                d.common,
                NodeKind::Image(ImageProps {
                    source: d.source,
                    preset: d.preset_filter,
                    pipeline: d.filters,
                    params: d.params,
                    cache: FilterCache::default(),
                }),
                d.width,
                d.height,
            )
        }
    };

    let color_present = common.shadow_color.is_some();
    let mut node = SceneNode::new(common.id, kind);
    node.frame = Frame {
        x: common.x,
        y: common.y,
        width,
        height,
        scale_x: common.scale_x,
        scale_y: common.scale_y,
        rotation: common.rotation,
    };
    node.opacity = common.opacity;
    node.shadow = Shadow {
        enabled: common.shadow_enabled.unwrap_or(color_present),
        color: common.shadow_color,
        blur: common.shadow_blur,
        offset_x: common.shadow_offset_x,
        offset_y: common.shadow_offset_y,
        opacity: common
            .shadow_opacity
            .unwrap_or(if color_present { 1.0 } else { 0.0 }),
    };
    node.editable = common.name.as_deref() == Some(EDITABLE_TAG);
    node.draggable = common.draggable;
    node.listening = common.listening;
    node.visible = common.visible;
    node.animation = common.current_animation;

    validate_node(&node)?;
    Ok(node)
}

fn validate_node(node: &SceneNode) -> CoreResult<()> {
    if !node.has_finite_geometry() {
        return Err(CoreError::malformed(format!(
            "non-finite geometry on {}",
            node.id
        )));
    }
    if node.frame.width < 0.0 || node.frame.height < 0.0 {
        return Err(CoreError::malformed(format!("negative size on {}", node.id)));
    }
    if !(0.0..=1.0).contains(&node.opacity) {
        return Err(CoreError::malformed(format!(
            "opacity {} out of range on {}",
            node.opacity, node.id
        )));
    }
    if let NodeKind::Text(t) = &node.kind {
        if !(t.font_size.is_finite() && t.font_size > 0.0) {
            return Err(CoreError::malformed(format!("bad font size on {}", node.id)));
        }
    }
    Ok(())
}
