//! Core scene-graph data model.
//!
//! A design is a single layer whose children are drawn in sequence order
//! (z-order = sequence order). Every child is a `SceneNode` with a closed set
//! of variants. Exactly one transform handle lives beside the content and is
//! attached to at most one content node: the current selection.

use crate::color::Color;
use crate::error::{CoreError, CoreResult};
use crate::filter::{FilterBackend, FilterCache, FilterParams, FilterPipeline, FilterPreset, Raster};
use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Name tag carried by user-editable nodes in serialized documents.
pub const EDITABLE_TAG: &str = "editable-shape";

/// Id of the single transform handle node.
pub const TRANSFORM_HANDLE_ID: &str = "transformer";

// ─── Geometry ────────────────────────────────────────────────────────────

/// Position, size and scale of a node, in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
}

impl Frame {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.scale_x,
            self.scale_y,
            self.rotation,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

// ─── Shadow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub enabled: bool,
    pub color: Option<Color>,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub opacity: f32,
}

impl Shadow {
    /// A cleared shadow.
    pub fn none() -> Self {
        Self {
            enabled: false,
            color: None,
            blur: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            opacity: 0.0,
        }
    }

    /// The shadow switched on by the sidebar toggle.
    pub fn standard() -> Self {
        Self {
            enabled: true,
            color: Some(Color::BLACK),
            blur: 10.0,
            offset_x: 5.0,
            offset_y: 5.0,
            opacity: 0.5,
        }
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::none()
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Font style as the rendering engine spells it: `normal`, `bold`,
/// `italic` or `bold italic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub fn as_str(&self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "normal",
            (true, false) => "bold",
            (false, true) => "italic",
            (true, true) => "bold italic",
        }
    }
}

impl FromStr for FontStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let mut style = FontStyle::default();
        for word in s.split_whitespace() {
            match word.to_ascii_lowercase().as_str() {
                "bold" => style.bold = true,
                "italic" => style.italic = true,
                "normal" => {}
                other => {
                    return Err(CoreError::malformed(format!(
                        "unknown font style word {other:?}"
                    )));
                }
            }
        }
        Ok(style)
    }
}

impl Serialize for FontStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FontStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_style: FontStyle,
    pub fill: Option<Color>,
    pub align: TextAlign,
    pub line_height: f32,
}

impl TextProps {
    pub fn new(content: impl Into<String>, font_size: f32, fill: Color) -> Self {
        Self {
            content: content.into(),
            font_family: "Inter".into(),
            font_size,
            font_style: FontStyle::default(),
            fill: Some(fill),
            align: TextAlign::Left,
            line_height: 1.0,
        }
    }
}

// ─── Rectangle & Image ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RectProps {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub corner_radius: f32,
    /// Source reference of an image dropped onto this rectangle.
    pub fill_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageProps {
    /// Reference to the decoded pixels (asset key, URL or data URL).
    pub source: String,
    pub preset: FilterPreset,
    pub pipeline: FilterPipeline,
    pub params: FilterParams,
    /// Derived. Never serialized.
    pub cache: FilterCache,
}

impl ImageProps {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            preset: FilterPreset::None,
            pipeline: SmallVec::new(),
            params: FilterParams::default(),
            cache: FilterCache::default(),
        }
    }

    pub fn cache_key(&self) -> u64 {
        self.params.cache_key(&self.pipeline)
    }

    /// Clear the pipeline and zero every parameter.
    pub fn reset_filters(&mut self) {
        self.pipeline.clear();
        self.params = FilterParams::default();
        self.preset = FilterPreset::None;
        self.cache.invalidate();
    }

    /// Reset, then install the preset's pipeline and parameters.
    /// Applying the same preset twice yields the same attributes.
    pub fn apply_preset(&mut self, preset: FilterPreset) {
        self.reset_filters();
        self.pipeline = preset.pipeline();
        self.params = preset.params();
        self.preset = preset;
    }

    /// Recompute the cache unconditionally.
    pub fn refresh_cache(&mut self, source: &Raster, backend: &dyn FilterBackend) -> Arc<Raster> {
        let key = self.cache_key();
        let bitmap = backend.rasterize(source, &self.pipeline, &self.params);
        self.cache.store(key, bitmap)
    }

    /// Read the filtered bitmap, recomputing it if any filter input changed
    /// since it was cached.
    pub fn filtered(&mut self, source: &Raster, backend: &dyn FilterBackend) -> Arc<Raster> {
        let key = self.cache_key();
        match self.cache.bitmap() {
            Some(bitmap) if self.cache.is_fresh(key) => Arc::clone(bitmap),
            _ => self.refresh_cache(source, backend),
        }
    }
}

// ─── Animation ───────────────────────────────────────────────────────────

/// The entrance animation last applied to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    #[default]
    None,
    FadeJiggle,
    SlideInLeft,
    ZoomIn,
}

impl AnimationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::FadeJiggle => "fade_jiggle",
            AnimationKind::SlideInLeft => "slide_in_left",
            AnimationKind::ZoomIn => "zoom_in",
        }
    }
}

impl FromStr for AnimationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Ok(match s {
            "fade_jiggle" => AnimationKind::FadeJiggle,
            "slide_in_left" => AnimationKind::SlideInLeft,
            "zoom_in" => AnimationKind::ZoomIn,
            _ => AnimationKind::None,
        })
    }
}

// ─── Scene nodes ─────────────────────────────────────────────────────────

/// The node variants in a design.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The single container every other node hangs from.
    Layer,
    Rect(RectProps),
    Text(TextProps),
    Image(ImageProps),
    /// Resize/rotate handles around the current selection.
    TransformHandle { target: Option<NodeId> },
}

impl NodeKind {
    /// Variant tag used in serialized documents.
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeKind::Layer => "Layer",
            NodeKind::Rect(_) => "Rect",
            NodeKind::Text(_) => "Text",
            NodeKind::Image(_) => "Image",
            NodeKind::TransformHandle { .. } => "Transformer",
        }
    }

    /// Prefix for generated ids of this variant.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Layer => "layer",
            NodeKind::Rect(_) => "rect",
            NodeKind::Text(_) => "text",
            NodeKind::Image(_) => "image",
            NodeKind::TransformHandle { .. } => "transformer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub frame: Frame,
    pub opacity: f32,
    pub shadow: Shadow,
    /// Tagged `editable-shape`: receives listeners and can be selected.
    pub editable: bool,
    pub draggable: bool,
    /// Participates in hit-testing.
    pub listening: bool,
    pub visible: bool,
    pub animation: AnimationKind,
}

impl SceneNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            frame: Frame::default(),
            opacity: 1.0,
            shadow: Shadow::none(),
            editable: false,
            draggable: false,
            listening: true,
            visible: true,
            animation: AnimationKind::None,
        }
    }

    /// A fresh user-editable node with a generated id.
    pub fn editable(kind: NodeKind, frame: Frame) -> Self {
        let mut node = Self::new(NodeId::with_prefix(kind.id_prefix()), kind);
        node.frame = frame;
        node.editable = true;
        node.draggable = true;
        node
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Rect, Text or Image: the nodes a snapshot captures.
    pub fn is_content(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Rect(_) | NodeKind::Text(_) | NodeKind::Image(_)
        )
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageProps> {
        match &self.kind {
            NodeKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageProps> {
        match &mut self.kind {
            NodeKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<&RectProps> {
        match &self.kind {
            NodeKind::Rect(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_rect_mut(&mut self) -> Option<&mut RectProps> {
        match &mut self.kind {
            NodeKind::Rect(r) => Some(r),
            _ => None,
        }
    }

    /// Unscaled size. Text without an explicit width or height is measured
    /// with an average glyph advance of 0.6 em.
    pub fn extent(&self) -> (f32, f32) {
        let Frame { width, height, .. } = self.frame;
        match &self.kind {
            NodeKind::Text(t) => {
                let lines: Vec<&str> = t.content.split('\n').collect();
                let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
                let w = if width > 0.0 {
                    width
                } else {
                    longest as f32 * t.font_size * 0.6
                };
                let wrapped_lines: f32 = if width > 0.0 {
                    let per_line = (width / (t.font_size * 0.6)).max(1.0);
                    lines
                        .iter()
                        .map(|l| (l.chars().count() as f32 / per_line).ceil().max(1.0))
                        .sum()
                } else {
                    lines.len() as f32
                };
                let h = if height > 0.0 {
                    height
                } else {
                    wrapped_lines * t.font_size * t.line_height
                };
                (w, h)
            }
            _ => (width, height),
        }
    }

    pub(crate) fn has_finite_geometry(&self) -> bool {
        self.frame.is_finite() && self.opacity.is_finite()
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The live design: a layer root, its content children in z-order, and
/// the transform handle.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    /// The underlying containment graph (layer → children).
    pub graph: StableDiGraph<SceneNode, ()>,

    /// The layer node index.
    pub root: NodeIndex,

    /// The transform handle node index.
    pub handle: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Content nodes, back to front.
    order: Vec<NodeIndex>,
}

impl SceneGraph {
    /// An empty layer with a detached transform handle.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(SceneNode::new(NodeId::intern("layer"), NodeKind::Layer));
        let handle_id = NodeId::intern(TRANSFORM_HANDLE_ID);
        let handle = graph.add_node(SceneNode::new(
            handle_id,
            NodeKind::TransformHandle { target: None },
        ));
        graph.add_edge(root, handle, ());

        Self {
            graph,
            root,
            handle,
            id_index: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Append a content node on top. A node whose id is already taken gets
    /// a freshly generated one.
    pub fn add_node(&mut self, node: SceneNode) -> NodeIndex {
        let z = self.order.len();
        self.insert_node(z, node)
    }

    /// Insert a content node at z-position `z` (clamped to the top).
    pub fn insert_node(&mut self, z: usize, mut node: SceneNode) -> NodeIndex {
        if self.id_index.contains_key(&node.id) || node.id.as_str() == TRANSFORM_HANDLE_ID {
            let fresh = NodeId::with_prefix(node.kind.id_prefix());
            log::debug!("id {} already in use, renamed to {fresh}", node.id);
            node.id = fresh;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(self.root, idx, ());
        self.id_index.insert(id, idx);
        self.order.insert(z.min(self.order.len()), idx);
        idx
    }

    /// Remove a content node. Detaches the handle if it pointed at it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        let idx = self.id_index.remove(&id)?;
        self.order.retain(|&i| i != idx);
        if self.handle_target() == Some(id) {
            self.set_handle_target(None);
        }
        self.graph.remove_node(idx)
    }

    /// Destroy every content node and detach the handle.
    pub fn clear(&mut self) {
        for idx in self.order.drain(..) {
            self.graph.remove_node(idx);
        }
        self.id_index.clear();
        self.set_handle_target(None);
    }

    /// Replace all content with `nodes`, in order.
    pub fn replace_nodes(&mut self, nodes: impl IntoIterator<Item = SceneNode>) {
        self.clear();
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Look up a content node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Number of content nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Content nodes, back to front.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &SceneNode> + '_ {
        self.order.iter().map(|&idx| &self.graph[idx])
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    pub fn z_index(&self, id: NodeId) -> Option<usize> {
        let idx = self.index_of(id)?;
        self.order.iter().position(|&i| i == idx)
    }

    /// Move a node to the front. Returns true if the z-order changed.
    pub fn move_to_top(&mut self, id: NodeId) -> bool {
        let last = self.order.len().saturating_sub(1);
        self.move_to(id, last)
    }

    /// Move a node to the back. Returns true if the z-order changed.
    pub fn move_to_bottom(&mut self, id: NodeId) -> bool {
        self.move_to(id, 0)
    }

    fn move_to(&mut self, id: NodeId, z: usize) -> bool {
        let Some(from) = self.z_index(id) else {
            return false;
        };
        if from == z {
            return false;
        }
        let idx = self.order.remove(from);
        self.order.insert(z, idx);
        true
    }

    pub fn handle_node(&self) -> &SceneNode {
        &self.graph[self.handle]
    }

    /// The node the transform handle is attached to.
    pub fn handle_target(&self) -> Option<NodeId> {
        match self.graph[self.handle].kind {
            NodeKind::TransformHandle { target } => target,
            _ => None,
        }
    }

    /// Attach the handle to `target` (or detach it with `None`).
    /// Returns false, leaving the handle untouched, if `target` is not in
    /// the graph.
    pub fn set_handle_target(&mut self, target: Option<NodeId>) -> bool {
        if let Some(id) = target
            && !self.id_index.contains_key(&id)
        {
            return false;
        }
        self.graph[self.handle].kind = NodeKind::TransformHandle { target };
        true
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
