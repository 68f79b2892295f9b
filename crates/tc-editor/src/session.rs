//! The editor session.
//!
//! One `EditorSession` owns the live scene graph, its history, the selection
//! and every piece of derived state (listener bindings, decoded pixels,
//! filter caches, running animations). Each mutating operation changes the
//! scene and then pushes a fresh capture. Previews (slider drags, pointer
//! drags, live transforms) change the scene without pushing; the matching
//! commit event pushes once.

use crate::animation::{Animator, Presentation};
use crate::assets::{AssetStore, LoadTarget, LoadTicket};
use crate::config::{EditorConfig, StageView};
use crate::error::{EditorError, EditorResult};
use crate::history::HistoryStack;
use crate::rehydrate::{self, Interaction, ListenerRegistry};
use crate::selection::SelectionController;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sidebar::{DocumentProperties, SidebarUpdate};
use crate::style::{self, StyleChange};
use serde::Serialize;
use std::sync::Arc;
use tc_core::snapshot::{self, LayerDocument};
use tc_core::*;
use tc_render::{CpuFilters, hit_test};

pub const WELCOME_TEXT: &str = "Welcome to Twin Clouds Editor!";

/// Rectangles that accept a dropped image as their fill.
pub const PLACEHOLDER_IDS: [&str; 3] = [
    "media-placeholder",
    "image-placeholder",
    "circle-placeholder",
];

/// Ready-made text blocks from the "Text" panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPreset {
    Heading,
    Body,
}

impl TextPreset {
    pub fn content(self) -> &'static str {
        match self {
            TextPreset::Heading => "Click to Edit Headline",
            TextPreset::Body => "Add supporting text here...",
        }
    }

    pub fn font_size(self) -> f32 {
        match self {
            TextPreset::Heading => 36.0,
            TextPreset::Body => 18.0,
        }
    }
}

/// Where an image ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePlacement {
    /// A new image node.
    Inserted(NodeId),
    /// The fill of an existing placeholder rectangle.
    FilledPlaceholder(NodeId),
}

impl ImagePlacement {
    pub fn id(self) -> NodeId {
        match self {
            ImagePlacement::Inserted(id) | ImagePlacement::FilledPlaceholder(id) => id,
        }
    }
}

/// What the host needs to overlay an in-place text editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub id: NodeId,
    pub content: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font_family: String,
    pub fill: Option<Color>,
    pub line_height: f32,
}

pub struct EditorSession {
    config: EditorConfig,
    graph: SceneGraph,
    history: HistoryStack,
    selection: SelectionController,
    listeners: ListenerRegistry,
    assets: AssetStore,
    animator: Animator,
    filters: Option<Box<dyn FilterBackend>>,
    /// Missing filter support is logged once per session.
    filters_reported: bool,
    view: StageView,
    editing: Option<NodeId>,
    /// A preview changed the scene since the last push.
    preview_dirty: bool,
}

impl EditorSession {
    /// A session showing the welcome text, filtering images on the CPU when
    /// the host reports filter support.
    pub fn new(config: EditorConfig) -> EditorResult<Self> {
        Self::with_backend(config, Some(Box::new(CpuFilters)))
    }

    /// Like `new`, with a caller-supplied filter backend.
    pub fn with_backend(
        config: EditorConfig,
        backend: Option<Box<dyn FilterBackend>>,
    ) -> EditorResult<Self> {
        let mut session = Self::bare(config, backend);
        let width = (session.view.width - 100.0).max(0.0);
        let node = SceneNode::editable(
            NodeKind::Text(TextProps::new(WELCOME_TEXT, 30.0, Color::WHITE)),
            Frame::new(30.0, 100.0, width, 0.0),
        );
        session.insert(node, None);
        session.commit("welcome text")?;
        Ok(session)
    }

    /// An empty stage with one history entry.
    pub fn blank(config: EditorConfig) -> EditorResult<Self> {
        let mut session = Self::bare(config, Some(Box::new(CpuFilters)));
        session.commit("blank")?;
        Ok(session)
    }

    fn bare(config: EditorConfig, backend: Option<Box<dyn FilterBackend>>) -> Self {
        let filters = if config.filters_available {
            backend
        } else {
            None
        };
        let view = StageView::new(&config);
        Self {
            history: HistoryStack::new(config.history_limit),
            config,
            graph: SceneGraph::new(),
            selection: SelectionController::default(),
            listeners: ListenerRegistry::default(),
            assets: AssetStore::default(),
            animator: Animator::default(),
            filters,
            filters_reported: false,
            view,
            editing: None,
            preview_dirty: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.graph.get_by_id(id)
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn view(&self) -> &StageView {
        &self.view
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.editing
    }

    pub fn has_filters(&self) -> bool {
        self.filters.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn drain_sidebar_updates(&mut self) -> Vec<SidebarUpdate> {
        self.selection.drain_updates()
    }

    pub fn document_properties(&self) -> DocumentProperties {
        DocumentProperties {
            stage: self.view,
            node_count: self.graph.len(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn commit(&mut self, label: &str) -> EditorResult<()> {
        let snapshot = self.capture()?;
        log::debug!("commit '{label}' ({} bytes)", snapshot.as_bytes().len());
        self.history.push(snapshot);
        self.preview_dirty = false;
        Ok(())
    }

    /// The scene as a document. A text node hidden for an open edit is
    /// written as visible.
    fn document(&self) -> LayerDocument {
        let mut document = snapshot::document_of(&self.graph);
        if let Some(id) = self.editing {
            if let Some(child) = document.children.iter_mut().find(|c| c.common().id == id) {
                child.common_mut().visible = true;
            }
        }
        document
    }

    fn capture(&self) -> EditorResult<Snapshot> {
        Ok(Snapshot::from_document(&self.document())?)
    }

    fn report_missing_filters(&mut self) {
        if !self.filters_reported {
            log::info!("image filters unavailable, images render unfiltered");
            self.filters_reported = true;
        }
    }

    fn ensure_not_editing(&self) -> EditorResult<()> {
        match self.editing {
            Some(_) => Err(EditorError::EditInProgress),
            None => Ok(()),
        }
    }

    fn selected_id(&self) -> EditorResult<NodeId> {
        self.selection.selected().ok_or(EditorError::NoSelection)
    }

    fn node_mut(&mut self, id: NodeId) -> EditorResult<&mut SceneNode> {
        self.graph
            .get_by_id_mut(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))
    }

    /// Add a node, bind its listeners and build its image cache.
    fn insert(&mut self, node: SceneNode, z: Option<usize>) -> NodeId {
        let idx = match z {
            Some(z) => self.graph.insert_node(z, node),
            None => self.graph.add_node(node),
        };
        let node = &mut self.graph.graph[idx];
        self.listeners.attach(node);
        let unfiltered =
            rehydrate::reattach_image(node, &self.assets, self.filters.as_deref()).is_err();
        let id = node.id;
        if unfiltered {
            self.report_missing_filters();
        }
        id
    }

    /// Replace the whole scene with freshly decoded nodes.
    fn install(&mut self, nodes: Vec<SceneNode>) {
        self.editing = None;
        self.preview_dirty = false;
        self.animator.clear();
        self.listeners.clear();
        self.graph.replace_nodes(nodes);
        // Deselect before any listener is wired to the new nodes.
        self.deselect();
        let report = rehydrate::rehydrate_all(
            &mut self.graph,
            &mut self.listeners,
            &self.assets,
            self.filters.as_deref(),
        );
        if report.unfiltered > 0 {
            self.report_missing_filters();
        }
    }

    fn decode(snapshot: &Snapshot) -> EditorResult<Vec<SceneNode>> {
        snapshot::restore(snapshot).map_err(|err| {
            log::warn!("snapshot not restored, scene left as is: {err}");
            err.into()
        })
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back one state. `Ok(false)` at the oldest state or while a
    /// text edit is open.
    pub fn undo(&mut self) -> EditorResult<bool> {
        if self.editing.is_some() {
            return Ok(false);
        }
        let Some(snapshot) = self.history.peek_undo() else {
            return Ok(false);
        };
        let nodes = Self::decode(snapshot)?;
        self.history.undo();
        self.install(nodes);
        Ok(true)
    }

    /// Step forward one state. `Ok(false)` at the newest state or while a
    /// text edit is open.
    pub fn redo(&mut self) -> EditorResult<bool> {
        if self.editing.is_some() {
            return Ok(false);
        }
        let Some(snapshot) = self.history.peek_redo() else {
            return Ok(false);
        };
        let nodes = Self::decode(snapshot)?;
        self.history.redo();
        self.install(nodes);
        Ok(true)
    }

    // ─── Templates ───────────────────────────────────────────────────────

    pub fn load_template(&mut self, template: TemplateId) -> EditorResult<()> {
        self.ensure_not_editing()?;
        let nodes = template.instantiate()?;
        let document = LayerDocument::new(nodes.iter().filter_map(snapshot::encode_node).collect());
        let snapshot = Snapshot::from_document(&document)?;
        self.install(nodes);
        self.history.push(snapshot);
        log::info!("loaded {template}");
        Ok(())
    }

    pub fn load_template_named(&mut self, name: &str) -> EditorResult<()> {
        self.load_template(name.parse::<TemplateId>()?)
    }

    /// Replace the scene with an arbitrary layer document and push it.
    pub fn import_json(&mut self, json: &str) -> EditorResult<()> {
        self.ensure_not_editing()?;
        let snapshot = Snapshot::from_json(json)?;
        let nodes = Self::decode(&snapshot)?;
        self.install(nodes);
        self.history.push(snapshot);
        Ok(())
    }

    // ─── Adding content ──────────────────────────────────────────────────

    /// Add a word-wrapped text block, as wide as the stage minus margins.
    pub fn add_text(
        &mut self,
        content: &str,
        font_size: f32,
        fill: Color,
        x: f32,
        y: f32,
    ) -> EditorResult<NodeId> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(EditorError::InvalidValue("fontSize"));
        }
        let width = (self.view.width - 100.0).max(0.0);
        let node = SceneNode::editable(
            NodeKind::Text(TextProps::new(content, font_size, fill)),
            Frame::new(x, y, width, 0.0),
        );
        let id = self.insert(node, None);
        self.commit("add text")?;
        Ok(id)
    }

    pub fn add_text_preset(&mut self, preset: TextPreset) -> EditorResult<NodeId> {
        self.add_text(preset.content(), preset.font_size(), Color::WHITE, 50.0, 150.0)
    }

    /// Add a rectangle behind everything else.
    pub fn add_rectangle(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
    ) -> EditorResult<NodeId> {
        if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
            return Err(EditorError::InvalidValue("size"));
        }
        let node = SceneNode::editable(
            NodeKind::Rect(RectProps {
                fill: Some(fill),
                ..Default::default()
            }),
            Frame::new(x, y, width, height),
        );
        let id = self.insert(node, Some(0));
        self.commit("add rectangle")?;
        Ok(id)
    }

    /// Scale an image to fit the stage's image area and center it.
    fn fit_image(&self, width: f32, height: f32) -> Frame {
        let max_w = self.view.width * self.config.image_fit;
        let max_h = self.view.height * self.config.image_fit;
        let (mut w, mut h) = (width, height);
        if w > max_w || h > max_h {
            let ratio = (max_w / w).min(max_h / h);
            w *= ratio;
            h *= ratio;
        }
        Frame::new(
            self.view.width / 2.0 - w / 2.0,
            self.view.height / 2.0 - h / 2.0,
            w,
            h,
        )
    }

    /// Add decoded pixels as a new, centered image node.
    pub fn add_image(&mut self, source: &str, pixels: Raster) -> EditorResult<NodeId> {
        let frame = self.fit_image(pixels.width() as f32, pixels.height() as f32);
        let key = self.assets.store(source, pixels);
        let node = SceneNode::editable(NodeKind::Image(ImageProps::new(key)), frame);
        let id = self.insert(node, None);
        self.commit("add image")?;
        Ok(id)
    }

    /// The placeholder rectangle under a stage position, if any.
    pub fn placeholder_at(&self, x: f32, y: f32) -> Option<NodeId> {
        let id = hit_test(&self.graph, x, y)?;
        let node = self.graph.get_by_id(id)?;
        let placeholder = PLACEHOLDER_IDS.iter().any(|p| *p == id.as_str());
        (placeholder && node.as_rect().is_some()).then_some(id)
    }

    /// Drop an image at a stage position: fill the placeholder under the
    /// pointer, or insert a new image node.
    pub fn drop_image_at(
        &mut self,
        x: f32,
        y: f32,
        source: &str,
        pixels: Raster,
    ) -> EditorResult<ImagePlacement> {
        let Some(id) = self.placeholder_at(x, y) else {
            return self.add_image(source, pixels).map(ImagePlacement::Inserted);
        };
        let key = self.assets.store(source, pixels);
        if let Some(rect) = self.node_mut(id)?.as_rect_mut() {
            rect.fill_image = Some(key);
        }
        self.selection.refresh(&self.graph);
        self.commit("fill placeholder")?;
        Ok(ImagePlacement::FilledPlaceholder(id))
    }

    /// Start an asynchronous image insertion. The host decodes the file and
    /// calls `complete_image_load` with the ticket.
    pub fn begin_image_load(&mut self) -> LoadTicket {
        self.assets.begin_load(LoadTarget::Insert)
    }

    /// Start an asynchronous drop at a stage position.
    pub fn begin_image_drop(&mut self, x: f32, y: f32) -> LoadTicket {
        self.assets.begin_load(LoadTarget::DropAt { x, y })
    }

    /// Finish a pending load. The image is placed into whatever scene is
    /// current, even if it changed since the load began.
    pub fn complete_image_load(
        &mut self,
        ticket: LoadTicket,
        source: &str,
        pixels: Raster,
    ) -> EditorResult<ImagePlacement> {
        let target = self
            .assets
            .finish_load(ticket)
            .ok_or(EditorError::UnknownTicket(ticket.0))?;
        match target {
            LoadTarget::Insert => self.add_image(source, pixels).map(ImagePlacement::Inserted),
            LoadTarget::DropAt { x, y } => self.drop_image_at(x, y, source, pixels),
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node. The node under an open text edit is hidden and
    /// cannot be selected.
    pub fn select(&mut self, id: NodeId) -> bool {
        if self.editing == Some(id) {
            return false;
        }
        self.selection.select(&mut self.graph, id)
    }

    pub fn deselect(&mut self) {
        let document = self.document_properties();
        self.selection.deselect(&mut self.graph, document);
    }

    /// A click on a node: select it if it listens for selection, otherwise
    /// treat it as a click on the background.
    pub fn click_node(&mut self, id: NodeId) -> bool {
        if self.listeners.handles(id, Interaction::Select) && self.select(id) {
            return true;
        }
        self.deselect();
        false
    }

    /// A click at a stage position.
    pub fn click_at(&mut self, x: f32, y: f32) -> Option<NodeId> {
        match hit_test(&self.graph, x, y) {
            Some(id) => self.click_node(id).then_some(id),
            None => {
                self.deselect();
                None
            }
        }
    }

    /// A double-click at a stage position: starts editing text under it.
    pub fn double_click_at(&mut self, x: f32, y: f32) -> EditorResult<Option<TextEdit>> {
        match hit_test(&self.graph, x, y) {
            Some(id) if self.listeners.handles(id, Interaction::EditText) => {
                self.begin_text_edit(id).map(Some)
            }
            _ => Ok(None),
        }
    }

    // ─── Mutations on the selection ──────────────────────────────────────

    pub fn delete_selection(&mut self) -> EditorResult<NodeId> {
        let id = self.selected_id()?;
        if !self.graph.contains(id) {
            return Err(EditorError::UnknownNode(id.to_string()));
        }
        self.deselect();
        self.animator.cancel(id);
        self.listeners.detach(id);
        self.graph.remove_node(id);
        self.commit("delete")?;
        Ok(id)
    }

    /// Clone the selection, offset it, put it on top and clear the
    /// selection.
    pub fn duplicate_selection(&mut self) -> EditorResult<NodeId> {
        let id = self.selected_id()?;
        let original = self
            .graph
            .get_by_id(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        let mut clone = original.clone();
        clone.id = NodeId::with_prefix(clone.kind.id_prefix());
        clone.frame.x += self.config.duplicate_offset;
        clone.frame.y += self.config.duplicate_offset;
        clone.editable = true;
        let clone_id = self.insert(clone, None);
        self.deselect();
        self.commit("duplicate")?;
        Ok(clone_id)
    }

    /// Reset the selected image's filters and apply `preset`.
    pub fn apply_filter_preset(&mut self, preset: FilterPreset) -> EditorResult<()> {
        let id = self.selected_id()?;
        let node = self
            .graph
            .get_by_id_mut(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        let found = node.class_name();
        let image = node
            .as_image_mut()
            .ok_or(EditorError::wrong_variant("Image", found))?;
        image.apply_preset(preset);

        let mut unfiltered = false;
        match (self.filters.as_deref(), self.assets.get(&image.source)) {
            (Some(backend), Some(pixels)) => {
                image.refresh_cache(pixels, backend);
            }
            (Some(_), None) => log::debug!("no pixels for {id}, cache left cold"),
            (None, _) => unfiltered = true,
        }
        if unfiltered {
            self.report_missing_filters();
        }
        self.selection.refresh(&self.graph);
        self.commit(preset.as_str())
    }

    /// Start an entrance animation on the selection. Opacity and scale are
    /// reset to their resting values first; the stored state is the end
    /// state.
    pub fn apply_animation(&mut self, kind: AnimationKind, now: f64) -> EditorResult<()> {
        let id = self.selected_id()?;
        let node = self
            .graph
            .get_by_id_mut(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        node.opacity = 1.0;
        node.frame.scale_x = 1.0;
        node.frame.scale_y = 1.0;
        node.animation = kind;
        self.animator.start(node, kind, now);
        self.selection.refresh(&self.graph);
        self.commit(kind.as_str())
    }

    /// Presentation overrides for running animations at `now`.
    pub fn animation_frame(&mut self, now: f64) -> Vec<(NodeId, Presentation)> {
        self.animator.tick(now)
    }

    fn write_style(&mut self, change: &StyleChange) -> EditorResult<()> {
        let id = self.selected_id()?;
        style::apply(self.node_mut(id)?, change)?;
        self.selection.refresh(&self.graph);
        Ok(())
    }

    /// Write one attribute of the selection and push.
    pub fn restyle(&mut self, change: StyleChange) -> EditorResult<()> {
        self.write_style(&change)?;
        self.commit(change.name())
    }

    /// Write one attribute without pushing (a slider still moving).
    pub fn preview_style(&mut self, change: StyleChange) -> EditorResult<()> {
        self.write_style(&change)?;
        self.preview_dirty = true;
        Ok(())
    }

    /// Push the state reached by previews. `Ok(false)` if there were none.
    pub fn commit_preview(&mut self) -> EditorResult<bool> {
        if !self.preview_dirty {
            return Ok(false);
        }
        self.commit("preview")?;
        Ok(true)
    }

    pub fn bring_to_front(&mut self) -> EditorResult<()> {
        let id = self.selected_id()?;
        self.graph.move_to_top(id);
        self.commit("bring to front")
    }

    pub fn send_to_back(&mut self) -> EditorResult<()> {
        let id = self.selected_id()?;
        self.graph.move_to_bottom(id);
        self.commit("send to back")
    }

    // ─── Pointer gestures ────────────────────────────────────────────────

    /// Move a node during a drag. Not pushed until `drag_end`.
    pub fn drag_to(&mut self, id: NodeId, x: f32, y: f32) -> EditorResult<bool> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(EditorError::InvalidValue("position"));
        }
        let node = self.node_mut(id)?;
        if !node.draggable {
            return Ok(false);
        }
        node.frame.x = x;
        node.frame.y = y;
        self.preview_dirty = true;
        Ok(true)
    }

    /// The drag finished: push if the node listens for it.
    pub fn drag_end(&mut self, id: NodeId) -> EditorResult<bool> {
        if !self.listeners.handles(id, Interaction::DragEnd) {
            return Ok(false);
        }
        self.commit("drag")?;
        Ok(true)
    }

    /// Resize/rotate a node through the handle. Not pushed until
    /// `transform_end`.
    pub fn transform_to(&mut self, id: NodeId, frame: Frame) -> EditorResult<()> {
        let valid = [
            frame.x,
            frame.y,
            frame.width,
            frame.height,
            frame.scale_x,
            frame.scale_y,
            frame.rotation,
        ]
        .iter()
        .all(|v| v.is_finite())
            && frame.width >= 0.0
            && frame.height >= 0.0;
        if !valid {
            return Err(EditorError::InvalidValue("frame"));
        }
        self.node_mut(id)?.frame = frame;
        self.selection.refresh(&self.graph);
        self.preview_dirty = true;
        Ok(())
    }

    /// The transform finished: push if the node listens for it.
    pub fn transform_end(&mut self, id: NodeId) -> EditorResult<bool> {
        if !self.listeners.handles(id, Interaction::TransformEnd) {
            return Ok(false);
        }
        self.commit("transform")?;
        Ok(true)
    }

    // ─── In-place text editing ───────────────────────────────────────────

    /// Hide a text node and hand its geometry to the host's text editor.
    pub fn begin_text_edit(&mut self, id: NodeId) -> EditorResult<TextEdit> {
        let node = self
            .graph
            .get_by_id(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        if !self.listeners.handles(id, Interaction::EditText) {
            return Err(EditorError::wrong_variant("Text", node.class_name()));
        }
        if let Some(previous) = self.editing.take() {
            if let Some(node) = self.graph.get_by_id_mut(previous) {
                node.visible = true;
            }
        }
        self.deselect();

        let node = self.node_mut(id)?;
        node.visible = false;
        let (width, height) = node.extent();
        let edit = match node.as_text() {
            Some(t) => TextEdit {
                id,
                content: t.content.clone(),
                x: node.frame.x,
                y: node.frame.y,
                width,
                height,
                font_size: t.font_size,
                font_family: t.font_family.clone(),
                fill: t.fill,
                line_height: t.line_height,
            },
            None => return Err(EditorError::wrong_variant("Text", node.class_name())),
        };
        self.editing = Some(id);
        Ok(edit)
    }

    /// Write the edited content, show the node again and push.
    pub fn commit_text_edit(&mut self, content: &str) -> EditorResult<()> {
        let id = self.editing.take().ok_or(EditorError::NotEditing)?;
        let node = self.node_mut(id)?;
        node.visible = true;
        if let Some(text) = node.as_text_mut() {
            text.content = content.to_string();
        }
        self.commit("edit text")
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and run a key press. Keys are ignored while a text edit is
    /// open, since the host's text field owns them.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> EditorResult<Option<ShortcutAction>> {
        if self.editing.is_some() {
            return Ok(None);
        }
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return Ok(None);
        };
        self.dispatch(action)?;
        Ok(Some(action))
    }

    /// Run a shortcut action. Actions that need a (suitable) selection do
    /// nothing without one.
    pub fn dispatch(&mut self, action: ShortcutAction) -> EditorResult<bool> {
        let result = match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selection().map(|_| true),
            ShortcutAction::Duplicate => self.duplicate_selection().map(|_| true),
            ShortcutAction::ToggleBold => self.restyle(StyleChange::ToggleBold).map(|_| true),
            ShortcutAction::ToggleItalic => self.restyle(StyleChange::ToggleItalic).map(|_| true),
            ShortcutAction::IncreaseFontSize => {
                self.restyle(StyleChange::IncreaseFontSize).map(|_| true)
            }
            ShortcutAction::BringToFront => self.bring_to_front().map(|_| true),
            ShortcutAction::SendToBack => self.send_to_back().map(|_| true),
            ShortcutAction::ZoomIn => Ok(self.zoom_in()),
            ShortcutAction::ZoomOut => Ok(self.zoom_out()),
            ShortcutAction::Deselect => {
                self.deselect();
                Ok(true)
            }
        };
        match result {
            Err(EditorError::NoSelection | EditorError::WrongVariant { .. }) => Ok(false),
            other => other,
        }
    }

    // ─── Stage view ──────────────────────────────────────────────────────

    pub fn resize_stage(&mut self, width: f32, height: f32) -> bool {
        self.view.resize(width, height)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.view.zoom_out()
    }

    pub fn set_background(&mut self, color: Color) {
        self.view.background = color;
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// The current design as a layer document. The transform handle is
    /// never part of it.
    pub fn export_document(&self) -> LayerDocument {
        self.document()
    }

    pub fn export_json(&self) -> EditorResult<String> {
        Ok(self.capture()?.to_json_pretty()?)
    }

    /// The filtered bitmap of an image, recomputed if any filter input
    /// changed since it was cached. Unfiltered pixels without a backend;
    /// `None` when the pixels are unknown.
    pub fn filtered_image(&mut self, id: NodeId) -> EditorResult<Option<Arc<Raster>>> {
        let node = self
            .graph
            .get_by_id_mut(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        let found = node.class_name();
        let image = node
            .as_image_mut()
            .ok_or(EditorError::wrong_variant("Image", found))?;
        let Some(pixels) = self.assets.get(&image.source) else {
            return Ok(None);
        };
        Ok(Some(match self.filters.as_deref() {
            Some(backend) => image.filtered(pixels, backend),
            None => Arc::clone(pixels),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        let _ = env_logger::builder().is_test(true).try_init();
        EditorSession::new(EditorConfig::default()).unwrap()
    }

    #[test]
    fn starts_with_the_welcome_text() {
        let s = session();
        assert_eq!(s.graph().len(), 1);
        assert_eq!(s.history().len(), 1);
        let welcome = s.graph().nodes().next().unwrap();
        let text = welcome.as_text().unwrap();
        assert_eq!(text.content, WELCOME_TEXT);
        assert_eq!(text.font_size, 30.0);
        assert_eq!(welcome.frame.width, 200.0);
        assert!(s.listeners().handles(welcome.id, Interaction::EditText));
    }

    #[test]
    fn images_fit_and_center() {
        let mut s = session();
        let id = s.add_image("big", Raster::solid(600, 300, [0, 0, 0, 255])).unwrap();
        let frame = s.node(id).unwrap().frame;
        assert!((frame.width - 240.0).abs() < 1e-3);
        assert!((frame.height - 120.0).abs() < 1e-3);
        assert!((frame.x - 30.0).abs() < 1e-3);
        assert!((frame.y - 215.0).abs() < 1e-3);

        let id = s.add_image("small", Raster::solid(10, 20, [0, 0, 0, 255])).unwrap();
        let frame = s.node(id).unwrap().frame;
        assert_eq!((frame.width, frame.height), (10.0, 20.0));
    }

    #[test]
    fn new_rectangles_go_to_the_back() {
        let mut s = session();
        let id = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
        assert_eq!(s.graph().z_index(id), Some(0));
    }

    #[test]
    fn disabled_filters_leave_caches_cold() {
        let config = EditorConfig {
            filters_available: false,
            ..Default::default()
        };
        let mut s = EditorSession::new(config).unwrap();
        assert!(!s.has_filters());
        let id = s.add_image("pic", Raster::solid(2, 2, [10, 20, 30, 255])).unwrap();
        s.select(id);
        s.apply_filter_preset(FilterPreset::Vintage).unwrap();
        let image = s.node(id).unwrap().as_image().unwrap();
        assert_eq!(image.preset, FilterPreset::Vintage);
        assert!(image.cache.bitmap().is_none());
        let raw = s.filtered_image(id).unwrap().unwrap();
        assert_eq!(raw.pixel(0, 0), Some([10, 20, 30, 255]));
    }
}
