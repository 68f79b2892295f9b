//! Node rehydration: listener bindings and derived image state.
//!
//! A restored node is plain data. Before it behaves like a live node it needs
//! its pointer interactions bound and, for images, its filter pipeline and
//! cached bitmap rebuilt, since documents never carry either.

use crate::assets::AssetStore;
use smallvec::SmallVec;
use std::collections::HashMap;
use tc_core::filter::FilterBackend;
use tc_core::id::NodeId;
use tc_core::model::*;
use tc_core::{CoreError, CoreResult, FilterPreset, SceneGraph};

/// A pointer interaction a node can respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// Click or tap selects the node.
    Select,
    /// Double-click starts in-place text editing.
    EditText,
    /// The end of a drag records a history entry.
    DragEnd,
    /// The end of a resize/rotate records a history entry.
    TransformEnd,
}

const POINTER: [Interaction; 3] = [
    Interaction::Select,
    Interaction::DragEnd,
    Interaction::TransformEnd,
];

const TEXT: [Interaction; 4] = [
    Interaction::Select,
    Interaction::EditText,
    Interaction::DragEnd,
    Interaction::TransformEnd,
];

/// The interaction contract of a node variant. Rectangles and images share
/// the default pointer contract; text adds in-place editing.
pub trait InteractiveNode {
    fn interactions(&self) -> &'static [Interaction] {
        &POINTER
    }
}

impl InteractiveNode for RectProps {}

impl InteractiveNode for ImageProps {}

impl InteractiveNode for TextProps {
    fn interactions(&self) -> &'static [Interaction] {
        &TEXT
    }
}

/// Interactions for any node. Layers and the transform handle have none.
pub fn interactions_of(node: &SceneNode) -> &'static [Interaction] {
    match &node.kind {
        NodeKind::Rect(r) => r.interactions(),
        NodeKind::Image(i) => i.interactions(),
        NodeKind::Text(t) => t.interactions(),
        NodeKind::Layer | NodeKind::TransformHandle { .. } => &[],
    }
}

type Bindings = SmallVec<[Interaction; 4]>;

/// Which interactions are bound to which node.
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    bindings: HashMap<NodeId, Bindings>,
}

impl ListenerRegistry {
    /// Bind the node's interactions. Only editable nodes are bound, and
    /// binding an already-bound node adds nothing. Returns the number of
    /// interactions newly bound.
    pub fn attach(&mut self, node: &SceneNode) -> usize {
        if !node.editable {
            return 0;
        }
        let bound = self.bindings.entry(node.id).or_default();
        let mut added = 0;
        for interaction in interactions_of(node) {
            if !bound.contains(interaction) {
                bound.push(*interaction);
                added += 1;
            }
        }
        if added > 0 {
            log::trace!("bound {added} interaction(s) to {}", node.id);
        }
        added
    }

    pub fn detach(&mut self, id: NodeId) -> bool {
        self.bindings.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn handles(&self, id: NodeId, interaction: Interaction) -> bool {
        self.bindings
            .get(&id)
            .is_some_and(|b| b.contains(&interaction))
    }

    pub fn bindings(&self, id: NodeId) -> &[Interaction] {
        self.bindings.get(&id).map_or(&[], |b| b.as_slice())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Reinstall an image's filter pipeline from its stored preset and force
/// its cache to be recomputed.
///
/// Returns `Ok(true)` when a bitmap was rendered, `Ok(false)` for non-images
/// or images whose pixels are not in the store, and
/// `UnsupportedCapability` when there is no filter backend.
pub fn reattach_image(
    node: &mut SceneNode,
    assets: &AssetStore,
    backend: Option<&dyn FilterBackend>,
) -> CoreResult<bool> {
    let id = node.id;
    let Some(image) = node.as_image_mut() else {
        return Ok(false);
    };
    let Some(backend) = backend else {
        return Err(CoreError::UnsupportedCapability("filters"));
    };
    if image.preset != FilterPreset::None {
        image.pipeline = image.preset.pipeline();
    }
    image.cache.invalidate();
    match assets.get(&image.source) {
        Some(source) => {
            image.refresh_cache(source, backend);
            Ok(true)
        }
        None => {
            log::debug!("no pixels for {id} ({}), cache left cold", image.source);
            Ok(false)
        }
    }
}

/// What `rehydrate_all` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rehydrated {
    /// Nodes that received bindings.
    pub attached: usize,
    /// Images whose cache was rebuilt.
    pub cached: usize,
    /// Images skipped because there is no filter backend.
    pub unfiltered: usize,
}

/// Rehydrate every content node of a freshly replaced graph.
pub fn rehydrate_all(
    graph: &mut SceneGraph,
    registry: &mut ListenerRegistry,
    assets: &AssetStore,
    backend: Option<&dyn FilterBackend>,
) -> Rehydrated {
    let mut report = Rehydrated::default();
    for id in graph.node_ids() {
        let Some(node) = graph.get_by_id_mut(id) else {
            continue;
        };
        if registry.attach(node) > 0 {
            report.attached += 1;
        }
        match reattach_image(node, assets, backend) {
            Ok(true) => report.cached += 1,
            Ok(false) => {}
            Err(_) => report.unfiltered += 1,
        }
    }
    log::debug!("rehydrated {report:?}");
    report
}
