//! Single selection and the transform handle.
//!
//! The controller owns the current selection and keeps the graph's transform
//! handle pointing at it. Every change queues a sidebar update; an update
//! for the same target as the newest queued one replaces it.

use crate::sidebar::{DocumentProperties, NodeProperties, SidebarUpdate};
use tc_core::SceneGraph;
use tc_core::id::NodeId;

#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<NodeId>,
    updates: Vec<SidebarUpdate>,
}

impl SelectionController {
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected == Some(id)
    }

    /// Select exactly one editable node and attach the handle to it.
    /// Returns `false` (and leaves the selection alone) for unknown or
    /// structural nodes.
    pub fn select(&mut self, graph: &mut SceneGraph, id: NodeId) -> bool {
        let Some(node) = graph.get_by_id(id) else {
            return false;
        };
        if !node.editable {
            return false;
        }
        let properties = NodeProperties::of(node);
        if !graph.set_handle_target(Some(id)) {
            return false;
        }
        self.selected = Some(id);
        self.queue(SidebarUpdate::Node(properties));
        log::debug!("selected {id}");
        true
    }

    /// Clear the selection and detach the handle.
    pub fn deselect(&mut self, graph: &mut SceneGraph, document: DocumentProperties) {
        graph.set_handle_target(None);
        if let Some(id) = self.selected.take() {
            log::debug!("deselected {id}");
        }
        self.queue(SidebarUpdate::Document(document));
    }

    /// Re-announce the selected node after an attribute write.
    pub fn refresh(&mut self, graph: &SceneGraph) {
        if let Some(node) = self.selected.and_then(|id| graph.get_by_id(id)) {
            self.queue(SidebarUpdate::Node(NodeProperties::of(node)));
        }
    }

    fn queue(&mut self, update: SidebarUpdate) {
        let replaces = match (self.updates.last(), &update) {
            (Some(SidebarUpdate::Node(prev)), SidebarUpdate::Node(next)) => prev.id == next.id,
            (Some(SidebarUpdate::Document(_)), SidebarUpdate::Document(_)) => true,
            _ => false,
        };
        if replaces {
            self.updates.pop();
        }
        self.updates.push(update);
    }

    pub fn drain_updates(&mut self) -> Vec<SidebarUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn pending_updates(&self) -> &[SidebarUpdate] {
        &self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorConfig, StageView};
    use tc_core::model::*;

    fn document() -> DocumentProperties {
        DocumentProperties {
            stage: StageView::new(&EditorConfig::default()),
            node_count: 0,
            can_undo: false,
            can_redo: false,
        }
    }

    fn graph_with_rect() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        let node = SceneNode::editable(
            NodeKind::Rect(RectProps::default()),
            Frame::new(0.0, 0.0, 5.0, 5.0),
        );
        let id = node.id;
        graph.add_node(node);
        (graph, id)
    }

    #[test]
    fn select_attaches_handle() {
        let (mut graph, id) = graph_with_rect();
        let mut selection = SelectionController::default();
        assert!(selection.select(&mut graph, id));
        assert_eq!(selection.selected(), Some(id));
        assert_eq!(graph.handle_target(), Some(id));
        assert!(matches!(
            selection.drain_updates().as_slice(),
            [SidebarUpdate::Node(p)] if p.id == id
        ));
    }

    #[test]
    fn deselect_detaches_handle() {
        let (mut graph, id) = graph_with_rect();
        let mut selection = SelectionController::default();
        selection.select(&mut graph, id);
        selection.deselect(&mut graph, document());
        assert_eq!(selection.selected(), None);
        assert_eq!(graph.handle_target(), None);
        let updates = selection.drain_updates();
        assert!(matches!(updates.last(), Some(SidebarUpdate::Document(_))));
    }

    #[test]
    fn structural_and_unknown_nodes_cannot_be_selected() {
        let (mut graph, id) = graph_with_rect();
        graph.get_by_id_mut(id).unwrap().editable = false;
        let mut selection = SelectionController::default();
        assert!(!selection.select(&mut graph, id));
        assert!(!selection.select(&mut graph, NodeId::intern("ghost")));
        assert_eq!(selection.selected(), None);
        assert_eq!(graph.handle_target(), None);
        assert!(selection.pending_updates().is_empty());
    }

    #[test]
    fn repeated_refreshes_keep_the_newest() {
        let (mut graph, id) = graph_with_rect();
        let mut selection = SelectionController::default();
        selection.select(&mut graph, id);
        for step in 1..=50 {
            graph.get_by_id_mut(id).unwrap().opacity = step as f32 / 50.0;
            selection.refresh(&graph);
        }
        assert!(matches!(
            selection.pending_updates(),
            [SidebarUpdate::Node(p)] if p.id == id && p.opacity == 1.0
        ));

        selection.deselect(&mut graph, document());
        selection.deselect(&mut graph, document());
        assert_eq!(selection.drain_updates().len(), 2);
    }

    #[test]
    fn selecting_moves_the_handle() {
        let (mut graph, first) = graph_with_rect();
        let second = SceneNode::editable(
            NodeKind::Rect(RectProps::default()),
            Frame::new(9.0, 9.0, 5.0, 5.0),
        );
        let second_id = second.id;
        graph.add_node(second);

        let mut selection = SelectionController::default();
        selection.select(&mut graph, first);
        selection.select(&mut graph, second_id);
        assert_eq!(selection.selected(), Some(second_id));
        assert_eq!(graph.handle_target(), Some(second_id));
    }
}
