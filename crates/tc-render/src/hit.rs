//! Hit testing: point → node lookup.
//!
//! Reverse-walks the z-order (front-to-back) to find which content node is
//! at a given stage position. Only nodes that are listening and visible take
//! part; structural backdrops (`listening: false`) are transparent to input.

use kurbo::{Affine, Point, Rect};
use tc_core::SceneGraph;
use tc_core::id::NodeId;
use tc_core::model::*;

/// Local → stage transform of a node: translate, rotate, then scale.
pub fn node_transform(node: &SceneNode) -> Affine {
    let f = &node.frame;
    Affine::translate((f.x as f64, f.y as f64))
        * Affine::rotate((f.rotation as f64).to_radians())
        * Affine::scale_non_uniform(f.scale_x as f64, f.scale_y as f64)
}

/// The node's unscaled box in its own coordinate space.
pub fn local_rect(node: &SceneNode) -> Rect {
    let (w, h) = node.extent();
    Rect::new(0.0, 0.0, w as f64, h as f64)
}

/// Axis-aligned bounding box in stage coordinates.
pub fn node_bounds(node: &SceneNode) -> Rect {
    node_transform(node).transform_rect_bbox(local_rect(node))
}

/// Whether the stage point lies inside the node's (possibly rotated) box.
pub fn contains_point(node: &SceneNode, px: f32, py: f32) -> bool {
    let transform = node_transform(node);
    if transform.determinant().abs() < f64::EPSILON {
        return false;
    }
    let local = transform.inverse() * Point::new(px as f64, py as f64);
    let rect = local_rect(node);
    // Inclusive on every edge.
    local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn is_hittable(node: &SceneNode) -> bool {
    node.is_content() && node.listening && node.visible
}

/// Find the topmost node at position (px, py).
/// Returns `None` if no node is hit (background).
pub fn hit_test(graph: &SceneGraph, px: f32, py: f32) -> Option<NodeId> {
    let hit = graph
        .nodes()
        .rev()
        .find(|node| is_hittable(node) && contains_point(node, px, py))
        .map(|node| node.id);
    log::trace!("hit_test ({px}, {py}) -> {hit:?}");
    hit
}

/// Find all hittable nodes whose bounds intersect the given rectangle,
/// back to front. Used for marquee (box) selection.
pub fn hit_test_rect(graph: &SceneGraph, area: Rect) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|node| is_hittable(node))
        .filter(|node| overlaps(node_bounds(node), area))
        .map(|node| node.id)
        .collect()
}
