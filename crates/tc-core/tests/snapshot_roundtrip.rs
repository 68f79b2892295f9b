//! Integration tests: SceneGraph → Snapshot → SceneGraph.
//!
//! Exercises the codec over every template and over hand-built scenes with
//! every node variant, shadow states, filters and animations.

use pretty_assertions::assert_eq;
use tc_core::snapshot::{capture, document_of, restore};
use tc_core::*;

fn graph_from(nodes: Vec<SceneNode>) -> SceneGraph {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut graph = SceneGraph::new();
    graph.replace_nodes(nodes);
    graph
}

fn content(graph: &SceneGraph) -> Vec<SceneNode> {
    graph.nodes().cloned().collect()
}

// ─── Templates ───────────────────────────────────────────────────────────

#[test]
fn templates_survive_capture_restore() {
    for id in TemplateId::ALL {
        let graph = graph_from(id.instantiate().unwrap());
        let snapshot = capture(&graph).unwrap();
        let restored = restore(&snapshot).unwrap();
        assert_eq!(content(&graph), restored, "{id}");
    }
}

#[test]
fn capture_is_stable() {
    let graph = graph_from(TemplateId::EventPromo.instantiate().unwrap());
    let first = capture(&graph).unwrap();
    let second = capture(&graph).unwrap();
    assert_eq!(first, second);

    let again = capture(&graph_from(restore(&first).unwrap())).unwrap();
    assert_eq!(first, again);
}

// ─── Hand-built scenes ───────────────────────────────────────────────────

#[test]
fn every_attribute_survives() {
    let mut text = SceneNode::editable(
        NodeKind::Text(TextProps {
            content: "Line one\nLine two".into(),
            font_family: "Georgia".into(),
            font_size: 22.0,
            font_style: FontStyle {
                bold: true,
                italic: true,
            },
            fill: Some(parse_color("#05EAFA80").unwrap()),
            align: TextAlign::Right,
            line_height: 1.25,
        }),
        Frame {
            x: 12.5,
            y: -4.0,
            width: 180.0,
            height: 0.0,
            scale_x: 1.5,
            scale_y: 0.75,
            rotation: 33.0,
        },
    );
    text.opacity = 0.4;
    text.animation = AnimationKind::SlideInLeft;
    text.shadow = Shadow {
        enabled: false,
        color: Some(Color::BLACK),
        blur: 3.0,
        offset_x: 1.0,
        offset_y: 2.0,
        opacity: 0.25,
    };

    let mut rect = SceneNode::editable(
        NodeKind::Rect(RectProps {
            fill: None,
            stroke: Some(Color::WHITE),
            stroke_width: 5.0,
            corner_radius: 100.0,
            fill_image: Some("asset-7".into()),
        }),
        Frame::new(50.0, 50.0, 200.0, 200.0),
    );
    rect.visible = false;

    let mut image = ImageProps::new("data:image/png;base64,AAAA");
    image.apply_preset(FilterPreset::BlueTone);
    let mut image = SceneNode::editable(
        NodeKind::Image(image),
        Frame::new(30.0, 55.0, 240.0, 440.0),
    );
    image.animation = AnimationKind::ZoomIn;

    let mut backdrop = SceneNode::new(
        NodeId::intern("backdrop"),
        NodeKind::Rect(RectProps {
            fill: Some(Color::from_hex("#141414").unwrap()),
            ..Default::default()
        }),
    );
    backdrop.listening = false;
    backdrop.frame = Frame::new(0.0, 0.0, 300.0, 550.0);

    let graph = graph_from(vec![backdrop, text, rect, image]);
    let restored = restore(&capture(&graph).unwrap()).unwrap();
    assert_eq!(content(&graph), restored);
}

#[test]
fn restored_images_have_cold_caches() {
    let mut props = ImageProps::new("upload-1");
    props.apply_preset(FilterPreset::Sunny);
    props.cache.store(props.cache_key(), Raster::solid(1, 1, [9, 9, 9, 255]));
    let graph = graph_from(vec![SceneNode::editable(
        NodeKind::Image(props),
        Frame::new(0.0, 0.0, 1.0, 1.0),
    )]);

    let restored = restore(&capture(&graph).unwrap()).unwrap();
    let image = restored[0].as_image().unwrap();
    assert!(image.cache.bitmap().is_none());
    assert_eq!(image.preset, FilterPreset::Sunny);
    assert_eq!(image.pipeline, FilterPreset::Sunny.pipeline());
}

#[test]
fn z_order_is_preserved() {
    let mut graph = graph_from(TemplateId::ProductAnnouncement.instantiate().unwrap());
    let label = NodeId::intern("new-product-label");
    graph.move_to_bottom(label);
    let restored = graph_from(restore(&capture(&graph).unwrap()).unwrap());
    assert_eq!(restored.node_ids(), graph.node_ids());
    assert_eq!(restored.z_index(label), Some(0));
}

#[test]
fn empty_scene_roundtrips() {
    let graph = SceneGraph::new();
    let snapshot = capture(&graph).unwrap();
    assert!(restore(&snapshot).unwrap().is_empty());
    assert_eq!(snapshot.to_json().unwrap(), r#"{"className":"Layer","children":[]}"#);
}

#[test]
fn json_and_binary_forms_agree() {
    let graph = graph_from(TemplateId::Carousel.instantiate().unwrap());
    let snapshot = capture(&graph).unwrap();
    let json = snapshot.to_json().unwrap();
    let reparsed = Snapshot::from_json(&json).unwrap();
    assert_eq!(reparsed.document().unwrap(), document_of(&graph));
}
