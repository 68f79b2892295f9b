//! Integration tests: the editor session's mutation surface.

use pretty_assertions::assert_eq;
use tc_core::snapshot::document_of;
use tc_core::*;
use tc_editor::*;

fn session() -> EditorSession {
    let _ = env_logger::builder().is_test(true).try_init();
    EditorSession::new(EditorConfig::default()).unwrap()
}

fn welcome_id(s: &EditorSession) -> NodeId {
    s.graph().nodes().next().unwrap().id
}

// ─── Templates ──────────────────────────────────────────────────────────

#[test]
fn loading_a_template_clears_the_selection() {
    let mut s = session();
    let welcome = welcome_id(&s);
    assert!(s.select(welcome));

    s.load_template(TemplateId::Carousel).unwrap();
    assert_eq!(s.selected(), None);
    assert_eq!(s.graph().handle_target(), None);
    assert_eq!(s.history().len(), 2);

    let editable = s.graph().nodes().filter(|n| n.editable).count();
    assert!(editable > 0);
    assert_eq!(s.listeners().len(), editable);
}

#[test]
fn template_load_is_undoable() {
    let mut s = session();
    s.load_template_named("quote_graphic_template").unwrap();
    assert_eq!(s.graph().len(), 4);
    assert!(s.node(NodeId::intern("quote-text")).is_some());
    s.undo().unwrap();
    assert_eq!(s.graph().len(), 1);
    assert_eq!(
        s.graph().nodes().next().unwrap().as_text().unwrap().content,
        tc_editor::session::WELCOME_TEXT
    );
}

#[test]
fn unknown_template_changes_nothing() {
    let mut s = session();
    let before = document_of(s.graph());
    let err = s.load_template_named("brochure").unwrap_err();
    assert!(matches!(err, EditorError::Core(CoreError::UnknownTemplate(_))));
    assert_eq!(document_of(s.graph()), before);
    assert_eq!(s.history().len(), 1);
}

// ─── Images and filters ─────────────────────────────────────────────────

#[test]
fn monochrome_twice_equals_once() {
    let mut s = session();
    let id = s.add_image("pic.png", Raster::solid(4, 4, [100, 200, 50, 255])).unwrap();
    s.select(id);

    s.apply_filter_preset(FilterPreset::Monochrome).unwrap();
    let once = document_of(s.graph());
    let bitmap = s.node(id).unwrap().as_image().unwrap().cache.bitmap().cloned();
    assert!(bitmap.is_some());

    s.apply_filter_preset(FilterPreset::Monochrome).unwrap();
    assert_eq!(document_of(s.graph()), once);
    let again = s.node(id).unwrap().as_image().unwrap().cache.bitmap().cloned();
    assert_eq!(again, bitmap);
}

#[test]
fn presets_only_apply_to_images() {
    let mut s = session();
    s.select(welcome_id(&s));
    let err = s.apply_filter_preset(FilterPreset::Sunny).unwrap_err();
    assert_eq!(err, EditorError::wrong_variant("Image", "Text"));
}

#[test]
fn filtered_images_survive_undo() {
    let mut s = session();
    let id = s.add_image("pic.png", Raster::solid(2, 2, [100, 100, 100, 255])).unwrap();
    s.select(id);
    s.apply_filter_preset(FilterPreset::Vintage).unwrap();
    let filtered = s.filtered_image(id).unwrap().unwrap();

    s.add_rectangle(0.0, 0.0, 5.0, 5.0, Color::BLACK).unwrap();
    s.undo().unwrap();

    let image = s.node(id).unwrap().as_image().unwrap();
    assert_eq!(image.preset, FilterPreset::Vintage);
    assert_eq!(image.pipeline, FilterPreset::Vintage.pipeline());
    assert!(image.cache.bitmap().is_some());
    assert_eq!(s.filtered_image(id).unwrap().unwrap(), filtered);
}

#[test]
fn drop_on_a_placeholder_fills_it() {
    let mut s = session();
    s.load_template(TemplateId::VideoAd).unwrap();
    let count = s.graph().len();

    let placed = s
        .drop_image_at(150.0, 350.0, "photo.png", Raster::solid(8, 8, [1, 2, 3, 255]))
        .unwrap();
    let media = NodeId::intern("media-placeholder");
    assert_eq!(placed, ImagePlacement::FilledPlaceholder(media));
    assert_eq!(s.graph().len(), count);
    let rect = s.node(media).unwrap().as_rect().unwrap();
    assert_eq!(rect.fill_image.as_deref(), Some("photo.png"));
}

#[test]
fn drop_elsewhere_inserts_an_image() {
    let mut s = EditorSession::blank(EditorConfig::default()).unwrap();
    let placed = s
        .drop_image_at(10.0, 10.0, "photo.png", Raster::solid(8, 8, [1, 2, 3, 255]))
        .unwrap();
    assert!(matches!(placed, ImagePlacement::Inserted(_)));
    assert_eq!(s.node(placed.id()).unwrap().class_name(), "Image");
}

fn image_source(s: &EditorSession, id: NodeId) -> String {
    s.node(id).unwrap().as_image().unwrap().source.clone()
}

#[test]
fn same_name_uploads_keep_separate_pixels() {
    let mut s = EditorSession::blank(EditorConfig::default()).unwrap();
    let red = Raster::solid(4, 4, [255, 0, 0, 255]);
    let blue = Raster::solid(4, 4, [0, 0, 255, 255]);
    let first = s.add_image("upload.png", red.clone()).unwrap();
    let second = s.add_image("upload.png", blue.clone()).unwrap();

    assert_eq!(image_source(&s, first), "upload.png");
    assert_eq!(image_source(&s, second), "upload.png#1");
    assert_eq!(**s.assets().get("upload.png").unwrap(), red);
    assert_eq!(**s.assets().get("upload.png#1").unwrap(), blue);

    s.undo().unwrap();
    s.redo().unwrap();
    assert_eq!(image_source(&s, second), "upload.png#1");
    assert_eq!(s.assets().len(), 2);
}

#[test]
fn late_image_loads_still_land() {
    let mut s = session();
    let ticket = s.begin_image_load();
    s.load_template(TemplateId::EventPromo).unwrap();
    let count = s.graph().len();

    let placed = s
        .complete_image_load(ticket, "late.png", Raster::solid(4, 4, [0, 0, 0, 255]))
        .unwrap();
    assert!(matches!(placed, ImagePlacement::Inserted(_)));
    assert_eq!(s.graph().len(), count + 1);

    let err = s
        .complete_image_load(ticket, "late.png", Raster::solid(4, 4, [0, 0, 0, 255]))
        .unwrap_err();
    assert_eq!(err, EditorError::UnknownTicket(ticket.0));
}

// ─── Selection edits ────────────────────────────────────────────────────

#[test]
fn duplicate_offsets_and_deselects() {
    let mut s = session();
    let rect = s.add_rectangle(10.0, 10.0, 40.0, 40.0, Color::BLACK).unwrap();
    s.select(rect);

    let copy = s.duplicate_selection().unwrap();
    assert_ne!(copy, rect);
    assert_eq!(s.selected(), None);
    let frame = s.node(copy).unwrap().frame;
    assert_eq!((frame.x, frame.y), (30.0, 30.0));
    assert_eq!(s.graph().z_index(copy), Some(s.graph().len() - 1));
    assert!(s.listeners().is_attached(copy));
}

#[test]
fn clicks_select_and_clear() {
    let mut s = EditorSession::blank(EditorConfig::default()).unwrap();
    let rect = s.add_rectangle(0.0, 0.0, 100.0, 100.0, Color::BLACK).unwrap();
    s.drain_sidebar_updates();

    assert_eq!(s.click_at(50.0, 50.0), Some(rect));
    assert_eq!(s.graph().handle_target(), Some(rect));
    let updates = s.drain_sidebar_updates();
    assert!(matches!(&updates[..], [SidebarUpdate::Node(p)] if p.id == rect));

    assert_eq!(s.click_at(250.0, 500.0), None);
    assert_eq!(s.selected(), None);
    let updates = s.drain_sidebar_updates();
    assert!(matches!(&updates[..], [SidebarUpdate::Document(d)] if d.node_count == 1));
}

#[test]
fn z_order_moves_are_recorded() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    assert_eq!(s.graph().z_index(rect), Some(0));
    s.select(rect);
    s.bring_to_front().unwrap();
    assert_eq!(s.graph().z_index(rect), Some(1));
    s.undo().unwrap();
    assert_eq!(s.graph().z_index(rect), Some(0));
}

// ─── Text editing ───────────────────────────────────────────────────────

#[test]
fn double_click_edits_text_in_place() {
    let mut s = session();
    let welcome = welcome_id(&s);
    let edit = s.double_click_at(60.0, 120.0).unwrap().unwrap();
    assert_eq!(edit.id, welcome);
    assert_eq!(edit.content, tc_editor::session::WELCOME_TEXT);
    assert!(!s.node(welcome).unwrap().visible);

    // Keys belong to the text field while editing.
    assert_eq!(s.handle_key("z", true, false, false, false).unwrap(), None);

    s.commit_text_edit("Hello there").unwrap();
    let node = s.node(welcome).unwrap();
    assert!(node.visible);
    assert_eq!(node.as_text().unwrap().content, "Hello there");
    assert_eq!(s.history().len(), 2);
    assert_eq!(s.commit_text_edit("again").unwrap_err(), EditorError::NotEditing);
}

#[test]
fn only_text_can_be_edited() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    let err = s.begin_text_edit(rect).unwrap_err();
    assert_eq!(err, EditorError::wrong_variant("Text", "Rect"));
    assert_eq!(s.editing(), None);
}

// ─── Keyboard ───────────────────────────────────────────────────────────

#[test]
fn delete_and_undo_from_the_keyboard() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    s.select(rect);

    let action = s.handle_key("Delete", false, false, false, false).unwrap();
    assert_eq!(action, Some(ShortcutAction::Delete));
    assert!(s.node(rect).is_none());

    s.handle_key("z", true, false, false, false).unwrap();
    assert!(s.node(rect).is_some());
}

#[test]
fn selection_shortcuts_without_selection_do_nothing() {
    let mut s = session();
    let pushed = s.history().len();
    assert!(!s.dispatch(ShortcutAction::ToggleBold).unwrap());
    assert!(!s.dispatch(ShortcutAction::Delete).unwrap());
    assert_eq!(s.history().len(), pushed);

    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    s.select(rect);
    assert!(!s.dispatch(ShortcutAction::ToggleItalic).unwrap());
}

#[test]
fn zoom_is_bounded() {
    let mut s = session();
    while s.zoom_in() {}
    assert!(s.view().zoom >= 2.0);
    assert!(s.view().zoom < 2.2);
    while s.dispatch(ShortcutAction::ZoomOut).unwrap() {}
    assert!(s.view().zoom <= 0.5);
}

// ─── Animations ─────────────────────────────────────────────────────────

#[test]
fn animations_are_not_captured() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    s.select(rect);
    s.apply_animation(AnimationKind::ZoomIn, 0.0).unwrap();

    let frame = s.animation_frame(0.1);
    assert_eq!(frame.len(), 1);
    assert!(frame[0].1.scale_x < 1.0);
    let node = s.node(rect).unwrap();
    assert_eq!(node.frame.scale_x, 1.0);
    assert_eq!(node.animation, AnimationKind::ZoomIn);

    s.undo().unwrap();
    assert!(s.animation_frame(0.2).is_empty());
    s.redo().unwrap();
    assert_eq!(s.node(rect).unwrap().animation, AnimationKind::ZoomIn);
    assert_eq!(s.node(rect).unwrap().opacity, 1.0);
}

// ─── Export ─────────────────────────────────────────────────────────────

#[test]
fn export_never_contains_the_handle() {
    let mut s = session();
    s.select(welcome_id(&s));
    let json = s.export_json().unwrap();
    assert!(!json.contains(TRANSFORM_HANDLE_ID));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["className"], "Layer");
    assert_eq!(value["children"].as_array().unwrap().len(), 1);
}
