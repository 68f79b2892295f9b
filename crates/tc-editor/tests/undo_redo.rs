//! Integration tests: undo/redo through the editor session.
//!
//! Every mutation pushes a capture; undo and redo restore a capture into the
//! live scene and rehydrate it.

use pretty_assertions::assert_eq;
use tc_core::snapshot::document_of;
use tc_core::*;
use tc_editor::{EditorConfig, EditorError, EditorSession, Interaction};

fn session() -> EditorSession {
    let _ = env_logger::builder().is_test(true).try_init();
    EditorSession::new(EditorConfig::default()).unwrap()
}

fn class_names(session: &EditorSession) -> Vec<&'static str> {
    session.graph().nodes().map(|n| n.class_name()).collect()
}

// ─── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn delete_then_undo_brings_the_rectangle_back() {
    let mut s = session();
    let rect = s
        .add_rectangle(20.0, 40.0, 120.0, 80.0, Color::from_hex("#FF6B6B").unwrap())
        .unwrap();
    let created = s.node(rect).unwrap().clone();

    assert!(s.select(rect));
    s.delete_selection().unwrap();
    assert_eq!(class_names(&s), vec!["Text"]);

    assert!(s.undo().unwrap());
    assert_eq!(class_names(&s), vec!["Rect", "Text"]);
    let restored = s.node(rect).unwrap();
    assert_eq!(restored.frame, created.frame);
    assert_eq!(restored.kind, created.kind);
    assert!(s.listeners().handles(rect, Interaction::DragEnd));

    // Redo reapplies the delete; a second undo lands on the same state.
    assert!(s.redo().unwrap());
    assert_eq!(class_names(&s), vec!["Text"]);
    assert!(s.undo().unwrap());
    assert_eq!(s.node(rect).unwrap().kind, created.kind);
    assert_eq!(s.graph().len(), 2);
}

#[test]
fn history_is_capped() {
    let config = EditorConfig {
        history_limit: 50,
        ..Default::default()
    };
    let mut s = EditorSession::blank(config).unwrap();
    // One entry from `blank`, 54 more from the rectangles.
    for i in 0..54 {
        s.add_rectangle(i as f32, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    }
    assert_eq!(s.history().len(), 50);
    assert_eq!(s.history().pointer(), Some(49));

    let mut steps = 0;
    while s.undo().unwrap() {
        steps += 1;
    }
    assert_eq!(steps, 49);
    // The oldest surviving entry is the sixth push: five rectangles.
    assert_eq!(s.graph().len(), 5);
}

#[test]
fn pushing_after_undo_discards_the_redo_branch() {
    let mut s = EditorSession::blank(EditorConfig::default()).unwrap();
    let b = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    let c = s.add_rectangle(5.0, 5.0, 10.0, 10.0, Color::WHITE).unwrap();
    s.undo().unwrap();
    s.undo().unwrap();
    let d = s.add_text("D", 12.0, Color::WHITE, 0.0, 0.0).unwrap();

    assert_eq!(s.history().len(), 2);
    assert!(!s.can_redo());
    assert!(!s.redo().unwrap());
    assert!(s.node(d).is_some());
    assert!(s.node(b).is_none());
    assert!(s.node(c).is_none());
}

#[test]
fn undo_then_redo_has_no_drift() {
    let mut s = session();
    let id = s.add_text("Hello", 24.0, Color::from_hex("#05EAFA").unwrap(), 12.5, 33.25).unwrap();
    s.select(id);
    s.restyle(tc_editor::StyleChange::Shadow(true)).unwrap();
    s.restyle(tc_editor::StyleChange::ToggleItalic).unwrap();
    let before = document_of(s.graph());

    s.undo().unwrap();
    s.redo().unwrap();
    assert_eq!(document_of(s.graph()), before);
}

#[test]
fn history_ends_are_no_ops() {
    let mut s = session();
    assert!(!s.undo().unwrap());
    assert!(!s.redo().unwrap());
    assert_eq!(s.graph().len(), 1);
    assert_eq!(s.history().len(), 1);
}

#[test]
fn restores_start_with_nothing_selected() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 50.0, 50.0, Color::BLACK).unwrap();
    s.select(rect);
    assert_eq!(s.graph().handle_target(), Some(rect));

    s.undo().unwrap();
    assert_eq!(s.selected(), None);
    assert_eq!(s.graph().handle_target(), None);
}

#[test]
fn malformed_import_leaves_everything_untouched() {
    let mut s = session();
    s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    let before = document_of(s.graph());
    let history = s.history().len();

    let bad = r#"{"className":"Layer","children":[{"className":"Rect","id":"r","x":0,"y":0,"width":-4,"height":2}]}"#;
    let err = s.import_json(bad).unwrap_err();
    assert!(matches!(err, EditorError::Core(CoreError::MalformedSnapshot(_))));
    assert!(s.import_json("not json").is_err());

    assert_eq!(document_of(s.graph()), before);
    assert_eq!(s.history().len(), history);
}

// ─── Previews ───────────────────────────────────────────────────────────

#[test]
fn previews_push_once_on_commit() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    s.select(rect);
    let pushed = s.history().len();

    for value in [0.9, 0.7, 0.5] {
        s.preview_style(tc_editor::StyleChange::Opacity(value)).unwrap();
    }
    assert_eq!(s.history().len(), pushed);
    assert!(s.commit_preview().unwrap());
    assert!(!s.commit_preview().unwrap());
    assert_eq!(s.history().len(), pushed + 1);

    s.undo().unwrap();
    assert_eq!(s.node(rect).unwrap().opacity, 1.0);
}

#[test]
fn drags_push_on_release() {
    let mut s = session();
    let rect = s.add_rectangle(0.0, 0.0, 10.0, 10.0, Color::BLACK).unwrap();
    let pushed = s.history().len();

    assert!(s.drag_to(rect, 5.0, 6.0).unwrap());
    assert!(s.drag_to(rect, 50.0, 60.0).unwrap());
    assert_eq!(s.history().len(), pushed);
    assert!(s.drag_end(rect).unwrap());
    assert_eq!(s.history().len(), pushed + 1);

    s.undo().unwrap();
    let frame = s.node(rect).unwrap().frame;
    assert_eq!((frame.x, frame.y), (0.0, 0.0));
    s.redo().unwrap();
    let frame = s.node(rect).unwrap().frame;
    assert_eq!((frame.x, frame.y), (50.0, 60.0));
}

// ─── Text edits ─────────────────────────────────────────────────────────

fn text_id(s: &EditorSession) -> NodeId {
    s.graph().nodes().find(|n| n.as_text().is_some()).unwrap().id
}

#[test]
fn commits_during_a_text_edit_keep_the_text_visible() {
    let mut s = session();
    let welcome = text_id(&s);
    s.begin_text_edit(welcome).unwrap();
    let rect = s.add_rectangle(0.0, 0.0, 40.0, 40.0, Color::BLACK).unwrap();
    assert!(!s.select(welcome));
    assert!(s.export_document().children.iter().all(|c| c.common().visible));

    s.commit_text_edit("Edited").unwrap();
    assert!(s.undo().unwrap());
    assert_eq!(s.editing(), None);
    assert!(s.node(rect).is_some());
    let text = s.node(welcome).unwrap();
    assert!(text.visible);
    assert_eq!(text.as_text().unwrap().content, tc_editor::session::WELCOME_TEXT);
}

#[test]
fn history_waits_for_an_open_text_edit() {
    let mut s = session();
    let welcome = text_id(&s);
    s.add_rectangle(0.0, 0.0, 40.0, 40.0, Color::BLACK).unwrap();
    let json = s.export_json().unwrap();
    s.begin_text_edit(welcome).unwrap();
    let pushed = s.history().len();

    assert!(!s.undo().unwrap());
    assert!(!s.redo().unwrap());
    assert_eq!(
        s.load_template(TemplateId::VideoAd).unwrap_err(),
        EditorError::EditInProgress
    );
    assert_eq!(s.import_json(&json).unwrap_err(), EditorError::EditInProgress);
    assert_eq!(s.editing(), Some(welcome));
    assert_eq!(s.history().len(), pushed);

    s.commit_text_edit("Typed").unwrap();
    assert_eq!(s.node(welcome).unwrap().as_text().unwrap().content, "Typed");
    assert_eq!(s.history().len(), pushed + 1);
    assert!(s.undo().unwrap());
    assert_eq!(
        s.node(welcome).unwrap().as_text().unwrap().content,
        tc_editor::session::WELCOME_TEXT
    );
}
