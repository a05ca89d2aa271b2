use jotter_doc_core::{
    Document, Editor, EditorConfig, Node, Op, PluginRegistry, Point, Selection, Transaction,
};

fn editor_with_text(text: &str, config: EditorConfig) -> Editor {
    let doc = Document {
        children: vec![Node::paragraph(text)],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::with_config(doc, selection, PluginRegistry::core(), config)
}

fn insert(offset: usize, text: &str) -> Transaction {
    Transaction::new(vec![Op::InsertText {
        path: vec![0, 0],
        offset,
        text: text.to_string(),
    }])
    .selection_after(Selection::collapsed(Point::new(
        vec![0, 0],
        offset + text.len(),
    )))
    .source("test:insert")
}

#[test]
fn undo_redo_handles_multi_op_insert_order() {
    let mut editor = editor_with_text("", EditorConfig::default());

    let tx = Transaction::new(vec![
        Op::InsertText {
            path: vec![0, 0],
            offset: 0,
            text: "a".to_string(),
        },
        Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "b".to_string(),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(vec![0, 0], 2)))
    .source("test:multi_insert");

    editor.apply(tx).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert_eq!(editor.selection().focus.offset, 0);

    assert!(editor.redo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("ab")]);
    assert_eq!(editor.selection().focus.offset, 2);
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = editor_with_text("", EditorConfig::default());
    editor.apply(insert(0, "a")).unwrap();
    assert!(editor.undo());
    assert!(editor.can_redo());

    editor.apply(insert(0, "b")).unwrap();

    assert!(!editor.can_redo());
    assert!(!editor.redo());
}

#[test]
fn undo_history_is_capped_by_config() {
    let config = EditorConfig {
        max_undo: 2,
        ..EditorConfig::default()
    };
    let mut editor = editor_with_text("", config);

    editor.apply(insert(0, "a")).unwrap();
    editor.apply(insert(1, "b")).unwrap();
    editor.apply(insert(2, "c")).unwrap();

    assert_eq!(editor.undo_depth(), 2);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("a")]);
}

#[test]
fn config_zero_values_fall_back_to_defaults() {
    let config = EditorConfig::default().with_defaults();
    assert_eq!(config.max_undo, 200);
    assert_eq!(config.max_normalize_iterations, 100);
}

#[test]
fn selection_changes_bump_revision_but_not_doc_revision() {
    let mut editor = editor_with_text("abc", EditorConfig::default());
    let revision = editor.revision();
    let doc_revision = editor.doc_revision();

    editor.set_selection(Selection::collapsed(Point::new(vec![0, 0], 2)));

    assert!(editor.revision() > revision);
    assert_eq!(editor.doc_revision(), doc_revision);

    editor.apply(insert(0, "x")).unwrap();
    assert_eq!(editor.doc_revision(), doc_revision + 1);
}

#[test]
fn invalid_path_is_rejected() {
    let mut editor = editor_with_text("abc", EditorConfig::default());
    let tx = Transaction::new(vec![Op::RemoveNode { path: vec![5] }]);

    assert!(editor.apply(tx).is_err());
    assert!(!editor.can_undo());
}
