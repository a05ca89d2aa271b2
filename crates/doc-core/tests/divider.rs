use jotter_doc_core::{Document, Editor, Node, PluginRegistry, Point, Selection};

fn editor_with(blocks: Vec<Node>, focus: Point) -> Editor {
    Editor::new(
        Document { children: blocks },
        Selection::collapsed(focus),
        PluginRegistry::core(),
    )
}

#[test]
fn divider_replaces_empty_paragraph() {
    let mut editor = editor_with(vec![Node::paragraph("")], Point::new(vec![0, 0], 0));

    editor.run_command("core.insert_divider", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::divider(), Node::paragraph("")]
    );
    assert_eq!(
        editor.selection(),
        &Selection::collapsed(Point::new(vec![1, 0], 0))
    );
}

#[test]
fn divider_goes_after_non_empty_block() {
    let mut editor = editor_with(
        vec![Node::paragraph("a"), Node::paragraph("b")],
        Point::new(vec![0, 0], 1),
    );

    editor.run_command("core.insert_divider", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![
            Node::paragraph("a"),
            Node::divider(),
            Node::paragraph(""),
            Node::paragraph("b"),
        ]
    );
    assert_eq!(editor.selection().focus.path, vec![2, 0]);
}

#[test]
fn undo_removes_divider_in_one_step() {
    let mut editor = editor_with(vec![Node::paragraph("")], Point::new(vec![0, 0], 0));
    editor.run_command("core.insert_divider", None).unwrap();

    assert!(editor.undo());

    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
    assert!(!editor.can_undo());
}
