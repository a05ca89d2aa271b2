use jotter_doc_core::{Document, Editor, Node, PluginRegistry, Point, Selection};

#[test]
fn toggle_code_block_round_trips_paragraph() {
    let doc = Document {
        children: vec![Node::paragraph("let x = 1;")],
    };
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0, 0], 3)),
        PluginRegistry::richtext(),
    );

    editor.run_command("code_block.toggle", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::code_block("let x = 1;")]);
    assert!(
        editor
            .run_query::<bool>("code_block.is_active", None)
            .unwrap()
    );

    editor.run_command("code_block.toggle", None).unwrap();
    assert_eq!(editor.doc().children, vec![Node::paragraph("let x = 1;")]);
    assert_eq!(editor.selection().focus.offset, 3);
}

#[test]
fn code_block_from_list_item_drops_list_attrs() {
    let doc = Document {
        children: vec![Node::list_item("ordered", "item")],
    };
    let mut editor = Editor::new(
        doc,
        Selection::collapsed(Point::new(vec![0, 0], 0)),
        PluginRegistry::richtext(),
    );

    editor.run_command("code_block.toggle", None).unwrap();

    assert_eq!(editor.doc().children, vec![Node::code_block("item")]);
}
