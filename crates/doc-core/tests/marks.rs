use jotter_doc_core::{
    Document, Editor, ElementNode, Marks, Node, PluginRegistry, Point, Selection, TextNode,
    to_html,
};
use pretty_assertions::assert_eq;

fn bold(text: &str) -> Node {
    Node::Text(TextNode {
        text: text.to_string(),
        marks: Marks {
            bold: true,
            ..Marks::default()
        },
    })
}

fn paragraph(children: Vec<Node>) -> Node {
    Node::Element(ElementNode {
        kind: "paragraph".to_string(),
        attrs: Default::default(),
        children,
    })
}

fn editor_with(blocks: Vec<Node>, anchor: Point, focus: Point) -> Editor {
    Editor::new(
        Document { children: blocks },
        Selection { anchor, focus },
        PluginRegistry::richtext(),
    )
}

#[test]
fn toggle_bold_splits_leaf_and_keeps_selection_on_the_text() {
    let mut editor = editor_with(
        vec![Node::paragraph("hello world")],
        Point::new(vec![0, 0], 6),
        Point::new(vec![0, 0], 11),
    );

    editor.run_command("marks.toggle_bold", None).unwrap();

    assert_eq!(
        editor.doc().children,
        vec![paragraph(vec![Node::text("hello "), bold("world")])]
    );
    assert_eq!(editor.selection().anchor, Point::new(vec![0, 1], 0));
    assert_eq!(editor.selection().focus, Point::new(vec![0, 1], 5));
    assert!(editor.run_query::<bool>("marks.is_active", Some(serde_json::json!({ "mark": "bold" }))).unwrap());
    assert_eq!(to_html(editor.doc()), "<p>hello <strong>world</strong></p>");

    editor.run_command("marks.toggle_bold", None).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("hello world")]);
    assert_eq!(editor.undo_depth(), 2);
}

#[test]
fn partly_bold_selection_becomes_fully_bold() {
    let mut editor = editor_with(
        vec![paragraph(vec![Node::text("ab"), bold("cd")])],
        Point::new(vec![0, 1], 2),
        Point::new(vec![0, 0], 1),
    );

    editor.chain().toggle_bold().run().unwrap();

    assert_eq!(
        editor.doc().children,
        vec![paragraph(vec![Node::text("a"), bold("bcd")])]
    );
}

#[test]
fn toggle_italic_spans_sibling_blocks() {
    let mut editor = editor_with(
        vec![Node::paragraph("one"), Node::heading(2, "two")],
        Point::new(vec![0, 0], 1),
        Point::new(vec![1, 0], 2),
    );

    editor.run_command("marks.toggle_italic", None).unwrap();

    assert_eq!(
        to_html(editor.doc()),
        "<p>o<em>ne</em></p><h2><em>tw</em>o</h2>"
    );
    let active: Marks = editor.run_query("marks.active", None).unwrap();
    assert!(active.italic);
}

#[test]
fn collapsed_caret_marks_an_empty_block_for_typing() {
    let mut editor = editor_with(
        vec![Node::paragraph("")],
        Point::new(vec![0, 0], 0),
        Point::new(vec![0, 0], 0),
    );

    editor.chain().toggle_bold().insert_text("loud").run().unwrap();

    assert_eq!(editor.doc().children, vec![paragraph(vec![bold("loud")])]);
}

#[test]
fn collapsed_caret_inside_text_changes_nothing() {
    let mut editor = editor_with(
        vec![Node::paragraph("quiet")],
        Point::new(vec![0, 0], 2),
        Point::new(vec![0, 0], 2),
    );

    editor.run_command("marks.toggle_italic", None).unwrap();

    assert_eq!(editor.doc().children, vec![Node::paragraph("quiet")]);
    assert_eq!(editor.undo_depth(), 0);
}
