use jotter_doc_core::{
    BubbleType, CHAT_BUBBLE_PLACEHOLDER, CommandError, Document, Editor, Node, PluginRegistry,
    Point, Selection, to_html,
};
use pretty_assertions::assert_eq;

fn editor_with(blocks: Vec<Node>, focus: Point) -> Editor {
    Editor::new(
        Document { children: blocks },
        Selection::collapsed(focus),
        PluginRegistry::richtext(),
    )
}

#[test]
fn insert_replaces_empty_paragraph_and_puts_caret_after_text() {
    let mut editor = editor_with(vec![Node::paragraph("")], Point::new(vec![0, 0], 0));

    editor
        .run_command(
            "chat_bubble.insert",
            Some(serde_json::json!({ "type": "sent", "sender": "You" })),
        )
        .unwrap();

    assert_eq!(
        editor.doc().children,
        vec![Node::chat_bubble(BubbleType::Sent, "You", CHAT_BUBBLE_PLACEHOLDER)]
    );
    assert_eq!(
        editor.selection().focus,
        Point::new(vec![0, 0], CHAT_BUBBLE_PLACEHOLDER.len())
    );
    assert_eq!(
        editor
            .run_query::<Option<String>>("chat_bubble.active_type", None)
            .unwrap(),
        Some("sent".to_string())
    );
}

#[test]
fn insert_after_a_block_with_content() {
    let mut editor = editor_with(vec![Node::paragraph("Chat log")], Point::new(vec![0, 0], 4));

    editor
        .chain()
        .set_chat_bubble(BubbleType::Received, "Friend")
        .run()
        .unwrap();

    assert_eq!(
        to_html(editor.doc()),
        concat!(
            "<p>Chat log</p>",
            "<div class=\"chat-bubble\" data-type=\"received\" data-sender=\"Friend\" ",
            "data-node-type=\"chatBubble\">Chat message content</div>",
        )
    );
    assert_eq!(editor.selection().focus.path, vec![1, 0]);

    assert!(editor.undo());
    assert_eq!(editor.doc().children, vec![Node::paragraph("Chat log")]);
}

#[test]
fn unknown_bubble_type_is_rejected() {
    let mut editor = editor_with(vec![Node::paragraph("")], Point::new(vec![0, 0], 0));

    let err = editor
        .run_command("chat_bubble.insert", Some(serde_json::json!({ "type": "shouted" })))
        .unwrap_err();

    assert!(matches!(err, CommandError::InvalidArgs { command: "chat_bubble.insert", .. }));
    assert_eq!(editor.doc().children, vec![Node::paragraph("")]);
}

#[test]
fn bubble_without_attrs_normalizes_to_sent() {
    let Node::Element(mut bare) = Node::chat_bubble(BubbleType::Received, "x", "hi") else {
        panic!("expected element");
    };
    bare.attrs.clear();

    let editor = editor_with(vec![Node::Element(bare)], Point::new(vec![0, 0], 0));

    assert_eq!(
        editor.doc().children,
        vec![Node::chat_bubble(BubbleType::Sent, "", "hi")]
    );
}
