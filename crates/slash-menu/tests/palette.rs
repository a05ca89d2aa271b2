mod common;

use common::{CARET, Event, Harness};
use jotter_doc_core::{
    CaretRect, Chain, Document, Editor, Key, Node, PluginRegistry, Point, PointerEvent,
    Propagation, Selection, ViewError, ViewPlugin,
};
use jotter_slash_menu::{
    Anchor, CommandRegistry, PaletteConfig, Placement, SlashCommand, SlashPalette,
};
use pretty_assertions::assert_eq;

#[test]
fn empty_caret_text_keeps_palette_closed() {
    let mut h = Harness::new(vec![Node::paragraph(""), Node::paragraph("x")], Point::new(vec![1, 0], 1));

    h.view.set_selection(Selection::collapsed(Point::new(vec![0, 0], 0)));

    assert!(!h.is_open());
    assert!(h.recorder.events().is_empty());
}

#[test]
fn slash_opens_palette_at_caret() {
    let mut h = Harness::empty();

    h.type_str("/");

    assert!(h.is_open());
    let anchor = Anchor::at_caret(CARET);
    assert_eq!(anchor.width(), 0.0);
    assert_eq!(anchor.height(), 0.0);
    assert_eq!(
        jotter_slash_menu::origin(&anchor, Placement::BottomStart),
        jotter_slash_menu::PanelOrigin { x: 5.0, y: 20.0 }
    );

    let events = h.recorder.events();
    assert_eq!(events.len(), 3);
    let Event::Mount(props) = &events[0] else {
        panic!("expected mount first, got {events:?}");
    };
    assert_eq!(props.highlighted, Some(0));
    assert_eq!(props.items[0].title, "Heading 1");
    assert_eq!(props.items.len(), 8);
    assert_eq!(events[1], Event::SetReference(anchor, Placement::BottomStart));
    assert_eq!(events[2], Event::Show);
}

#[test]
fn arrows_move_highlight_without_moving_caret() {
    let mut h = Harness::new(vec![Node::paragraph(""), Node::paragraph("below")], Point::new(vec![0, 0], 0));
    h.type_str("/");
    let caret = h.view.editor().selection().clone();

    assert_eq!(h.view.handle_key(Key::ArrowDown).unwrap(), Propagation::Stop);
    h.key(Key::ArrowDown);
    assert_eq!(h.recorder.highlighted(), Some(2));
    assert_eq!(h.recorder.last_props().unwrap().items[2].title, "Heading 3");

    h.key(Key::ArrowUp);
    assert_eq!(h.recorder.highlighted(), Some(1));
    assert_eq!(h.view.editor().selection(), &caret);
}

#[test]
fn enter_applies_highlighted_command() {
    let mut h = Harness::empty();
    h.type_str("/");
    for _ in 0..3 {
        h.key(Key::ArrowDown);
    }
    assert_eq!(h.recorder.last_props().unwrap().items[3].title, "Bullet List");

    assert_eq!(h.view.handle_key(Key::Enter).unwrap(), Propagation::Stop);

    assert_eq!(h.view.editor().doc().children, vec![Node::list_item("bulleted", "")]);
    assert_eq!(h.view.editor().selection().focus, Point::new(vec![0, 0], 0));
    assert!(!h.is_open());
    assert_eq!(h.recorder.events().last(), Some(&Event::Hide));
}

#[test]
fn range_selection_closes_without_editing() {
    let mut h = Harness::new(vec![Node::paragraph("abc"), Node::paragraph("")], Point::new(vec![1, 0], 0));
    h.type_str("/");
    assert!(h.is_open());
    let doc = h.view.editor().doc().clone();
    let doc_revision = h.view.editor().doc_revision();

    h.view.set_selection(Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 0], 3),
    });

    assert!(!h.is_open());
    assert_eq!(h.view.editor().doc(), &doc);
    assert_eq!(h.view.editor().doc_revision(), doc_revision);
}

#[test]
fn clicking_an_item_highlights_and_applies_it() {
    let mut h = Harness::empty();
    h.type_str("/");

    assert_eq!(h.view.click_popup_item(6).unwrap(), Propagation::Stop);

    assert_eq!(h.view.editor().doc().children, vec![Node::code_block("")]);
    assert!(!h.is_open());
    assert_eq!(h.view.editor().undo_depth(), 2);
}

#[test]
fn clicking_blockquote_wraps_the_paragraph() {
    let mut h = Harness::empty();
    h.type_str("/");

    h.view.click_popup_item(5).unwrap();

    assert_eq!(
        h.view.editor().doc().children,
        vec![Node::blockquote(vec![Node::paragraph("")])]
    );
}

#[test]
fn horizontal_rule_leaves_caret_after_divider() {
    let mut h = Harness::empty();
    h.type_str("/");

    h.view.click_popup_item(7).unwrap();

    assert_eq!(
        h.view.editor().doc().children,
        vec![Node::divider(), Node::paragraph("")]
    );
    assert_eq!(h.view.editor().selection().focus, Point::new(vec![1, 0], 0));
}

#[test]
fn one_undo_restores_the_trigger() {
    let mut h = Harness::empty();
    h.type_str("/");
    h.key(Key::Enter);
    assert_eq!(h.view.editor().doc().children, vec![Node::heading(1, "")]);

    assert!(h.view.undo());

    assert_eq!(h.view.editor().doc().children, vec![Node::paragraph("/")]);
    assert!(h.is_open());
    assert_eq!(h.recorder.highlighted(), Some(0));
}

#[test]
fn second_confirm_in_a_cycle_is_a_no_op() {
    let mut editor = Editor::new(
        Document {
            children: vec![Node::paragraph("/")],
        },
        Selection::collapsed(Point::new(vec![0, 0], 1)),
        PluginRegistry::richtext(),
    );
    let recorder = std::rc::Rc::new(common::Recorder::default());
    let caret = std::rc::Rc::new(std::cell::Cell::new(Some(CARET)));
    let geometry = common::FakeGeometry(caret);
    let mut palette = SlashPalette::new(
        PaletteConfig::default(),
        CommandRegistry::default(),
        Box::new(common::FakeBackend(recorder.clone())),
    );

    palette.update(&editor, &geometry);
    let state = palette.state();
    assert!(state.is_open);
    assert_eq!(state.highlighted_index, Some(0));
    assert_eq!(state.anchor, Some(Anchor::at_caret(CARET)));

    assert!(palette.confirm(&mut editor).unwrap());
    let after_first = editor.doc().clone();
    let depth = editor.undo_depth();

    assert!(!palette.confirm(&mut editor).unwrap());
    assert!(!palette.click(&mut editor, 2).unwrap());
    assert_eq!(editor.doc(), &after_first);
    assert_eq!(editor.undo_depth(), depth);
    assert!(!palette.state().is_open);
    assert_eq!(palette.state().anchor, None);
}

#[test]
fn destroy_releases_panel_list_and_listeners() {
    let mut h = Harness::empty();
    h.type_str("/");
    assert_eq!(h.recorder.listeners.get(), 2);
    assert_eq!(h.recorder.mounted_lists.get(), 1);

    h.view.destroy();

    assert_eq!(h.recorder.listeners.get(), 0);
    assert_eq!(h.recorder.mounted_lists.get(), 0);
    assert_eq!(h.recorder.live_panels.get(), 0);
    let events = h.recorder.events();
    assert_eq!(&events[events.len() - 3..], &[Event::Hide, Event::Destroy, Event::Unmount]);
}

#[test]
fn destroy_after_close_does_not_hide_twice() {
    let mut h = Harness::empty();
    h.type_str("/x");
    assert!(!h.is_open());
    assert_eq!(h.recorder.listeners.get(), 0);
    h.recorder.clear();

    h.view.destroy();

    assert_eq!(h.recorder.events(), vec![Event::Destroy, Event::Unmount]);
}

#[test]
fn destroy_without_open_touches_nothing() {
    let mut h = Harness::empty();
    h.type_str("abc");

    drop(h.view);

    assert!(h.recorder.events().is_empty());
    assert_eq!(h.recorder.live_panels.get(), 0);
}

#[test]
fn popup_is_reused_and_highlight_resets_on_reopen() {
    let mut h = Harness::empty();
    h.type_str("/");
    h.key(Key::ArrowDown);
    h.key(Key::ArrowDown);

    h.type_str("x");
    assert!(!h.is_open());
    h.key(Key::Backspace);

    assert!(h.is_open());
    assert_eq!(h.recorder.highlighted(), Some(0));
    assert_eq!(h.recorder.count(|e| matches!(e, Event::Mount(_))), 1);
    assert_eq!(h.recorder.count(|e| matches!(e, Event::Show)), 2);
    assert_eq!(h.recorder.count(|e| matches!(e, Event::Hide)), 1);
    assert_eq!(h.recorder.live_panels.get(), 1);
}

#[test]
fn update_while_open_moves_anchor_and_keeps_highlight() {
    let mut h = Harness::empty();
    h.type_str("/");
    h.key(Key::ArrowDown);
    let moved = CaretRect {
        top: 40.0,
        bottom: 52.0,
        left: 90.0,
        right: 90.0,
    };
    h.caret.set(Some(moved));
    h.recorder.clear();

    let caret = h.view.editor().selection().clone();
    h.view.set_selection(caret);

    assert_eq!(h.recorder.last_reference(), Some(Anchor::at_caret(moved)));
    assert_eq!(h.recorder.highlighted(), Some(1));
    assert_eq!(h.recorder.count(|e| matches!(e, Event::Show)), 0);
}

#[test]
fn missing_coordinates_leave_popup_alone() {
    let mut h = Harness::empty();
    h.caret.set(None);
    h.type_str("/");
    assert!(h.recorder.events().is_empty());
    assert!(!h.is_open());

    h.caret.set(Some(CARET));
    let caret = h.view.editor().selection().clone();
    h.view.set_selection(caret.clone());
    assert!(h.is_open());

    h.caret.set(None);
    h.recorder.clear();
    h.view.set_selection(caret);
    assert!(h.recorder.events().is_empty());
    assert!(h.is_open());
}

#[test]
fn caret_moved_without_coordinates_still_confirms_at_new_slash() {
    let first = Selection::collapsed(Point::new(vec![0, 0], 1));
    let mut h = Harness::new(
        vec![Node::paragraph("/"), Node::paragraph("/")],
        first.focus.clone(),
    );
    h.view.set_selection(first);
    assert!(h.is_open());
    let anchor = h.recorder.last_reference();

    h.caret.set(None);
    h.view
        .set_selection(Selection::collapsed(Point::new(vec![1, 0], 1)));
    assert!(h.is_open());
    assert_eq!(h.recorder.last_reference(), anchor);

    h.caret.set(Some(CARET));
    h.key(Key::Enter);

    assert!(!h.is_open());
    assert_eq!(
        h.view.editor().doc().children,
        vec![Node::paragraph("/"), Node::heading(1, "")]
    );
}

#[test]
fn keys_pass_through_while_closed() {
    let mut h = Harness::new(vec![Node::paragraph("ab")], Point::new(vec![0, 0], 2));

    assert_eq!(h.view.handle_key(Key::Enter).unwrap(), Propagation::Continue);

    assert_eq!(
        h.view.editor().doc().children,
        vec![Node::paragraph("ab"), Node::paragraph("")]
    );
    assert!(h.recorder.events().is_empty());
}

#[test]
fn escape_is_left_to_the_editor() {
    let mut h = Harness::empty();
    h.type_str("/");

    assert_eq!(h.view.handle_key(Key::Escape).unwrap(), Propagation::Continue);
    assert!(h.is_open());
}

#[test]
fn outside_click_hides_popup() {
    let mut h = Harness::empty();
    h.type_str("/");

    let outcome = h.view.handle_pointer(PointerEvent::Outside).unwrap();

    assert_eq!(outcome, Propagation::Continue);
    assert!(!h.is_open());
    assert_eq!(h.recorder.listeners.get(), 0);
    assert_eq!(h.view.editor().doc().children, vec![Node::paragraph("/")]);
}

static NO_COMMANDS: [SlashCommand; 0] = [];

#[test]
fn empty_registry_shows_placeholder() {
    let mut h = Harness::with_commands(
        vec![Node::paragraph("")],
        Point::new(vec![0, 0], 0),
        CommandRegistry::new(&NO_COMMANDS),
    );
    h.type_str("/");

    let props = h.recorder.last_props().unwrap();
    assert!(props.is_empty());
    assert_eq!(props.highlighted, None);
    assert_eq!(props.empty_label, "No results");

    assert_eq!(h.view.handle_key(Key::Enter).unwrap(), Propagation::Stop);
    h.key(Key::ArrowDown);
    assert_eq!(h.view.editor().doc().children, vec![Node::paragraph("/")]);
    assert!(h.is_open());
}

fn broken(chain: Chain<'_>) -> Chain<'_> {
    chain.delete_range(vec![7, 0], 0..1)
}

static BROKEN: [SlashCommand; 1] = [SlashCommand {
    title: "Broken",
    description: "Points at a missing block",
    icon: "!",
    action: broken,
}];

#[test]
fn rejected_edit_is_returned_and_palette_stays_closed() {
    let mut h = Harness::with_commands(
        vec![Node::paragraph("")],
        Point::new(vec![0, 0], 0),
        CommandRegistry::new(&BROKEN),
    );
    h.type_str("/");
    let depth = h.view.editor().undo_depth();

    let err = h.view.handle_key(Key::Enter).unwrap_err();

    assert!(matches!(err, ViewError::Chain(_)));
    assert!(!h.is_open());
    assert_eq!(h.view.editor().doc().children, vec![Node::paragraph("/")]);
    assert_eq!(h.view.editor().undo_depth(), depth);
}
