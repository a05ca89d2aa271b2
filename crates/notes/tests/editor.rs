use std::cell::RefCell;
use std::rc::Rc;

use jotter_doc_core::{CaretGeometry, CaretRect, GeometryError, Key, Point};
use jotter_notes::{
    ContentStore, MemoryStore, NoteEditor, NoteEditorConfig, SessionError, SessionProvider,
    StaticSession, StoreError, User, save_note,
};
use jotter_slash_menu::{Anchor, FloatingPanel, ListProps, Placement, PopupBackend, Renderer};
use pretty_assertions::assert_eq;

struct LineGeometry;

impl CaretGeometry for LineGeometry {
    fn coords_at(&self, point: &Point) -> Result<CaretRect, GeometryError> {
        let left = point.offset as f32 * 8.0;
        Ok(CaretRect {
            top: 0.0,
            bottom: 18.0,
            left,
            right: left,
        })
    }
}

struct Quiet;

impl Renderer for Quiet {
    fn mount(&mut self, _props: &ListProps) {}
    fn update(&mut self, _props: &ListProps) {}
    fn unmount(&mut self) {}
}

impl FloatingPanel for Quiet {
    fn set_reference(&mut self, _anchor: Anchor, _placement: Placement) {}
    fn show(&mut self) {}
    fn hide(&mut self) {}
    fn destroy(&mut self) {}
}

struct QuietBackend;

impl PopupBackend for QuietBackend {
    fn create_renderer(&mut self) -> Box<dyn Renderer> {
        Box::new(Quiet)
    }

    fn create_panel(&mut self) -> Box<dyn FloatingPanel> {
        Box::new(Quiet)
    }
}

fn note_editor(content: &str) -> NoteEditor {
    NoteEditor::new(
        NoteEditorConfig::default(),
        content,
        Box::new(LineGeometry),
        Box::new(QuietBackend),
    )
    .unwrap()
}

#[test]
fn empty_note_shows_placeholder() {
    let mut editor = note_editor("");
    assert_eq!(editor.placeholder(), Some("Start writing..."));
    assert_eq!(editor.html(), "<p></p>");

    editor.type_text("a").unwrap();
    assert_eq!(editor.placeholder(), None);
}

#[test]
fn change_callback_receives_markup() {
    let mut editor = note_editor("");
    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = seen.clone();
    editor.on_change(move |html| sink.borrow_mut().push(html.to_string()));

    editor.type_text("/").unwrap();
    editor.handle_key(Key::ArrowDown).unwrap();
    editor.handle_key(Key::Enter).unwrap();
    editor.type_text("Goals").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.first().map(String::as_str), Some("<p>/</p>"));
    assert_eq!(seen.get(1).map(String::as_str), Some("<h2></h2>"));
    assert_eq!(seen.last().map(String::as_str), Some("<h2>Goals</h2>"));
    assert_eq!(seen.len(), 7);
}

#[test]
fn external_content_waits_for_blur() {
    let mut editor = note_editor("<p>old</p>");

    assert!(!editor.sync_external("<p>old</p>").unwrap());

    editor.view_mut().focus();
    assert!(!editor.sync_external("<p>new</p>").unwrap());
    assert_eq!(editor.html(), "<p>old</p>");

    editor.view_mut().blur();
    assert!(editor.sync_external("<h1>new</h1>").unwrap());
    assert_eq!(editor.html(), "<h1>new</h1>");
}

#[test]
fn external_content_does_not_echo_to_listeners() {
    let mut editor = note_editor("<p>old</p>");
    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    editor.on_change(move |_| *counter.borrow_mut() += 1);

    editor.sync_external("<p>new</p>").unwrap();

    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn save_requires_a_signed_in_user() {
    let mut store = MemoryStore::new();
    let note = store.create("u1", "Plan", "").unwrap();

    let err = save_note(&mut store, &StaticSession::signed_out(), note.id, "<p>x</p>").unwrap_err();
    assert_eq!(err, StoreError::SignedOut);
    assert_eq!(StaticSession::loading().require_user(), Err(SessionError::Loading));
    assert_eq!(store.get(note.id).unwrap().content, "");
}

#[test]
fn edits_flow_into_the_store() {
    let store = Rc::new(RefCell::new(MemoryStore::new()));
    let note = store.borrow_mut().create("u1", "Plan", "").unwrap();
    let session = StaticSession::signed_in(User::new("u1"));

    let mut editor = note_editor(&note.content);
    let sink = store.clone();
    editor.on_change(move |html| {
        save_note(&mut *sink.borrow_mut(), &session, note.id, html).unwrap();
    });

    editor.type_text("/").unwrap();
    editor.click_popup_item(3).unwrap();
    editor.type_text("milk").unwrap();

    assert_eq!(
        store.borrow().get(note.id).unwrap().content,
        "<ul><li><p>milk</p></li></ul>"
    );
}
