#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use jotter_doc_core::{
    CaretGeometry, CaretRect, Document, Editor, EditorView, GeometryError, Key, Node,
    PluginRegistry, Point, Selection,
};
use jotter_slash_menu::{
    Anchor, CommandRegistry, FloatingPanel, ListProps, PaletteConfig, Placement, PopupBackend,
    Renderer, SlashCommand, SlashPalette,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mount(ListProps),
    Update(ListProps),
    Unmount,
    SetReference(Anchor, Placement),
    Show,
    Hide,
    Destroy,
}

/// Shared record of everything the palette did to its popup.
#[derive(Default)]
pub struct Recorder {
    pub events: RefCell<Vec<Event>>,
    pub visible: Cell<bool>,
    /// Document-level listeners currently attached by shown panels.
    pub listeners: Cell<usize>,
    pub mounted_lists: Cell<usize>,
    pub live_panels: Cell<usize>,
}

impl Recorder {
    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn last_props(&self) -> Option<ListProps> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Event::Mount(props) | Event::Update(props) => Some(props.clone()),
            _ => None,
        })
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.last_props().and_then(|props| props.highlighted)
    }

    pub fn last_reference(&self) -> Option<Anchor> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            Event::SetReference(anchor, _) => Some(*anchor),
            _ => None,
        })
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| matches(event)).count()
    }
}

struct FakeRenderer(Rc<Recorder>);

impl Renderer for FakeRenderer {
    fn mount(&mut self, props: &ListProps) {
        self.0.mounted_lists.set(self.0.mounted_lists.get() + 1);
        self.0.push(Event::Mount(props.clone()));
    }

    fn update(&mut self, props: &ListProps) {
        self.0.push(Event::Update(props.clone()));
    }

    fn unmount(&mut self) {
        self.0.mounted_lists.set(self.0.mounted_lists.get() - 1);
        self.0.push(Event::Unmount);
    }
}

struct FakePanel(Rc<Recorder>);

impl FloatingPanel for FakePanel {
    fn set_reference(&mut self, anchor: Anchor, placement: Placement) {
        self.0.push(Event::SetReference(anchor, placement));
    }

    fn show(&mut self) {
        assert!(!self.0.visible.get(), "panel shown twice");
        self.0.visible.set(true);
        // outside-click and resize
        self.0.listeners.set(self.0.listeners.get() + 2);
        self.0.push(Event::Show);
    }

    fn hide(&mut self) {
        assert!(self.0.visible.get(), "hidden panel hidden again");
        self.0.visible.set(false);
        self.0.listeners.set(self.0.listeners.get() - 2);
        self.0.push(Event::Hide);
    }

    fn destroy(&mut self) {
        self.0.live_panels.set(self.0.live_panels.get() - 1);
        self.0.push(Event::Destroy);
    }
}

pub struct FakeBackend(pub Rc<Recorder>);

impl PopupBackend for FakeBackend {
    fn create_renderer(&mut self) -> Box<dyn Renderer> {
        Box::new(FakeRenderer(self.0.clone()))
    }

    fn create_panel(&mut self) -> Box<dyn FloatingPanel> {
        self.0.live_panels.set(self.0.live_panels.get() + 1);
        Box::new(FakePanel(self.0.clone()))
    }
}

/// Caret geometry whose answer the test controls. `None` means the position
/// is not laid out.
pub struct FakeGeometry(pub Rc<Cell<Option<CaretRect>>>);

impl CaretGeometry for FakeGeometry {
    fn coords_at(&self, point: &Point) -> Result<CaretRect, GeometryError> {
        self.0
            .get()
            .ok_or_else(|| GeometryError::NotLaidOut(point.path.clone()))
    }
}

pub const CARET: CaretRect = CaretRect {
    top: 10.0,
    bottom: 20.0,
    left: 5.0,
    right: 5.0,
};

pub struct Harness {
    pub view: EditorView,
    pub recorder: Rc<Recorder>,
    pub caret: Rc<Cell<Option<CaretRect>>>,
}

impl Harness {
    pub fn new(blocks: Vec<Node>, focus: Point) -> Self {
        Self::with_commands(blocks, focus, CommandRegistry::default())
    }

    pub fn with_commands(blocks: Vec<Node>, focus: Point, registry: CommandRegistry) -> Self {
        let editor = Editor::new(
            Document { children: blocks },
            Selection::collapsed(focus),
            PluginRegistry::richtext(),
        );
        let recorder: Rc<Recorder> = Rc::default();
        let caret = Rc::new(Cell::new(Some(CARET)));
        let mut view = EditorView::new(editor, Box::new(FakeGeometry(caret.clone())));
        let palette = SlashPalette::new(
            PaletteConfig::default(),
            registry,
            Box::new(FakeBackend(recorder.clone())),
        );
        view.add_plugin(Box::new(palette));
        Self { view, recorder, caret }
    }

    /// An empty paragraph with the caret in it.
    pub fn empty() -> Self {
        Self::new(vec![Node::paragraph("")], Point::new(vec![0, 0], 0))
    }

    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            self.view.handle_key(Key::Char(c)).unwrap();
        }
    }

    pub fn key(&mut self, key: Key) {
        self.view.handle_key(key).unwrap();
    }

    pub fn is_open(&self) -> bool {
        self.recorder.visible.get()
    }
}

pub fn titles(commands: &[SlashCommand]) -> Vec<&'static str> {
    commands.iter().map(|command| command.title).collect()
}
