use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainError};
use crate::core::{ApplyError, Document, Editor, Point, Selection};
use crate::editing;
use crate::ops::Transaction;
use crate::transforms::BlockCx;

/// Screen-space rectangle of the caret.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CaretRect {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("no layout for position {0:?}")]
    NotLaidOut(Vec<usize>),
    #[error("offset {offset} is past the end of the laid out line")]
    OffsetOutOfRange { offset: usize },
}

/// Host-provided mapping from document positions to screen coordinates.
pub trait CaretGeometry {
    fn coords_at(&self, point: &Point) -> Result<CaretRect, GeometryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key name `{0}`")]
pub struct KeyParseError(String);

impl FromStr for Key {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Escape" | "Esc" => Key::Escape,
            "Space" => Key::Char(' '),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(KeyParseError(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Click on row `index` of a popup owned by a view plugin.
    PopupItem(usize),
    /// Mouse down anywhere outside plugin-owned surfaces.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error("view plugin `{plugin}` failed: {source}")]
    Plugin {
        plugin: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Long-lived companion of an [`EditorView`] that reacts to state changes and
/// may claim input before the default handling runs.
pub trait ViewPlugin {
    fn id(&self) -> &'static str;

    /// Called after every transaction or selection change.
    fn update(&mut self, editor: &Editor, geometry: &dyn CaretGeometry);

    fn handle_key(&mut self, _editor: &mut Editor, _key: Key) -> Result<Propagation, ViewError> {
        Ok(Propagation::Continue)
    }

    fn handle_pointer(
        &mut self,
        _editor: &mut Editor,
        _event: PointerEvent,
    ) -> Result<Propagation, ViewError> {
        Ok(Propagation::Continue)
    }

    /// Called once when the view goes away.
    fn destroy(&mut self);
}

type ChangeListener = Box<dyn FnMut(&Editor)>;

pub struct EditorView {
    editor: Editor,
    geometry: Box<dyn CaretGeometry>,
    plugins: Vec<Box<dyn ViewPlugin>>,
    listeners: Vec<ChangeListener>,
    seen_revision: u64,
    seen_doc_revision: u64,
    destroyed: bool,
}

impl EditorView {
    pub fn new(editor: Editor, geometry: Box<dyn CaretGeometry>) -> Self {
        let seen_revision = editor.revision();
        let seen_doc_revision = editor.doc_revision();
        Self {
            editor,
            geometry,
            plugins: Vec::new(),
            listeners: Vec::new(),
            seen_revision,
            seen_doc_revision,
            destroyed: false,
        }
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn ViewPlugin>) {
        self.plugins.push(plugin);
    }

    /// Registers a callback fired whenever the document changes.
    pub fn on_change(&mut self, listener: impl FnMut(&Editor) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn focus(&mut self) {
        self.editor.focus();
    }

    pub fn blur(&mut self) {
        self.editor.blur();
    }

    pub fn dispatch(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let result = self.editor.apply(tx);
        self.after_change();
        result
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.editor.set_selection(selection);
        self.after_change();
    }

    pub fn run(&mut self, build: impl for<'c> FnOnce(Chain<'c>) -> Chain<'c>) -> Result<(), ChainError> {
        let result = build(self.editor.chain()).run();
        self.after_change();
        result
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.editor.undo();
        self.after_change();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.editor.redo();
        self.after_change();
        redone
    }

    /// Swaps in a document loaded from outside without firing change listeners.
    pub fn replace_document(&mut self, doc: Document) {
        self.editor.reset(doc);
        self.seen_doc_revision = self.editor.doc_revision();
        self.after_change();
    }

    pub fn handle_key(&mut self, key: Key) -> Result<Propagation, ViewError> {
        for plugin in &mut self.plugins {
            let outcome = plugin.handle_key(&mut self.editor, key);
            if !matches!(outcome, Ok(Propagation::Continue)) {
                self.after_change();
                return outcome;
            }
        }

        self.editor.focus();
        let cx = BlockCx::new(self.editor.doc(), self.editor.selection(), self.editor.registry());
        let edit = match key {
            Key::Char(c) => Edit::Tx(editing::insert_text(&cx, c.encode_utf8(&mut [0; 4]))),
            Key::Enter => Edit::Tx(editing::split_block(&cx)),
            Key::Backspace => Edit::Tx(editing::delete_backward(&cx)),
            Key::ArrowLeft => Edit::Select(editing::move_left(&cx)),
            Key::ArrowRight => Edit::Select(editing::move_right(&cx)),
            Key::ArrowUp => Edit::Select(editing::move_vertical(&cx, false)),
            Key::ArrowDown => Edit::Select(editing::move_vertical(&cx, true)),
            Key::Escape => Edit::None,
        };

        match edit {
            Edit::Tx(tx) if !tx.is_noop() => self.dispatch(tx)?,
            Edit::Select(selection) if selection != *self.editor.selection() => {
                self.set_selection(selection)
            }
            _ => {}
        }
        Ok(Propagation::Continue)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<Propagation, ViewError> {
        let mut propagation = Propagation::Continue;
        let mut result = Ok(());
        for plugin in &mut self.plugins {
            match plugin.handle_pointer(&mut self.editor, event) {
                Ok(Propagation::Continue) => {}
                Ok(Propagation::Stop) => {
                    propagation = Propagation::Stop;
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.after_change();
        result.map(|()| propagation)
    }

    pub fn click_popup_item(&mut self, index: usize) -> Result<Propagation, ViewError> {
        self.handle_pointer(PointerEvent::PopupItem(index))
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for plugin in &mut self.plugins {
            plugin.destroy();
        }
        self.plugins.clear();
        self.listeners.clear();
    }

    fn after_change(&mut self) {
        if self.editor.revision() == self.seen_revision {
            return;
        }
        self.seen_revision = self.editor.revision();

        for plugin in &mut self.plugins {
            plugin.update(&self.editor, self.geometry.as_ref());
        }

        if self.editor.doc_revision() != self.seen_doc_revision {
            self.seen_doc_revision = self.editor.doc_revision();
            for listener in &mut self.listeners {
                listener(&self.editor);
            }
        }
    }
}

impl Drop for EditorView {
    fn drop(&mut self) {
        self.destroy();
    }
}

enum Edit {
    Tx(Transaction),
    Select(Selection),
    None,
}
