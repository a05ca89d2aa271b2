use jotter_doc_core::{
    CaretGeometry, Editor, EditorConfig, EditorView, Key, MarkupError, PluginRegistry, Point,
    Propagation, Selection, ViewError, from_html, to_html,
};
use jotter_slash_menu::{CommandRegistry, PaletteConfig, PopupBackend, SlashPalette};
use serde::{Deserialize, Serialize};

use crate::note::{Note, NoteId, NotePatch};
use crate::session::SessionProvider;
use crate::store::{ContentStore, StoreError};

pub const DEFAULT_PLACEHOLDER: &str = "Start writing...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteEditorConfig {
    pub placeholder: String,
    pub editor: EditorConfig,
    pub palette: PaletteConfig,
}

impl Default for NoteEditorConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            editor: EditorConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

/// Rich-text editor for one note, with the slash palette installed.
///
/// Change callbacks receive the document as HTML markup. The editor never
/// writes to a store itself; hosts wire [`save_note`] to [`NoteEditor::on_change`].
pub struct NoteEditor {
    view: EditorView,
    placeholder: String,
}

impl NoteEditor {
    pub fn new(
        config: NoteEditorConfig,
        content: &str,
        geometry: Box<dyn CaretGeometry>,
        backend: Box<dyn PopupBackend>,
    ) -> Result<Self, MarkupError> {
        let doc = from_html(content)?;
        let editor = Editor::with_config(
            doc,
            Selection::collapsed(Point::new(vec![0, 0], 0)),
            PluginRegistry::richtext(),
            config.editor,
        );
        let mut view = EditorView::new(editor, geometry);
        view.add_plugin(Box::new(SlashPalette::new(
            config.palette,
            CommandRegistry::default(),
            backend,
        )));

        let placeholder = if config.placeholder.is_empty() {
            DEFAULT_PLACEHOLDER.to_string()
        } else {
            config.placeholder
        };
        Ok(Self { view, placeholder })
    }

    pub fn on_change(&mut self, mut callback: impl FnMut(&str) + 'static) {
        self.view.on_change(move |editor| callback(&to_html(editor.doc())));
    }

    pub fn view(&self) -> &EditorView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut EditorView {
        &mut self.view
    }

    pub fn editor(&self) -> &Editor {
        self.view.editor()
    }

    pub fn html(&self) -> String {
        to_html(self.view.editor().doc())
    }

    pub fn is_empty(&self) -> bool {
        self.view.editor().is_empty()
    }

    /// Text to show while the document is empty.
    pub fn placeholder(&self) -> Option<&str> {
        self.is_empty().then_some(self.placeholder.as_str())
    }

    /// Loads markup that changed outside the editor.
    ///
    /// Skipped while the editor has focus or when the markup already matches,
    /// so a store echo of the user's own edit never moves their caret.
    /// Returns whether the document was replaced.
    pub fn sync_external(&mut self, markup: &str) -> Result<bool, MarkupError> {
        if self.view.editor().is_focused() || self.html() == markup {
            return Ok(false);
        }
        let doc = from_html(markup)?;
        self.view.replace_document(doc);
        tracing::debug!("note content replaced from store");
        Ok(true)
    }

    pub fn type_text(&mut self, text: &str) -> Result<(), ViewError> {
        for c in text.chars() {
            self.view.handle_key(Key::Char(c))?;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: Key) -> Result<Propagation, ViewError> {
        self.view.handle_key(key)
    }

    pub fn click_popup_item(&mut self, index: usize) -> Result<Propagation, ViewError> {
        self.view.click_popup_item(index)
    }

    pub fn destroy(&mut self) {
        self.view.destroy();
    }
}

/// Writes `markup` as the content of note `id` for the signed-in user.
pub fn save_note(
    store: &mut dyn ContentStore,
    session: &dyn SessionProvider,
    id: NoteId,
    markup: &str,
) -> Result<Note, StoreError> {
    let user = session.require_user()?;
    let note = store.update(id, NotePatch::content(markup))?;
    tracing::debug!(%id, user = %user.uid, "note saved");
    Ok(note)
}
