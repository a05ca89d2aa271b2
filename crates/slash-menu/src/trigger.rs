use std::ops::Range;

use jotter_doc_core::{Editor, Path, Point};

/// Location of the trigger text found before a collapsed caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Text leaf holding the trigger character.
    pub path: Path,
    /// Byte range of the trigger inside that leaf.
    pub range: Range<usize>,
    pub caret: Point,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    RangeSelection,
    Closed,
    Open(TriggerMatch),
}

pub fn is_trigger_text(text: &str, trigger: char) -> bool {
    let mut chars = text.chars();
    chars.next() == Some(trigger) && chars.next().is_none()
}

/// Classifies the editor state after a transition.
///
/// Only the text directly before the caret counts, and it must be exactly the
/// trigger character: `"/"` opens, `"a/"` and `"/h"` do not.
pub fn detect(editor: &Editor, trigger: char) -> Detection {
    let selection = editor.selection();
    if !selection.is_collapsed() {
        return Detection::RangeSelection;
    }

    match editor.text_before_caret() {
        Some(before) if is_trigger_text(&before.text, trigger) => Detection::Open(TriggerMatch {
            path: before.path,
            range: before.range,
            caret: selection.focus.clone(),
        }),
        _ => Detection::Closed,
    }
}
