use std::ops::Range;

use crate::core::{ApplyError, BubbleType, Document, Editor, Selection, apply_op_to};
use crate::ops::{Op, Path, Transaction};
use crate::transforms::{self, BlockCx, ListType, MarkKind, TransformError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("chain step `{step}` failed: {source}")]
    Transform {
        step: &'static str,
        #[source]
        source: TransformError,
    },
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Builder that collects several edits and commits them as one transaction.
///
/// Each step runs against a draft copy of the document, so later steps see the
/// effect of earlier ones. Nothing reaches the editor until [`Chain::run`], and
/// a failed step leaves the editor untouched.
#[must_use = "a chain does nothing until `run` is called"]
pub struct Chain<'a> {
    editor: &'a mut Editor,
    doc: Document,
    selection: Selection,
    ops: Vec<Op>,
    steps: Vec<&'static str>,
    focus: bool,
    error: Option<ChainError>,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(editor: &'a mut Editor) -> Self {
        let doc = editor.doc().clone();
        let selection = editor.selection().clone();
        Self {
            editor,
            doc,
            selection,
            ops: Vec::new(),
            steps: Vec::new(),
            focus: false,
            error: None,
        }
    }

    pub fn focus(mut self) -> Self {
        self.focus = true;
        self
    }

    pub fn draft(&self) -> &Document {
        &self.doc
    }

    pub fn draft_selection(&self) -> &Selection {
        &self.selection
    }

    pub fn delete_range(self, path: Path, range: Range<usize>) -> Self {
        self.step("delete_range", move |_| {
            Ok(Transaction::new(vec![Op::RemoveText { path, range }]))
        })
    }

    pub fn insert_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.step("insert_text", move |cx| {
            let focus = &cx.selection.focus;
            Ok(Transaction::new(vec![Op::InsertText {
                path: focus.path.clone(),
                offset: focus.offset,
                text,
            }]))
        })
    }

    pub fn set_selection(self, selection: Selection) -> Self {
        self.step("set_selection", move |_| {
            Ok(Transaction::new(Vec::new()).selection_after(selection))
        })
    }

    pub fn set_heading(self, level: u64) -> Self {
        self.step("set_heading", move |cx| transforms::set_heading(cx, level))
    }

    pub fn unset_heading(self) -> Self {
        self.step("unset_heading", transforms::unset_heading)
    }

    /// Sets heading `level`, or turns a heading of that level back into a paragraph.
    pub fn toggle_heading(self, level: u64) -> Self {
        self.step("toggle_heading", move |cx| transforms::toggle_heading(cx, level))
    }

    pub fn toggle_bold(self) -> Self {
        self.step("toggle_bold", |cx| transforms::toggle_mark(cx, MarkKind::Bold))
    }

    pub fn toggle_italic(self) -> Self {
        self.step("toggle_italic", |cx| transforms::toggle_mark(cx, MarkKind::Italic))
    }

    pub fn toggle_bullet_list(self) -> Self {
        self.step("toggle_bullet_list", |cx| {
            transforms::toggle_list(cx, ListType::Bulleted)
        })
    }

    pub fn toggle_ordered_list(self) -> Self {
        self.step("toggle_ordered_list", |cx| {
            transforms::toggle_list(cx, ListType::Ordered)
        })
    }

    pub fn toggle_blockquote(self) -> Self {
        self.step("toggle_blockquote", transforms::toggle_blockquote)
    }

    pub fn toggle_code_block(self) -> Self {
        self.step("toggle_code_block", transforms::toggle_code_block)
    }

    pub fn insert_divider(self) -> Self {
        self.step("insert_divider", transforms::insert_divider)
    }

    pub fn set_chat_bubble(self, bubble_type: BubbleType, sender: impl Into<String>) -> Self {
        let sender = sender.into();
        self.step("set_chat_bubble", move |cx| {
            transforms::set_chat_bubble(cx, bubble_type, &sender)
        })
    }

    fn step(
        mut self,
        name: &'static str,
        f: impl FnOnce(&BlockCx<'_>) -> Result<Transaction, TransformError>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.steps.push(name);

        let tx = {
            let cx = BlockCx::new(&self.doc, &self.selection, self.editor.registry());
            f(&cx)
        };
        let tx = match tx {
            Ok(tx) => tx,
            Err(source) => {
                self.error = Some(ChainError::Transform { step: name, source });
                return self;
            }
        };

        for op in tx.ops {
            if let Err(err) = apply_op_to(&mut self.doc, &mut self.selection, op.clone()) {
                self.error = Some(err.into());
                return self;
            }
            self.ops.push(op);
        }
        if let Some(selection) = tx.selection_after {
            self.selection = selection;
        }
        self
    }

    pub fn run(self) -> Result<(), ChainError> {
        let Chain {
            editor,
            selection,
            ops,
            steps,
            focus,
            error,
            ..
        } = self;

        if let Some(err) = error {
            tracing::debug!(steps = ?steps, %err, "chain aborted");
            return Err(err);
        }
        if focus {
            editor.focus();
        }
        if ops.is_empty() && selection == *editor.selection() {
            return Ok(());
        }

        let tx = Transaction::new(ops)
            .selection_after(selection)
            .source(format!("chain:{}", steps.join("+")));
        editor.apply(tx)?;
        Ok(())
    }
}
