use std::collections::BTreeMap;
use std::ops::Range;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::Chain;
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{CommandError, PluginRegistry, QueryError};

pub type Attrs = BTreeMap<String, serde_json::Value>;

pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const LIST_ITEM: &str = "list_item";
pub const BLOCKQUOTE: &str = "blockquote";
pub const CODE_BLOCK: &str = "code_block";
pub const DIVIDER: &str = "divider";
pub const CHAT_BUBBLE: &str = "chat_bubble";

/// Side of the conversation a chat bubble belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleType {
    #[default]
    Sent,
    Received,
}

impl BubbleType {
    pub fn as_str(self) -> &'static str {
        match self {
            BubbleType::Sent => "sent",
            BubbleType::Received => "received",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(BubbleType::Sent),
            "received" => Some(BubbleType::Received),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text_block(PARAGRAPH, Attrs::default(), text)
    }

    pub fn heading(level: u64, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("level".to_string(), Value::from(level.clamp(1, 6)));
        Self::text_block(HEADING, attrs, text)
    }

    pub fn list_item(list_type: &str, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("list_type".to_string(), Value::from(list_type));
        Self::text_block(LIST_ITEM, attrs, text)
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        Self::text_block(CODE_BLOCK, Attrs::default(), text)
    }

    pub fn chat_bubble(
        bubble_type: BubbleType,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert("bubble_type".to_string(), Value::from(bubble_type.as_str()));
        attrs.insert("sender".to_string(), Value::from(sender.into()));
        Self::text_block(CHAT_BUBBLE, attrs, text)
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            kind: BLOCKQUOTE.to_string(),
            attrs: Attrs::default(),
            children,
        })
    }

    pub fn divider() -> Self {
        Node::Void(VoidNode {
            kind: DIVIDER.to_string(),
            attrs: Attrs::default(),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    fn text_block(kind: &str, attrs: Attrs, text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: kind.to_string(),
            attrs,
            children: vec![Node::text(text)],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: String,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    /// Concatenated text of the direct text leaves.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attrs.get(key).and_then(|v| v.as_u64())
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: String,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Text of the inline node immediately before the caret.
///
/// `path` and `range` address the bytes of `text` inside the text leaf that
/// holds them, so the text can be removed with [`Op::RemoveText`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBeforeCaret {
    pub path: Path,
    pub range: Range<usize>,
    pub text: String,
}

/// One history entry: the ops that revert a transaction and the selections around it.
#[derive(Debug, Clone)]
struct UndoRecord {
    inverse_ops: Vec<Op>,
    selection_before: Selection,
    selection_after: Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    focused: bool,
    revision: u64,
    doc_revision: u64,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Self {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: config.with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            focused: false,
            revision: 0,
            doc_revision: 0,
        };
        editor.normalize_in_place();
        editor
    }

    pub fn with_richtext_plugins() -> Self {
        Self::empty(PluginRegistry::richtext())
    }

    fn empty(registry: PluginRegistry) -> Self {
        let doc = Document {
            children: vec![Node::paragraph("")],
        };
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        Self::new(doc, selection, registry)
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.normalize_selection_in_place();
        self.revision += 1;
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Bumped on every document or selection change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped only when the document itself changes.
    pub fn doc_revision(&self) -> u64 {
        self.doc_revision
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_empty(&self) -> bool {
        match self.doc.children.as_slice() {
            [Node::Element(el)] => el.kind == PARAGRAPH && el.text().is_empty(),
            [] => true,
            _ => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let redo_ops = self.replay(inverse_ops);

        self.selection = selection_before.clone();
        self.normalize_in_place();
        self.bump_doc_revision();

        self.redo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: redo_ops,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        } = record;

        let undo_ops = self.replay(inverse_ops);

        self.selection = selection_after.clone();
        self.normalize_in_place();
        self.bump_doc_revision();

        self.undo_stack.push(UndoRecord {
            selection_before,
            selection_after,
            inverse_ops: undo_ops,
        });
        true
    }

    fn replay(&mut self, ops: Vec<Op>) -> Vec<Op> {
        let mut inverse: Vec<Op> = Vec::new();
        for op in ops {
            match self.apply_op(op) {
                Ok(inv) => inverse.push(inv),
                Err(err) => {
                    tracing::warn!(%err, "history replay stopped on an op that no longer applies");
                    break;
                }
            }
        }
        inverse.reverse();
        inverse
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let selection_before = self.selection.clone();
        let source = tx.meta.source.clone();

        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in tx.ops {
            let inv = self.apply_op(op)?;
            inverse_ops.push(inv);
        }

        if let Some(sel) = tx.selection_after {
            self.selection = sel;
        }

        let mut inverse_normalize = self.normalize_with_inverse_ops()?;
        inverse_ops.append(&mut inverse_normalize);
        inverse_ops.reverse();

        self.normalize_selection_in_place();
        self.revision += 1;

        if inverse_ops.is_empty() {
            return Ok(());
        }

        tracing::trace!(source = source.as_deref().unwrap_or("-"), ops = inverse_ops.len(), "applied transaction");
        self.doc_revision += 1;

        let selection_after = self.selection.clone();
        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(())
    }

    /// Replaces the whole document without recording history.
    pub fn reset(&mut self, doc: Document) {
        self.doc = doc;
        self.selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.normalize_in_place();
        self.bump_doc_revision();
    }

    pub fn chain(&mut self) -> Chain<'_> {
        Chain::new(self)
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::Unknown(id.to_string()));
        };
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::Unknown(id.to_string()));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn text_before_caret(&self) -> Option<TextBeforeCaret> {
        text_before_point(&self.doc, &self.selection.focus)
    }

    fn bump_doc_revision(&mut self) {
        self.revision += 1;
        self.doc_revision += 1;
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalize_with_inverse_ops() {
            tracing::warn!(%err, "document did not normalize");
        }
        self.normalize_selection_in_place();
    }

    fn normalize_selection_in_place(&mut self) {
        self.selection = self
            .registry
            .normalize_selection(&self.doc, &self.selection);
    }

    fn normalize_with_inverse_ops(&mut self) -> Result<Vec<Op>, ApplyError> {
        let mut inverse_ops: Vec<Op> = Vec::new();
        for _ in 0..self.config.max_normalize_iterations {
            let ops = self.registry.normalize(&self.doc);
            if ops.is_empty() {
                return Ok(inverse_ops);
            }
            for op in ops {
                let inv = self.apply_op(op)?;
                inverse_ops.push(inv);
            }
        }
        Err(ApplyError::NormalizeDidNotConverge)
    }

    fn apply_op(&mut self, op: Op) -> Result<Op, ApplyError> {
        apply_op_to(&mut self.doc, &mut self.selection, op)
    }
}

pub(crate) fn text_before_point(doc: &Document, point: &Point) -> Option<TextBeforeCaret> {
    let (child_ix, block_path) = point.path.split_last()?;
    let Some(Node::Element(block)) = node_ref(doc, block_path) else {
        return None;
    };

    if let Some(Node::Text(t)) = block.children.get(*child_ix) {
        if point.offset > 0 {
            let end = clamp_to_char_boundary(&t.text, point.offset);
            return Some(TextBeforeCaret {
                path: point.path.clone(),
                range: 0..end,
                text: t.text[..end].to_string(),
            });
        }
    }

    let prev_ix = child_ix.checked_sub(1)?;
    let Some(Node::Text(prev)) = block.children.get(prev_ix) else {
        return None;
    };
    let mut path = block_path.to_vec();
    path.push(prev_ix);
    Some(TextBeforeCaret {
        path,
        range: 0..prev.text.len(),
        text: prev.text.clone(),
    })
}

pub(crate) fn apply_op_to(
    doc: &mut Document,
    selection: &mut Selection,
    op: Op,
) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let text_node = node_text_mut(doc, &path)?;
            let offset = clamp_to_char_boundary(&text_node.text, offset);
            text_node.text.insert_str(offset, &text);
            transform_selection_insert_text(selection, &path, offset, text.len());
            Ok(Op::RemoveText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Op::RemoveText { path, range } => {
            let text_node = node_text_mut(doc, &path)?;
            let start = clamp_to_char_boundary(&text_node.text, range.start);
            let end = clamp_to_char_boundary(&text_node.text, range.end);
            if start >= end {
                return Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = text_node.text[start..end].to_string();
            text_node.text.replace_range(start..end, "");
            transform_selection_remove_text(selection, &path, start..end);
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            insert_node(doc, &path, node)?;
            transform_selection_insert_node(selection, &path);
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let removed = remove_node(doc, &path)?;
            transform_selection_remove_node(selection, &path, &removed, doc);
            Ok(Op::InsertNode {
                path,
                node: removed,
            })
        }
        Op::SetNodeAttrs { path, patch } => {
            let old = match node_mut(doc, &path)? {
                Node::Element(el) => patch_apply(&mut el.attrs, &patch),
                Node::Void(v) => patch_apply(&mut v.attrs, &patch),
                Node::Text(_) => return Err(PathError::TextHasNoAttrs.into()),
            };
            Ok(Op::SetNodeAttrs { path, patch: old })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("index {index} out of bounds at depth {depth} (len {len})")]
    OutOfBounds {
        depth: usize,
        index: usize,
        len: usize,
    },
    #[error("node at depth {depth} is not a container")]
    NotContainer { depth: usize },
    #[error("expected a text node")]
    NotText,
    #[error("text nodes have no attrs")]
    TextHasNoAttrs,
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(selection: &mut Selection, path: &[usize], range: Range<usize>) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path || point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((index, parent_path)) = path.split_last() else {
        return;
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() || !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        if point.path[depth] >= *index {
            point.path[depth] += 1;
        }
    }
}

fn transform_selection_remove_node(
    selection: &mut Selection,
    path: &[usize],
    removed: &Node,
    doc_after_remove: &Document,
) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };

    let merge_prefix_len = match (removed, index.checked_sub(1)) {
        (Node::Text(removed_text), Some(left_index)) => {
            let mut left_path = parent_path.to_vec();
            left_path.push(left_index);
            match node_ref(doc_after_remove, &left_path) {
                Some(Node::Text(left_text))
                    if left_text.marks == removed_text.marks
                        && left_text.text.ends_with(&removed_text.text) =>
                {
                    Some(left_text.text.len().saturating_sub(removed_text.text.len()))
                }
                _ => None,
            }
        }
        _ => None,
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() || !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
            continue;
        }
        if ix < index {
            continue;
        }

        // Point was inside the removed subtree.
        match (merge_prefix_len, removed) {
            (Some(prefix), Node::Text(removed_text)) => {
                point.path.truncate(depth + 1);
                point.path[depth] = index - 1;
                point.offset = (prefix + point.offset).min(prefix + removed_text.text.len());
            }
            _ => {
                point.path.truncate(depth + 1);
                point.path[depth] = index.saturating_sub(1);
                point.offset = match (removed, index) {
                    (Node::Text(_), 1..) => match node_ref(doc_after_remove, &point.path) {
                        Some(Node::Text(left)) => left.text.len(),
                        _ => 0,
                    },
                    _ => 0,
                };
            }
        }
    }
}

pub(crate) fn node_ref<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = doc.children.get(*first)?;
    for &ix in rest {
        node = match node {
            Node::Element(el) => el.children.get(ix)?,
            Node::Void(_) | Node::Text(_) => return None,
        };
    }
    Some(node)
}

pub(crate) fn children_ref<'a>(doc: &'a Document, parent_path: &[usize]) -> Option<&'a [Node]> {
    if parent_path.is_empty() {
        return Some(&doc.children);
    }
    match node_ref(doc, parent_path)? {
        Node::Element(el) => Some(&el.children),
        Node::Void(_) | Node::Text(_) => None,
    }
}

fn node_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut Node, PathError> {
    let (&first, rest) = path.split_first().ok_or(PathError::Empty)?;
    let len = doc.children.len();
    let mut node = doc.children.get_mut(first).ok_or(PathError::OutOfBounds {
        depth: 0,
        index: first,
        len,
    })?;

    for (depth, &ix) in rest.iter().enumerate() {
        node = match node {
            Node::Element(el) => {
                let len = el.children.len();
                el.children.get_mut(ix).ok_or(PathError::OutOfBounds {
                    depth: depth + 1,
                    index: ix,
                    len,
                })?
            }
            Node::Void(_) | Node::Text(_) => return Err(PathError::NotContainer { depth }),
        };
    }
    Ok(node)
}

fn node_text_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Result<&'a mut TextNode, PathError> {
    match node_mut(doc, path)? {
        Node::Text(t) => Ok(t),
        _ => Err(PathError::NotText),
    }
}

fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Node>, PathError> {
    if parent_path.is_empty() {
        return Ok(&mut doc.children);
    }
    match node_mut(doc, parent_path)? {
        Node::Element(el) => Ok(&mut el.children),
        Node::Void(_) | Node::Text(_) => Err(PathError::NotContainer {
            depth: parent_path.len() - 1,
        }),
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Node) -> Result<(), PathError> {
    let (&index, parent_path) = path.split_last().ok_or(PathError::Empty)?;
    let children = children_mut(doc, parent_path)?;
    if index > children.len() {
        return Err(PathError::OutOfBounds {
            depth: parent_path.len(),
            index,
            len: children.len(),
        });
    }
    children.insert(index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Node, PathError> {
    let (&index, parent_path) = path.split_last().ok_or(PathError::Empty)?;
    let children = children_mut(doc, parent_path)?;
    if index >= children.len() {
        return Err(PathError::OutOfBounds {
            depth: parent_path.len(),
            index,
            len: children.len(),
        });
    }
    Ok(children.remove(index))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        let mut set = Attrs::default();
        set.insert(key.into(), value);
        Self {
            set,
            remove: Vec::new(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            set: Attrs::default(),
            remove: vec![key.into()],
        }
    }
}

fn patch_apply(attrs: &mut Attrs, patch: &AttrPatch) -> AttrPatch {
    let mut old_set: Attrs = Attrs::new();
    let mut old_remove: Vec<String> = Vec::new();

    for (k, v) in &patch.set {
        if let Some(prev) = attrs.insert(k.clone(), v.clone()) {
            old_set.insert(k.clone(), prev);
        } else {
            old_remove.push(k.clone());
        }
    }

    for key in &patch.remove {
        if let Some(prev) = attrs.remove(key) {
            old_set.insert(key.clone(), prev);
        }
    }

    AttrPatch {
        set: old_set,
        remove: old_remove,
    }
}
